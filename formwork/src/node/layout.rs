//! Layout and presentation hints carried by container nodes.
//!
//! These are passed through to the rendering layer untouched; the form
//! engine never interprets them.

/// Content alignment on the cross axis
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Align {
    Start,
    Center,
    End,
    #[default]
    Stretch,
}

/// Visual treatment of a card
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CardStyle {
    #[default]
    Plain,
    /// Thin border, no shadow
    Outlined,
    /// Raised with a shadow
    Elevated,
}

/// Default gap between children of rows and columns
pub const DEFAULT_SPACING: u16 = 1;
