//! Form and validator configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default debounce window between the last edit and the commit.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// Default validator cache size.
pub const DEFAULT_CACHE_CAPACITY: usize = 256;

/// Host-facing form behavior.
///
/// Can be built with chained setters or deserialized from camelCase keys;
/// missing keys fall back to the defaults.
///
/// ```ignore
/// let behavior = FormBehavior::default()
///     .validate_on_change(false)
///     .disable_submit_when_invalid(true);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FormBehavior {
    /// Force-validate every reachable field when submitting.
    pub validate_on_submit: bool,

    /// Validate a field each time its value is committed.
    pub validate_on_change: bool,

    /// Report `can_submit() == false` while the form is invalid, so the
    /// rendering layer can disable its submit control.
    pub disable_submit_when_invalid: bool,

    /// Do not invoke the submit handler while the form is invalid.
    pub prevent_submit_when_invalid: bool,

    /// Report the first invalid field as a scroll target on blocked submits.
    pub auto_scroll: bool,

    /// Validate every reachable field once when the form mounts.
    pub validate_on_mount: bool,

    /// Quiet period before a debounced edit is committed.
    #[serde(rename = "debounceMs", with = "duration_ms")]
    pub debounce: Duration,
}

impl Default for FormBehavior {
    fn default() -> Self {
        Self {
            validate_on_submit: true,
            validate_on_change: true,
            disable_submit_when_invalid: false,
            prevent_submit_when_invalid: true,
            auto_scroll: true,
            validate_on_mount: false,
            debounce: DEFAULT_DEBOUNCE,
        }
    }
}

impl FormBehavior {
    pub fn validate_on_submit(mut self, enabled: bool) -> Self {
        self.validate_on_submit = enabled;
        self
    }

    pub fn validate_on_change(mut self, enabled: bool) -> Self {
        self.validate_on_change = enabled;
        self
    }

    pub fn disable_submit_when_invalid(mut self, enabled: bool) -> Self {
        self.disable_submit_when_invalid = enabled;
        self
    }

    pub fn prevent_submit_when_invalid(mut self, enabled: bool) -> Self {
        self.prevent_submit_when_invalid = enabled;
        self
    }

    pub fn auto_scroll(mut self, enabled: bool) -> Self {
        self.auto_scroll = enabled;
        self
    }

    pub fn validate_on_mount(mut self, enabled: bool) -> Self {
        self.validate_on_mount = enabled;
        self
    }

    pub fn debounce(mut self, window: Duration) -> Self {
        self.debounce = window;
        self
    }
}

/// Validator memoization settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ValidatorConfig {
    /// Memoize results by descriptor revision and value.
    pub cache_enabled: bool,
    /// Entry count at which the cache is cleared wholesale.
    pub cache_capacity: usize,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            cache_enabled: true,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

impl ValidatorConfig {
    pub fn cache_enabled(mut self, enabled: bool) -> Self {
        self.cache_enabled = enabled;
        self
    }

    pub fn cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }
}

mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
