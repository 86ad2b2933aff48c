//! Field validator with an optional memoization cache.

use std::collections::HashMap;
use std::sync::RwLock;

use log::{debug, trace};
use uuid::Uuid;

use super::result::{ValidationError, ValidationResult};
use super::rule::{Required, ValidationRule};
use crate::config::ValidatorConfig;
use crate::field::FieldDescriptor;
use crate::value::{FieldValue, ValueKey};

/// Cache key: the descriptor revision plus a lossless key of the value.
type CacheKey = (Uuid, ValueKey);

/// Runs a field's complete rule chain against a value.
///
/// Evaluation order is: the required check (if the field is required), the
/// field kind's constraints, then the field's own rules in insertion order.
/// Rules are never short-circuited; every error is collected and tagged with
/// the field id.
///
/// Results may be memoized. A descriptor's revision changes with every
/// configuration call, so a cached result always equals what a fresh run
/// would produce for the same descriptor and value.
///
/// # Example
///
/// ```ignore
/// let validator = Validator::new();
/// let name = FieldDescriptor::text("name").required();
///
/// let result = validator.validate(&name, &FieldValue::Empty);
/// assert!(result.has_code("required"));
/// ```
#[derive(Debug)]
pub struct Validator {
    config: ValidatorConfig,
    cache: RwLock<HashMap<CacheKey, ValidationResult>>,
}

impl Validator {
    /// Create a validator with the default cache configuration.
    pub fn new() -> Self {
        Self::with_config(ValidatorConfig::default())
    }

    /// Create a validator with an explicit cache configuration.
    pub fn with_config(config: ValidatorConfig) -> Self {
        Self {
            config,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Create a validator that never caches.
    pub fn uncached() -> Self {
        Self::with_config(ValidatorConfig::default().cache_enabled(false))
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    /// Validate `value` against `field`, consulting the cache when enabled.
    pub fn validate(&self, field: &FieldDescriptor, value: &FieldValue) -> ValidationResult {
        if !self.caching() {
            return Self::evaluate(field, value);
        }

        let key = (field.revision(), value.cache_key());
        let hit = self
            .cache
            .read()
            .ok()
            .and_then(|cache| cache.get(&key).cloned());
        if let Some(result) = hit {
            trace!("validator cache hit for '{}'", field.id());
            return result;
        }

        trace!("validator cache miss for '{}'", field.id());
        let result = Self::evaluate(field, value);
        if let Ok(mut cache) = self.cache.write() {
            if cache.len() >= self.config.cache_capacity {
                debug!(
                    "validator cache reached {} entries, clearing",
                    self.config.cache_capacity
                );
                cache.clear();
            }
            cache.insert(key, result.clone());
        }
        result
    }

    /// Run every check for `field` without touching the cache.
    pub fn evaluate(field: &FieldDescriptor, value: &FieldValue) -> ValidationResult {
        let mut result = ValidationResult::valid();

        if field.is_required() {
            result.merge(Required::new().validate(value));
        }
        result.merge(field.kind().check(value));
        for rule in field.rules() {
            result.merge(rule.validate(value));
        }

        let errors: Vec<ValidationError> = result
            .into_errors()
            .into_iter()
            .map(|e| e.for_field(field.id()))
            .collect();
        ValidationResult::from_errors(errors)
    }

    /// Drop every memoized result.
    pub fn clear_cache(&self) {
        if let Ok(mut cache) = self.cache.write() {
            cache.clear();
        }
    }

    /// Number of memoized results.
    pub fn cache_len(&self) -> usize {
        self.cache.read().map(|cache| cache.len()).unwrap_or(0)
    }

    fn caching(&self) -> bool {
        self.config.cache_enabled && self.config.cache_capacity > 0
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}
