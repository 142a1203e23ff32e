use serde::{Deserialize, Serialize};

/// What `from_record` does when a record lacks a mapped field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingKeyPolicy {
    /// Fail with a missing-field error
    #[default]
    Fail,
    /// Treat the field as null and coerce that
    Null,
}

/// Coercer configuration.
///
/// # Example
///
/// ```
/// use coercer::{CoercerConfig, MissingKeyPolicy};
///
/// let config = CoercerConfig::new().with_missing_keys(MissingKeyPolicy::Null);
/// assert_eq!(config.missing_keys, MissingKeyPolicy::Null);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoercerConfig {
    /// Handling of record fields absent from a record.
    #[serde(default)]
    pub missing_keys: MissingKeyPolicy,
}

impl CoercerConfig {
    /// Create the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the missing key policy.
    pub fn with_missing_keys(mut self, policy: MissingKeyPolicy) -> Self {
        self.missing_keys = policy;
        self
    }
}
