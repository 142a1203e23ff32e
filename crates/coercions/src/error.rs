use mapping_core::Value;

/// Error type for coercion failures.
///
/// Raised when a raw value cannot be interpreted as the target type of a
/// coercion, either a primitive kind or a value type.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Failed to coerce {value} into {expected}: {message}")]
pub struct CoercionError {
    /// Rendering of the rejected value
    pub value: String,
    /// Name of the target type
    pub expected: String,
    /// What went wrong
    pub message: String,
}

impl CoercionError {
    /// Create a coercion error for `value`.
    pub fn new(value: &Value, expected: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            value: value.to_string(),
            expected: expected.into(),
            message: message.into(),
        }
    }
}
