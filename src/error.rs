//! Error types for mapping and resolution operations.
//!
//! Almost all failures inside a single mapping item are logged and swallowed
//! so that one bad user-authored rule never blocks provisioning of the
//! remaining rules. The types below cover the few conditions that are
//! surfaced to callers, plus the collaborator failures (password decode,
//! password policy) the engine treats as non-fatal for the affected attribute.

/// Main error type for mapping engine operations.
#[derive(Debug, thiserror::Error)]
pub enum MappingError {
    /// Malformed mapping expression, or a schema reference absent from the
    /// registry. Fatal to the single mapping item that carries it.
    #[error("Invalid mapping expression '{expression}': {reason}")]
    InvalidExpression { expression: String, reason: String },

    /// The connector-key mapping item produced no value, leaving the entity
    /// without an external identifier to push under.
    #[error("No connector key value could be resolved for {entity}")]
    ConnObjectKeyMissing { entity: String },

    /// A property value could not be converted to a supported attribute type.
    #[error("Cannot coerce value of '{field}' to {target}: {detail}")]
    Coercion {
        field: String,
        target: String,
        detail: String,
    },

    /// Stored credential could not be recovered.
    #[error("Password decoding failed: {0}")]
    Decode(#[from] DecodeError),

    /// Random password generation violated the resource's password policy.
    #[error("Password generation failed: {0}")]
    Policy(#[from] PolicyViolation),
}

/// Failure to recover a plaintext credential from its stored form.
#[derive(Debug, thiserror::Error)]
#[error("cannot decode credential stored with {algorithm}: {message}")]
pub struct DecodeError {
    pub algorithm: String,
    pub message: String,
}

/// Generated password cannot satisfy the resource's password policy.
#[derive(Debug, thiserror::Error)]
#[error("password policy violation: {message}")]
pub struct PolicyViolation {
    pub message: String,
}

impl MappingError {
    /// Create an invalid-expression error.
    pub fn invalid_expression(expression: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidExpression {
            expression: expression.into(),
            reason: reason.into(),
        }
    }

    /// Create a missing-connector-key error.
    pub fn conn_object_key_missing(entity: impl Into<String>) -> Self {
        Self::ConnObjectKeyMissing {
            entity: entity.into(),
        }
    }

    /// Create a coercion failure.
    pub fn coercion(
        field: impl Into<String>,
        target: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self::Coercion {
            field: field.into(),
            target: target.into(),
            detail: detail.into(),
        }
    }
}

impl DecodeError {
    pub fn new(algorithm: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            algorithm: algorithm.into(),
            message: message.into(),
        }
    }
}

impl PolicyViolation {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Result type alias for mapping operations.
pub type MappingResult<T> = Result<T, MappingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_expression_message() {
        let error = MappingError::invalid_expression("group:.email", "empty group name");
        assert!(error.to_string().contains("group:.email"));
        assert!(error.to_string().contains("empty group name"));
    }

    #[test]
    fn test_decode_error_chain() {
        let decode = DecodeError::new("SHA256", "digest algorithms are one-way");
        let error = MappingError::from(decode);
        assert!(error.to_string().contains("Password decoding failed"));
    }
}
