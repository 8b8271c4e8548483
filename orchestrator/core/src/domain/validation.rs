// Copyright (c) 2026 Nexus Labs
// SPDX-License-Identifier: AGPL-3.0

use thiserror::Error;

/// Typed rejection of a malformed request at a public entry point.
///
/// Validation runs before any state mutation; a request that fails here has
/// touched nothing.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid {field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Reject empty or whitespace-only identifier fields.
pub(crate) fn require_non_empty(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new(field, "must not be empty"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::new("source_agent_id", "must not be empty");
        assert_eq!(err.to_string(), "invalid source_agent_id: must not be empty");
    }

    #[test]
    fn test_require_non_empty() {
        assert!(require_non_empty("id", "a1").is_ok());
        assert!(require_non_empty("id", "   ").is_err());
    }
}
