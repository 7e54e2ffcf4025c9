//! Errors reported by gesture handlers.

use crate::interaction::EventId;
use crate::shapes::{DiagramId, DiagramType};
use thiserror::Error;

/// Failure of a single handler invocation.
///
/// Handlers never mutate on failure; the editor logs the error and keeps
/// the previous state.
#[derive(Debug, Error)]
pub enum EditorError {
    #[error("Diagram not found: {0}")]
    DiagramNotFound(DiagramId),
    #[error("Connect point {point} not found on {owner}")]
    ConnectPointNotFound {
        owner: DiagramId,
        point: DiagramId,
    },
    #[error("Diagram is not connectable: {0}")]
    NotConnectable(DiagramId),
    #[error("Unregistered diagram type: {0}")]
    UnregisteredType(DiagramType),
    #[error("Need at least {required} selected items, got {actual}")]
    NotEnoughSelected {
        required: usize,
        actual: usize,
    },
    #[error("No group selected to ungroup")]
    NothingToUngroup,
    #[error("Event {got} does not belong to the active gesture {active}")]
    GestureMismatch {
        active: EventId,
        got: EventId,
    },
    #[error("Malformed payload: {0}")]
    MalformedPayload(#[from] serde_json::Error),
}

impl EditorError {
    /// Whether the error is a caller mistake rather than a stale reference.
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            EditorError::NotEnoughSelected { .. }
                | EditorError::NothingToUngroup
                | EditorError::GestureMismatch { .. }
        )
    }
}

/// Result type for handler operations.
pub type EditorResult<T> = Result<T, EditorError>;

/// Configuration parsing and validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid value for {field}: {reason}")]
    Invalid {
        field: &'static str,
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_contract_violations() {
        assert!(EditorError::NothingToUngroup.is_contract_violation());
        let short = EditorError::NotEnoughSelected {
            required: 2,
            actual: 1,
        };
        assert!(short.is_contract_violation());
        assert!(!EditorError::DiagramNotFound(Uuid::nil()).is_contract_violation());
        assert!(!EditorError::UnregisteredType(DiagramType::Svg).is_contract_violation());
    }

    #[test]
    fn test_malformed_payload_from_json() {
        let err: EditorError = serde_json::from_str::<Vec<u8>>("not json").unwrap_err().into();
        assert!(matches!(err, EditorError::MalformedPayload(_)));
    }
}
