//! Domain error types.
//!
//! These errors cover parsing of the small closed vocabularies the boards
//! work with. They are distinct from upstream/transport errors.

/// Domain-level parse errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    /// Direction token is not one of the canonical directions
    #[error("unknown direction: {0}")]
    UnknownDirection(String),

    /// Line is not served by the dashboard
    #[error("unknown line: {0}")]
    UnknownLine(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = DomainError::UnknownDirection("to-mars".into());
        assert_eq!(err.to_string(), "unknown direction: to-mars");

        let err = DomainError::UnknownLine("S9".into());
        assert_eq!(err.to_string(), "unknown line: S9");
    }
}
