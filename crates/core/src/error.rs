use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TriageError {
    /// `message` missing, not a string, or empty.
    #[error("Invalid message format")]
    InvalidMessage,
}
