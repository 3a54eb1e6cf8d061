use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BusError {
    /// Topic already exists with a different message type
    #[error("Topic '{topic}' carries {expected}, not {actual}")]
    TypeMismatch {
        topic: String,
        expected: &'static str,
        actual: &'static str,
    },
}

pub type BusResult<T> = std::result::Result<T, BusError>;
