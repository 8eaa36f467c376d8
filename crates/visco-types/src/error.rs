use thiserror::Error;

#[derive(Error, Debug)]
pub enum ViscoError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Field '{field}' shape mismatch: expected {expected:?}, got {got:?}")]
    FieldShapeMismatch {
        field: String,
        expected: (usize, usize),
        got: (usize, usize),
    },

    #[error("Field '{field}' holds a non-finite value at cell {index}")]
    NonFiniteField { field: String, index: usize },

    #[error("Physics constraint violated: {0}")]
    PhysicsViolation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Checkpoint error: {0}")]
    Checkpoint(String),
}

pub type ViscoResult<T> = Result<T, ViscoError>;
