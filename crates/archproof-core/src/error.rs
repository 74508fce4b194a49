use thiserror::Error;

#[derive(Error, Debug)]
pub enum ArchProofError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Specification load error: {0}")]
    SpecLoad(String),

    #[error("Implementation load error: {0}")]
    InputLoad(String),

    #[error("Solver error: {0}")]
    Solver(String),
}

pub type Result<T> = std::result::Result<T, ArchProofError>;
