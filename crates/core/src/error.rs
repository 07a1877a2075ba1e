#[derive(Debug, thiserror::Error)]
pub enum MeldError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

pub type MeldResult<T> = std::result::Result<T, MeldError>;
