use thiserror::Error;

/// Errors from language-model calls
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type LlmResult<T> = Result<T, LlmError>;
