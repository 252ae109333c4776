use thiserror::Error;

#[derive(Debug, Error)]
pub enum FlowError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FlowError {
    /// Short stable code, handy as a structured log field.
    pub fn code(&self) -> &'static str {
        match self {
            FlowError::Config(_) => "CONFIG_ERROR",
            FlowError::Io(_) => "IO_ERROR",
        }
    }
}

pub type Result<T> = std::result::Result<T, FlowError>;
