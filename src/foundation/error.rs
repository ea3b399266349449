pub type CountdownResult<T> = Result<T, CountdownError>;

#[derive(thiserror::Error, Debug)]
pub enum CountdownError {
    #[error("Please provide duration, width, and height")]
    MissingParameter,

    #[error(
        "Unsupported file format '{format}'. Supported formats are: {}",
        .supported.join(", ")
    )]
    UnsupportedFormat {
        format: String,
        supported: Vec<&'static str>,
    },

    #[error("validation error: {0}")]
    Validation(String),

    #[error("font error: {0}")]
    Font(String),

    #[error("encode error: {0}")]
    Encode(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CountdownError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn font(msg: impl Into<String>) -> Self {
        Self::Font(msg.into())
    }

    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    /// Whether the error was caused by the caller's parameters rather than the host.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::MissingParameter | Self::UnsupportedFormat { .. } | Self::Validation(_)
        )
    }
}
