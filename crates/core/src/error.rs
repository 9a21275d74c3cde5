/// Result alias that carries the custom [`DopplerError`] type.
pub type Result<T> = std::result::Result<T, DopplerError>;

/// Common error type for the core crate.
///
/// The engine itself never fails while stepping: numeric edge cases are
/// clamped in place. Errors only surface at the configuration boundary and
/// when traces or config files touch the filesystem.
#[derive(Debug, thiserror::Error)]
pub enum DopplerError {
    /// Free-form message for failures that do not warrant their own variant.
    #[error("{0}")]
    Message(String),
    /// A configuration value was rejected before it could reach the engine.
    #[error("invalid value {value} for `{field}`")]
    InvalidConfig { field: &'static str, value: f64 },
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// Config or trace (de)serialization failure.
    #[error("{0}")]
    Json(#[from] serde_json::Error),
    /// The spectrum planner refused the provided buffers.
    #[error("fft failure: {0}")]
    Fft(String),
}

impl DopplerError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }

    pub(crate) fn invalid(field: &'static str, value: f64) -> Self {
        Self::InvalidConfig { field, value }
    }
}

impl From<&str> for DopplerError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

impl From<String> for DopplerError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}

impl From<realfft::FftError> for DopplerError {
    fn from(value: realfft::FftError) -> Self {
        Self::Fft(value.to_string())
    }
}
