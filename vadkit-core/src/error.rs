use thiserror::Error;

/// All errors produced by vadkit-core.
#[derive(Debug, Error)]
pub enum VadError {
    #[error("invalid configuration for `{field}`: {reason}")]
    Config { field: &'static str, reason: String },

    #[error("filter specification must contain at least one breakpoint")]
    EmptyFilter,

    #[error("spectrum has {actual} bins, expected {expected}")]
    SpectrumLength { expected: usize, actual: usize },

    #[error("audio chunk sample rate {actual} Hz does not match detector rate {expected} Hz")]
    SampleRateMismatch { expected: u32, actual: u32 },
}

impl VadError {
    pub(crate) fn config(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Config {
            field,
            reason: reason.into(),
        }
    }

    /// `true` for errors raised while validating options.
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config { .. } | Self::EmptyFilter)
    }
}

pub type Result<T> = std::result::Result<T, VadError>;
