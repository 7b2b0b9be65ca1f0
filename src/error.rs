use thiserror::Error;

pub type WrnResult<T> = Result<T, WrnError>;

/// Errors raised while configuring, building or persisting a wide residual network
#[derive(Debug, Error)]
pub enum WrnError {
    #[error("invalid hyperparameter `{name}` = {value}: {reason}")]
    InvalidHyperparameter {
        name: &'static str,
        value: String,
        reason: &'static str,
    },

    /// The stage-3 feature map cannot hold the fixed average-pool window
    #[error("input {height}x{width} leaves a feature map smaller than the {min}x{min} pool window")]
    InputTooSmall {
        height: usize,
        width: usize,
        min: usize,
    },

    #[error("checkpoint error: {0}")]
    Checkpoint(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("config error: {0}")]
    Config(#[from] serde_json::Error),
}

impl WrnError {
    pub(crate) fn invalid(name: &'static str, value: impl ToString, reason: &'static str) -> Self {
        WrnError::InvalidHyperparameter {
            name,
            value: value.to_string(),
            reason,
        }
    }
}
