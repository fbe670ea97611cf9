use thiserror::Error;

use crate::pipeline::Stage;

/// Errors surfaced by the depixelization pipeline.
///
/// Both variants are fatal for the image being processed: no stage is retried and no
/// partial result is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DepixelError {
    /// The input was rejected before any stage ran (bad dimensions, channel count,
    /// buffer length or configuration values).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A stage was invoked out of order or on state it cannot consume.
    #[error("stage `{requested}` cannot run when the pipeline is at `{current}`")]
    Consistency { requested: Stage, current: Stage },
}

pub type Result<T> = std::result::Result<T, DepixelError>;

impl DepixelError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        DepixelError::InvalidInput(msg.into())
    }
}
