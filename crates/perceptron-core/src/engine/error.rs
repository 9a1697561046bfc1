use crate::core::situation::ExpressionError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PerceptionError {
    #[error("Failed to read {channel}: {source}")]
    ChannelRead {
        channel: String,
        source: std::io::Error,
    },

    #[error("Invalid text pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        source: regex::Error,
    },

    #[error("Cannot evaluate situation '{situation}': {source}")]
    Evaluation {
        situation: String,
        source: ExpressionError,
    },

    #[error("Cannot evaluate circumstance '{circumstance}' of situation '{situation}': {reason}")]
    UnevaluableCircumstance {
        situation: String,
        circumstance: String,
        reason: String,
    },
}
