//! Error types shared by the dispatcher, the poller and the SQS transport.

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Failure of a single queue operation or a single message.
///
/// None of these abort sibling work: a failed chunk is reported in its own
/// [`BatchResult`](crate::BatchResult), a failed message is logged and left on
/// the queue for redelivery.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{operation} failed: {message}")]
    Transport {
        operation: &'static str,
        message: String,
    },

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("handler failed: {0:#}")]
    Handler(anyhow::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl Error {
    pub(crate) fn transport(operation: &'static str, message: impl Into<String>) -> Self {
        Error::Transport {
            operation,
            message: message.into(),
        }
    }
}

/// Body text that the codec could not turn back into bytes.
#[derive(Debug, Error)]
#[error("malformed message body: {0}")]
pub struct DecodeError(#[from] base64::DecodeError);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("required configuration `{0}` was not set")]
    MissingField(&'static str),

    #[error("`{field}` must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },
}
