use std::fmt;

use crate::client::ClientError;

/// Result type for spark-runtime operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur in the runtime layer
#[derive(Debug)]
pub enum Error {
    /// Throttled on stream initiation and still throttled after all retries
    RateLimited { attempts: u32, message: String },

    /// Streaming-client failure (initiation or mid-stream)
    Client(ClientError),

    /// Configuration error
    Config(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::RateLimited { attempts, message } => {
                write!(f, "Rate limit exceeded after {} attempts: {}", attempts, message)
            }
            Error::Client(err) => write!(f, "Agent client error: {}", err),
            Error::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Client(err) => Some(err),
            Error::RateLimited { .. } | Error::Config(_) => None,
        }
    }
}

impl From<ClientError> for Error {
    fn from(err: ClientError) -> Self {
        Error::Client(err)
    }
}
