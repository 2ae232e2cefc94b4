use thiserror::Error;

/// Result type for pong_ddqn operations
pub type Result<T> = std::result::Result<T, PongError>;

/// Main error type for the agent, protocol and server layers
#[derive(Debug, Error)]
pub enum PongError {
    /// Invalid dimensions for operations
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        expected: String,
        actual: String,
    },

    /// Invalid parameter value
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter {
        name: String,
        reason: String,
    },

    /// IO errors (sockets, weight files, logs)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Malformed inbound message; fatal to the session that produced it
    #[error("Protocol error: {reason} (payload {payload:?})")]
    Protocol {
        reason: String,
        payload: String,
    },

    /// Reward field outside the {0, 1, 2} wire encoding
    #[error("Invalid reward code {code}: expected 0, 1 or 2 (payload {payload:?})")]
    InvalidRewardCode {
        code: f32,
        payload: String,
    },

    /// No complete message arrived before the read deadline
    #[error("Connection timed out waiting for game state")]
    ConnectionTimeout,

    /// Run configuration could not be read or is inconsistent
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<bincode::Error> for PongError {
    fn from(err: bincode::Error) -> Self {
        PongError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for PongError {
    fn from(err: serde_json::Error) -> Self {
        PongError::Serialization(err.to_string())
    }
}

// Helper functions for common error patterns
impl PongError {
    pub fn dimension_mismatch<S: Into<String>>(expected: S, actual: S) -> Self {
        PongError::DimensionMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    pub fn invalid_parameter<S: Into<String>>(name: S, reason: S) -> Self {
        PongError::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn protocol<S: Into<String>>(reason: S, payload: &[u8]) -> Self {
        PongError::Protocol {
            reason: reason.into(),
            payload: String::from_utf8_lossy(payload).into_owned(),
        }
    }

    pub fn invalid_reward_code(code: f32, payload: &[u8]) -> Self {
        PongError::InvalidRewardCode {
            code,
            payload: String::from_utf8_lossy(payload).into_owned(),
        }
    }

    /// Errors that end the current session but leave the server able to accept again
    pub fn is_session_local(&self) -> bool {
        matches!(
            self,
            PongError::Protocol { .. }
                | PongError::InvalidRewardCode { .. }
                | PongError::ConnectionTimeout
                | PongError::Io(_)
        )
    }
}
