//! Error types for backend calls

use thiserror::Error;

/// Result type alias for client operations
pub type ClientResult<T> = Result<T, ClientError>;

/// Status reported for failures that never produced an HTTP response
pub const NETWORK_ERROR_STATUS: u16 = 500;

/// Message used when a request could not complete
pub const NETWORK_ERROR_MESSAGE: &str = "Network error";

/// Errors surfaced by backend calls
#[derive(Error, Debug)]
pub enum ClientError {
    /// A protected call was attempted without a stored token
    #[error("No authentication token found")]
    MissingToken,

    /// Server answered with a non-success status
    #[error("{message}")]
    Http {
        /// HTTP status code
        status: u16,
        /// Server `detail`, or the operation's fallback message
        message: String,
    },

    /// Request could not complete or the body could not be decoded
    #[error("{message}")]
    Network {
        /// Error message
        message: String,
    },

    /// Request rejected before it was sent
    #[error("Invalid request: {message}")]
    InvalidRequest {
        /// Error message
        message: String,
    },

    /// Server accepted the call but reported an unexpected result
    #[error("{message}")]
    Unexpected {
        /// Error message
        message: String,
    },

    /// Token storage failed
    #[error("Session storage error: {message}")]
    Session {
        /// Error message
        message: String,
    },
}

impl ClientError {
    /// Create an HTTP error
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::Http {
            status,
            message: message.into(),
        }
    }

    /// Create a network error
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Create an invalid request error
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Create an unexpected-result error
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected {
            message: message.into(),
        }
    }

    /// Create a session storage error
    pub fn session(message: impl Into<String>) -> Self {
        Self::Session {
            message: message.into(),
        }
    }

    /// HTTP status associated with the failure, if any
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::Network { .. } => Some(NETWORK_ERROR_STATUS),
            Self::MissingToken
            | Self::InvalidRequest { .. }
            | Self::Unexpected { .. }
            | Self::Session { .. } => None,
        }
    }

    /// Whether the server rejected the credentials
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::MissingToken | Self::Http { status: 401, .. })
    }
}

impl From<keyconsole_core::Error> for ClientError {
    fn from(err: keyconsole_core::Error) -> Self {
        match err {
            keyconsole_core::Error::InvalidField { message, .. } => Self::invalid_request(message),
            other => Self::session(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_http_error_displays_message_verbatim() {
        let error = ClientError::http(401, "Could not validate credentials");
        assert_eq!(error.to_string(), "Could not validate credentials");
        assert_eq!(error.status(), Some(401));
        assert!(error.is_unauthorized());
    }

    #[test]
    fn test_network_error_has_fixed_status() {
        let error = ClientError::network(NETWORK_ERROR_MESSAGE);
        assert_eq!(error.status(), Some(NETWORK_ERROR_STATUS));
        assert_eq!(error.to_string(), "Network error");
    }

    #[test]
    fn test_precondition_errors_carry_no_status() {
        assert_eq!(ClientError::MissingToken.status(), None);
        assert_eq!(
            ClientError::MissingToken.to_string(),
            "No authentication token found"
        );
        assert_eq!(ClientError::invalid_request("count").status(), None);
    }

    #[test]
    fn test_core_validation_maps_to_invalid_request() {
        let core = keyconsole_core::Error::invalid_field("count", "must be between 1 and 100");
        let error = ClientError::from(core);
        assert!(matches!(error, ClientError::InvalidRequest { .. }));
        assert_eq!(error.to_string(), "Invalid request: must be between 1 and 100");
    }
}
