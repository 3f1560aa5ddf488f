//! Error types for the keyconsole core crate

use std::{error::Error as StdError, fmt, io};

/// Failures while loading settings, starting logging or checking a request
#[derive(Debug)]
pub enum Error {
    /// Configuration sources could not be read or deserialized
    Load(config::ConfigError),

    /// A loaded setting is unusable
    Setting {
        /// Dotted key, e.g. `api.base_url`
        key: &'static str,
        /// What is wrong with it
        problem: &'static str,
    },

    /// A request field failed its client-side check
    InvalidField {
        /// Request field
        field: &'static str,
        /// Message for the user
        message: String,
    },

    /// No per-user directory exists to keep the session in
    NoConfigDir,

    /// The log directory could not be created
    LogDir(io::Error),

    /// A global subscriber was already installed
    Subscriber(String),
}

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// An unusable setting
    pub const fn setting(key: &'static str, problem: &'static str) -> Self {
        Self::Setting { key, problem }
    }

    /// A request field that failed its check
    pub fn invalid_field(field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidField {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Load(err) => write!(f, "cannot load configuration: {err}"),
            Self::Setting { key, problem } => write!(f, "invalid setting {key}: {problem}"),
            Self::InvalidField { field, message } => write!(f, "{field}: {message}"),
            Self::NoConfigDir => f.write_str("no home directory for the session file"),
            Self::LogDir(err) => write!(f, "cannot create log directory: {err}"),
            Self::Subscriber(msg) => write!(f, "cannot install log subscriber: {msg}"),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Load(err) => Some(err),
            Self::LogDir(err) => Some(err),
            _ => None,
        }
    }
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Self::Load(err)
    }
}
