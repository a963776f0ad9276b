use thiserror::Error;

/// Main error type for hserv operations
#[derive(Debug, Error)]
pub enum HservError {
    #[error("Remote I/O error: {0}")]
    RemoteIo(#[source] std::io::Error),

    #[error("Attribute '{name}' is not a valid environment configuration value")]
    UnknownOption { name: String },

    #[error("Gateway consumer not found: {username}")]
    ConsumerNotFound { username: String },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Token signing failed: {0}")]
    TokenError(String),

    #[error("Remote file '{path}' is not valid UTF-8")]
    EncodingError { path: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSerializeError(#[from] toml::ser::Error),
}

impl HservError {
    pub fn remote_io(error: std::io::Error) -> Self {
        Self::RemoteIo(error)
    }

    pub fn unknown_option<S: Into<String>>(name: S) -> Self {
        Self::UnknownOption { name: name.into() }
    }

    pub fn consumer_not_found<S: Into<String>>(username: S) -> Self {
        Self::ConsumerNotFound {
            username: username.into(),
        }
    }

    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn token<S: Into<String>>(msg: S) -> Self {
        Self::TokenError(msg.into())
    }

    pub fn encoding<S: Into<String>>(path: S) -> Self {
        Self::EncodingError { path: path.into() }
    }

    /// True when the error came from the remote collaborator
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::RemoteIo(_))
    }
}

/// Result type alias for hserv operations
pub type Result<T> = std::result::Result<T, HservError>;
