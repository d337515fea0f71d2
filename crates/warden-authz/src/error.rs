//! Error types for the authorizer.

/// Authorizer errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    /// Invalid construction arguments (e.g. auto mode without endpoint).
    #[error("configuration error: {message}")]
    Config { message: String },

    /// Mode string is not one of the known modes.
    #[error("unrecognized mode: {mode}")]
    UnknownMode { mode: String },

    /// Mode is declared but not available.
    #[error("mode not available: {mode}")]
    UnsupportedMode { mode: String },

    /// A required component was never set up by the caller.
    #[error("not configured: {message}")]
    NotConfigured { message: String },

    /// Decision query in auto mode before any policy data was loaded.
    #[error("enforcer not initialized")]
    EnforcerNotInitialized,

    /// Authorization payload has no `m` field.
    #[error("no model when initializing enforcer")]
    MissingModel,

    /// Authorization payload is not valid JSON of the expected shape.
    #[error("invalid authorization payload: {message}")]
    InvalidPayload { message: String },

    /// Permission data could not be loaded.
    #[error("invalid permission data: {message}")]
    InvalidPermission { message: String },

    /// Network error.
    #[error("network error: {message}")]
    Network { message: String },

    /// Remote endpoint rejected the credentials.
    #[error("unauthorized: {message}")]
    Unauthorized { message: String },

    /// Invalid response from the policy endpoint.
    #[error("invalid response: {message}")]
    InvalidResponse { message: String },

    /// Cache error.
    #[error("cache error: {message}")]
    Cache { message: String },

    /// Policy engine failed to build or evaluate.
    #[error("policy engine error: {message}")]
    Engine { message: String },
}

/// Coarse classification of an [`AuthzError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Construction-time, fatal to the instance.
    Configuration,
    /// Caller misuse; retrying without changing state will fail again.
    Precondition,
    /// Transport, cache or engine failure.
    Collaborator,
}

impl AuthzError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config { .. } | Self::UnknownMode { .. } | Self::UnsupportedMode { .. } => {
                ErrorKind::Configuration
            }

            Self::NotConfigured { .. }
            | Self::EnforcerNotInitialized
            | Self::MissingModel
            | Self::InvalidPayload { .. }
            | Self::InvalidPermission { .. } => ErrorKind::Precondition,

            Self::Network { .. }
            | Self::Unauthorized { .. }
            | Self::InvalidResponse { .. }
            | Self::Cache { .. }
            | Self::Engine { .. } => ErrorKind::Collaborator,
        }
    }

    pub(crate) fn engine(err: impl std::fmt::Display) -> Self {
        Self::Engine {
            message: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for AuthzError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network {
            message: err.to_string(),
        }
    }
}

/// Result type for authorizer operations.
pub type AuthzResult<T> = Result<T, AuthzError>;
