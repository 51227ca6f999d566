//! Gateway error types.
//!
//! Every fatal condition of a login, registration or admin flow ends up as an
//! [`AuthError`]. Best-effort steps never produce one; they are reported as
//! [`Degradation`](crate::orchestrator::Degradation)s instead.

use crate::idp::IdpError;

/// Errors that abort a gateway operation.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The provider rejected the username/password pair.
    #[error("{message}")]
    InvalidCredentials {
        /// HTTP status returned by the provider.
        status: u16,
        /// Provider supplied description, or a generic one.
        message: String,
    },

    /// A user with the same username or email already exists.
    #[error("{message}")]
    UserAlreadyExists {
        /// Description shown to the caller.
        message: String,
    },

    /// The provider could not be reached or refused the service account.
    #[error("{message}")]
    ProviderUnavailable {
        /// Description shown to the caller.
        message: String,
    },

    /// The provider returned an unexpected status.
    #[error("{message}")]
    ProviderError {
        /// HTTP status returned by the provider.
        status: u16,
        /// Description shown to the caller.
        message: String,
    },

    /// The provider returned a body that is not valid JSON.
    #[error("{message}")]
    MalformedProviderResponse {
        /// Description shown to the caller.
        message: String,
    },

    /// A role or user lookup missed.
    #[error("{message}")]
    NotFound {
        /// Description shown to the caller.
        message: String,
    },

    /// The request is missing fields or is not valid JSON.
    #[error("{message}")]
    InvalidRequest {
        /// Description shown to the caller.
        message: String,
    },

    /// An unexpected internal failure, including provider data inconsistencies.
    #[error("{message}")]
    Internal {
        /// Description shown to the caller.
        message: String,
    },
}

impl AuthError {
    /// Creates a new `InvalidCredentials` error.
    #[must_use]
    pub fn invalid_credentials(status: u16, message: impl Into<String>) -> Self {
        Self::InvalidCredentials {
            status,
            message: message.into(),
        }
    }

    /// Creates a new `UserAlreadyExists` error.
    #[must_use]
    pub fn user_already_exists(message: impl Into<String>) -> Self {
        Self::UserAlreadyExists {
            message: message.into(),
        }
    }

    /// Creates a new `ProviderUnavailable` error.
    #[must_use]
    pub fn provider_unavailable(message: impl Into<String>) -> Self {
        Self::ProviderUnavailable {
            message: message.into(),
        }
    }

    /// Creates a new `ProviderError` error.
    #[must_use]
    pub fn provider_error(status: u16, message: impl Into<String>) -> Self {
        Self::ProviderError {
            status,
            message: message.into(),
        }
    }

    /// Creates a new `MalformedProviderResponse` error.
    #[must_use]
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedProviderResponse {
            message: message.into(),
        }
    }

    /// Creates a new `NotFound` error.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidRequest` error.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Creates a new `Internal` error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Wraps a provider failure with a caller-facing message.
    ///
    /// Unreachable providers become `ProviderUnavailable`, non-JSON bodies
    /// `MalformedProviderResponse`, and status failures keep the provider's
    /// status code.
    #[must_use]
    pub fn from_idp(error: IdpError, message: impl Into<String>) -> Self {
        let message = message.into();
        match error {
            IdpError::Unreachable(_) => Self::provider_unavailable(message),
            IdpError::Malformed(_) => Self::malformed(message),
            IdpError::Conflict => Self::user_already_exists(message),
            IdpError::Rejected { status, .. } | IdpError::Status { status, .. } => {
                Self::provider_error(status, message)
            }
        }
    }

    /// Returns the HTTP status code reported to the caller.
    ///
    /// Provider statuses are passed through when they are error statuses;
    /// anything else falls back to 500.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidCredentials { status, .. } => {
                if (400..500).contains(status) {
                    *status
                } else {
                    401
                }
            }
            Self::UserAlreadyExists { .. } => 409,
            Self::ProviderError { status, .. } => {
                if (400..600).contains(status) {
                    *status
                } else {
                    500
                }
            }
            Self::NotFound { .. } => 404,
            Self::InvalidRequest { .. } => 400,
            Self::ProviderUnavailable { .. }
            | Self::MalformedProviderResponse { .. }
            | Self::Internal { .. } => 500,
        }
    }

    /// Returns `true` if the caller is at fault (4xx category).
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status_code())
    }
}

impl From<IdpError> for AuthError {
    fn from(error: IdpError) -> Self {
        match error {
            IdpError::Rejected { status, message } => Self::invalid_credentials(status, message),
            IdpError::Conflict => Self::user_already_exists("Username or email already exists"),
            IdpError::Unreachable(e) => {
                Self::provider_unavailable(format!("Identity provider unreachable: {e}"))
            }
            IdpError::Malformed(_) => Self::malformed("Invalid response from Identity Provider"),
            IdpError::Status { status, .. } => {
                Self::provider_error(status, format!("Identity provider returned HTTP {status}"))
            }
        }
    }
}
