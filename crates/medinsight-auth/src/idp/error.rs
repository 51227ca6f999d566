//! Error types for identity provider calls.

/// Errors returned by [`IdentityProvider`](super::IdentityProvider) operations.
#[derive(Debug, thiserror::Error)]
pub enum IdpError {
    /// The provider could not be reached or the response could not be read.
    #[error("Identity provider unreachable: {0}")]
    Unreachable(#[source] reqwest::Error),

    /// A token endpoint refused the grant.
    #[error("Grant rejected by identity provider (HTTP {status}): {message}")]
    Rejected {
        /// HTTP status returned by the token endpoint.
        status: u16,
        /// `error_description`, `errorMessage`, or a generic message.
        message: String,
    },

    /// The provider answered with an unexpected status.
    #[error("Identity provider returned HTTP {status}: {body}")]
    Status {
        /// HTTP status returned by the provider.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// The response body was not the expected JSON.
    #[error("Malformed identity provider response: {0}")]
    Malformed(String),

    /// The user to create already exists.
    #[error("User already exists")]
    Conflict,
}

impl IdpError {
    /// Returns the HTTP status reported by the provider, if any.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Rejected { status, .. } | Self::Status { status, .. } => Some(*status),
            Self::Conflict => Some(409),
            Self::Unreachable(_) | Self::Malformed(_) => None,
        }
    }

    /// Returns `true` if the provider could not be reached at all.
    #[must_use]
    pub fn is_unreachable(&self) -> bool {
        matches!(self, Self::Unreachable(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = IdpError::Rejected {
            status: 401,
            message: "Invalid user credentials".to_string(),
        };
        assert!(err.to_string().contains("401"));
        assert!(err.to_string().contains("Invalid user credentials"));

        let err = IdpError::Status {
            status: 500,
            body: "oops".to_string(),
        };
        assert_eq!(err.to_string(), "Identity provider returned HTTP 500: oops");
    }

    #[test]
    fn test_status() {
        assert_eq!(IdpError::Conflict.status(), Some(409));
        assert_eq!(IdpError::Malformed("x".into()).status(), None);
        assert!(!IdpError::Conflict.is_unreachable());
    }
}
