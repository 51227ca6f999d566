//! Tagged results of multi-step flows.

use std::fmt;

/// A best-effort step that did not complete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Degradation {
    /// The userinfo endpoint failed; the session was built from token claims.
    UserInfoUnavailable,

    /// The provider has no realm role with this name; the user has no role.
    RoleNotFound(String),

    /// The role mapping request failed; the user has no role.
    RoleAssignmentFailed,

    /// The backend profile was not created.
    ProfileProvisioningFailed,
}

impl fmt::Display for Degradation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UserInfoUnavailable => f.write_str("User info unavailable"),
            Self::RoleNotFound(name) => write!(f, "Role {name} not found, no role assigned"),
            Self::RoleAssignmentFailed => f.write_str("Role assignment failed"),
            Self::ProfileProvisioningFailed => f.write_str("Profile creation failed"),
        }
    }
}

/// Result of a flow whose primary action succeeded.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    /// Every step succeeded.
    Success(T),

    /// The primary action succeeded but some best-effort steps did not.
    PartialSuccess {
        /// The flow's result.
        value: T,
        /// Steps that did not complete, in the order they were attempted.
        degradations: Vec<Degradation>,
    },
}

impl<T> Outcome<T> {
    /// `Success` if `degradations` is empty, `PartialSuccess` otherwise.
    #[must_use]
    pub fn from_parts(value: T, degradations: Vec<Degradation>) -> Self {
        if degradations.is_empty() {
            Self::Success(value)
        } else {
            Self::PartialSuccess {
                value,
                degradations,
            }
        }
    }

    /// Returns the flow's result.
    #[must_use]
    pub fn value(&self) -> &T {
        match self {
            Self::Success(value) | Self::PartialSuccess { value, .. } => value,
        }
    }

    /// Returns the degradations, empty on full success.
    #[must_use]
    pub fn degradations(&self) -> &[Degradation] {
        match self {
            Self::Success(_) => &[],
            Self::PartialSuccess { degradations, .. } => degradations,
        }
    }

    /// Returns `true` for `PartialSuccess`.
    #[must_use]
    pub fn is_partial(&self) -> bool {
        matches!(self, Self::PartialSuccess { .. })
    }

    /// Splits the outcome into its value and degradations.
    #[must_use]
    pub fn into_parts(self) -> (T, Vec<Degradation>) {
        match self {
            Self::Success(value) => (value, Vec::new()),
            Self::PartialSuccess {
                value,
                degradations,
            } => (value, degradations),
        }
    }

    /// Discards the degradations.
    #[must_use]
    pub fn into_value(self) -> T {
        self.into_parts().0
    }
}
