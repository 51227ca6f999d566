//! Login, registration and admin user flows.
//!
//! Each flow is a short sequence of provider calls. Within one flow the calls
//! run one after another since every step consumes the previous step's
//! result; the only fan-out is the per-user role lookup of
//! [`AuthOrchestrator::list_users`].
//!
//! Registration is deliberately asymmetric: only obtaining the admin token,
//! creating the identity and reading it back can fail the request. Role
//! assignment and profile provisioning are best effort and show up as
//! [`Degradation`]s of a [`Outcome::PartialSuccess`]. Nothing is rolled back.

mod admin;
mod login;
mod outcome;
mod register;

#[cfg(test)]
pub(crate) mod fake;

use std::fmt;
use std::sync::Arc;

use crate::config::{FrontendClientConfig, IdentityConfig};
use crate::error::AuthError;
use crate::idp::{ClientBuildError, IdentityProvider, KeycloakClient};
use crate::provisioning::{HttpProfileProvisioner, ProfileProvisioner};
use crate::role::{RoleNaming, RoleResolver};
use crate::AuthResult;

pub use admin::{AdminUserView, FrontendClientSetup, UserStatus};
pub use login::{SessionPayload, SessionUser};
pub use outcome::{Degradation, Outcome};
pub use register::{RegisteredUser, Registration};

/// Drives the identity provider and the profile services for every flow.
pub struct AuthOrchestrator {
    provider: Arc<dyn IdentityProvider>,
    provisioner: Arc<dyn ProfileProvisioner>,
    resolver: RoleResolver,
    frontend_client: FrontendClientConfig,
}

impl AuthOrchestrator {
    /// Creates an orchestrator from its collaborators.
    #[must_use]
    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        provisioner: Arc<dyn ProfileProvisioner>,
        resolver: RoleResolver,
        frontend_client: FrontendClientConfig,
    ) -> Self {
        Self {
            provider,
            provisioner,
            resolver,
            frontend_client,
        }
    }

    /// Creates an orchestrator backed by Keycloak and the HTTP profile services.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider URL is unusable or an HTTP client
    /// cannot be built.
    pub fn from_config(config: &IdentityConfig) -> Result<Self, ClientBuildError> {
        let provider = KeycloakClient::new(config.provider.clone())?;
        let provisioner = HttpProfileProvisioner::new(config.services.clone())?;
        let resolver = RoleResolver::new(RoleNaming::new(config.provider.role_prefix.clone()));

        Ok(Self::new(
            Arc::new(provider),
            Arc::new(provisioner),
            resolver,
            config.frontend_client.clone(),
        ))
    }

    /// Returns the role resolver.
    #[must_use]
    pub fn resolver(&self) -> &RoleResolver {
        &self.resolver
    }

    /// Obtains a service account token. Any failure is fatal to the flow.
    async fn admin_token(&self) -> AuthResult<String> {
        match self.provider.admin_token().await {
            Ok(token) => Ok(token.access_token),
            Err(e) => {
                tracing::error!(error = %e, "Failed to obtain admin token");
                Err(AuthError::provider_unavailable(
                    "Failed to authenticate with identity provider",
                ))
            }
        }
    }
}

impl fmt::Debug for AuthOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthOrchestrator")
            .field("resolver", &self.resolver)
            .field("frontend_client", &self.frontend_client)
            .finish_non_exhaustive()
    }
}
