//! Password login.

use serde::Serialize;

use super::{AuthOrchestrator, Degradation, Outcome};
use crate::AuthResult;
use crate::claims::decode_unverified;
use crate::idp::UserInfo;
use crate::numeric_id::{NumericIdentityId, to_numeric_id};
use crate::role::ApplicationRole;

/// Session returned to the browser after a successful login.
#[derive(Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionPayload {
    /// Provider access token.
    pub token: String,

    /// Provider refresh token.
    pub refresh_token: Option<String>,

    /// Profile of the signed-in user.
    pub user: SessionUser,
}

impl std::fmt::Debug for SessionPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionPayload")
            .field("token", &"<redacted>")
            .field("user", &self.user)
            .finish_non_exhaustive()
    }
}

/// User part of a [`SessionPayload`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionUser {
    /// Username as typed at login.
    pub username: String,

    /// Email address, empty if unknown.
    pub email: String,

    /// Numeric id derived from `sub`, 0 if `sub` is unknown.
    pub id: NumericIdentityId,

    /// Provider subject, empty if unknown.
    pub sub: String,

    /// Resolved application role.
    pub role: ApplicationRole,
}

impl AuthOrchestrator {
    /// Exchanges a username and password for a session.
    ///
    /// Only the password grant can fail the login. A failing userinfo call
    /// degrades the session: `sub` and `email` then come from the access
    /// token claims, and the email falls back to the username.
    ///
    /// # Errors
    ///
    /// `InvalidCredentials` with the provider's status and description when
    /// the grant is refused, `ProviderUnavailable` when the provider cannot be
    /// reached, `MalformedProviderResponse` when the body is not JSON.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> AuthResult<Outcome<SessionPayload>> {
        tracing::debug!(username, "Attempting login");

        let token = self
            .provider
            .exchange_password(username, password)
            .await
            .inspect_err(|e| tracing::info!(username, error = %e, "Login refused"))?;

        let mut degradations = Vec::new();

        let info = match self.provider.user_info(&token.access_token).await {
            Ok(info) => info,
            Err(e) => {
                tracing::warn!(username, error = %e, "Userinfo unavailable, using token claims");
                degradations.push(Degradation::UserInfoUnavailable);
                UserInfo::default()
            }
        };

        let (claims, role) = match decode_unverified(&token.access_token) {
            Ok(claims) => {
                let role = self.resolver.resolve_claims(&claims);
                (claims, role)
            }
            Err(e) => {
                tracing::warn!(username, error = %e, "Could not decode access token, defaulting role");
                (Default::default(), ApplicationRole::default())
            }
        };

        let sub = info.sub.or(claims.sub).unwrap_or_default();
        let email = info
            .email
            .or(claims.email)
            .unwrap_or_else(|| username.to_string());
        let id = if sub.is_empty() {
            NumericIdentityId::default()
        } else {
            to_numeric_id(&sub)
        };

        tracing::info!(username, %role, user_id = %id, "Login succeeded");

        let session = SessionPayload {
            token: token.access_token,
            refresh_token: token.refresh_token,
            user: SessionUser {
                username: username.to_string(),
                email,
                id,
                sub,
                role,
            },
        };

        Ok(Outcome::from_parts(session, degradations))
    }
}
