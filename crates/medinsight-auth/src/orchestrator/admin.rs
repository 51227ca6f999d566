//! Administrative user management.
//!
//! These flows are not authenticated by the gateway; deployments are expected
//! to restrict the `/admin` routes upstream.

use futures_util::future::join_all;
use serde::Serialize;
use serde_json::{Value, json};

use super::AuthOrchestrator;
use crate::AuthResult;
use crate::error::AuthError;
use crate::idp::{ProviderUser, RoleRepresentation, UserUpdate};
use crate::role::ApplicationRole;

/// Account state shown in the admin listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserStatus {
    Active,
    Inactive,
}

/// One row of the admin user listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdminUserView {
    pub id: String,
    pub sub: String,
    pub username: String,
    pub email: Option<String>,
    pub enabled: bool,
    pub role: ApplicationRole,
    pub status: UserStatus,
    pub provider: &'static str,
}

impl AdminUserView {
    fn new(user: ProviderUser, role: ApplicationRole) -> Self {
        let status = if user.enabled {
            UserStatus::Active
        } else {
            UserStatus::Inactive
        };
        Self {
            sub: user.id.clone(),
            id: user.id,
            username: user.username,
            email: user.email,
            enabled: user.enabled,
            role,
            status,
            provider: "keycloak",
        }
    }
}

/// Result of [`AuthOrchestrator::ensure_frontend_client`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontendClientSetup {
    /// Public client id.
    pub client_id: String,
    /// `true` if the client was created, `false` if an existing one was updated.
    pub created: bool,
}

impl AuthOrchestrator {
    /// Replaces the application role of a user.
    ///
    /// The target provider role is looked up before anything is changed. A
    /// user already holding exactly the target role is left untouched.
    /// Otherwise the other application roles are removed and the target is
    /// added; those two provider calls are not atomic.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown role, and the provider's status when reading
    /// or changing the mappings fails.
    pub async fn change_role(&self, user_id: &str, new_role: &str) -> AuthResult<ApplicationRole> {
        let role = ApplicationRole::parse(new_role)
            .ok_or_else(|| AuthError::not_found(format!("Role {new_role} not found")))?;
        let role_name = self.resolver.naming().provider_name(role);

        let admin_token = self.admin_token().await?;

        let target = self
            .provider
            .get_role(&admin_token, &role_name)
            .await
            .map_err(|e| AuthError::from_idp(e, "Failed to look up role"))?
            .ok_or_else(|| AuthError::not_found(format!("Role {new_role} not found")))?;

        let current = self
            .provider
            .list_role_mappings(&admin_token, user_id)
            .await
            .map_err(|e| AuthError::from_idp(e, "Failed to fetch current roles"))?;

        let application_roles: Vec<RoleRepresentation> = current
            .into_iter()
            .filter(|r| self.resolver.naming().recognise(&r.name).is_some())
            .collect();

        let holds_target = application_roles.iter().any(|r| r.name == target.name);
        if holds_target && application_roles.len() == 1 {
            tracing::debug!(user_id, %role, "Role unchanged");
            return Ok(role);
        }

        let remove: Vec<RoleRepresentation> = application_roles
            .into_iter()
            .filter(|r| r.name != target.name)
            .collect();
        let add = if holds_target { Vec::new() } else { vec![target] };

        self.provider
            .replace_role_mappings(&admin_token, user_id, &remove, &add)
            .await
            .map_err(|e| {
                tracing::error!(user_id, %role, error = %e, "Role change failed");
                AuthError::from_idp(e, "Failed to assign new role")
            })?;

        tracing::info!(user_id, %role, removed = remove.len(), "Role changed");
        Ok(role)
    }

    /// Sets a permanent password for a user.
    ///
    /// # Errors
    ///
    /// Returns the provider's status if the reset is refused.
    pub async fn reset_password(&self, user_id: &str, new_password: &str) -> AuthResult<()> {
        let admin_token = self.admin_token().await?;
        self.provider
            .reset_password(&admin_token, user_id, new_password)
            .await
            .map_err(|e| {
                tracing::error!(user_id, error = %e, "Password reset failed");
                AuthError::from_idp(e, "Failed to reset password")
            })?;
        tracing::info!(user_id, "Password reset");
        Ok(())
    }

    /// Lists every user with its current application role.
    ///
    /// Role mappings are fetched concurrently, one request per user. A user
    /// whose lookup fails is still listed, as `PATIENT`.
    ///
    /// # Errors
    ///
    /// Fails only if the admin token or the user list cannot be obtained.
    pub async fn list_users(&self) -> AuthResult<Vec<AdminUserView>> {
        let admin_token = self.admin_token().await?;

        let users = self
            .provider
            .list_users(&admin_token)
            .await
            .map_err(|e| AuthError::from_idp(e, "Failed to fetch users"))?;

        let lookups = users.into_iter().map(|user| {
            let admin_token = admin_token.as_str();
            async move {
                let role = match self
                    .provider
                    .list_role_mappings(admin_token, &user.id)
                    .await
                {
                    Ok(roles) => self.resolver.resolve_names(roles.iter().map(|r| &r.name)),
                    Err(e) => {
                        tracing::warn!(username = %user.username, error = %e, "Role lookup failed, listing as PATIENT");
                        ApplicationRole::default()
                    }
                };
                AdminUserView::new(user, role)
            }
        });

        let views = join_all(lookups).await;
        tracing::debug!(count = views.len(), "Listed users");
        Ok(views)
    }

    /// Applies a partial update to a user.
    ///
    /// # Errors
    ///
    /// Returns the provider's status if the update is refused.
    pub async fn update_user(&self, user_id: &str, update: &UserUpdate) -> AuthResult<()> {
        let admin_token = self.admin_token().await?;
        self.provider
            .update_user(&admin_token, user_id, update)
            .await
            .map_err(|e| {
                tracing::error!(user_id, error = %e, "User update failed");
                AuthError::from_idp(e, "Failed to update user")
            })?;
        tracing::info!(user_id, "User updated");
        Ok(())
    }

    /// Deletes a user. The backend profile, if any, is left in place.
    ///
    /// # Errors
    ///
    /// Returns the provider's status if the deletion is refused.
    pub async fn delete_user(&self, user_id: &str) -> AuthResult<()> {
        let admin_token = self.admin_token().await?;
        self.provider
            .delete_user(&admin_token, user_id)
            .await
            .map_err(|e| {
                tracing::error!(user_id, error = %e, "User deletion failed");
                AuthError::from_idp(e, "Failed to delete user")
            })?;
        tracing::info!(user_id, "User deleted");
        Ok(())
    }

    /// Makes sure the public frontend client exists with direct access
    /// grants enabled, creating it or updating it in place.
    ///
    /// # Errors
    ///
    /// Returns the provider's status if the client cannot be read or written.
    pub async fn ensure_frontend_client(&self) -> AuthResult<FrontendClientSetup> {
        let client_id = self.frontend_client.client_id.clone();
        let desired = self.desired_frontend_client();
        let admin_token = self.admin_token().await?;

        let existing = self
            .provider
            .find_client(&admin_token, &client_id)
            .await
            .map_err(|e| AuthError::from_idp(e, "Failed to look up client"))?;

        let created = match existing {
            None => {
                self.provider
                    .create_client(&admin_token, &desired)
                    .await
                    .map_err(|e| AuthError::from_idp(e, "Failed to create client"))?;
                true
            }
            Some(mut client) => {
                let id = client
                    .get("id")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .ok_or_else(|| AuthError::malformed("Client representation has no id"))?;

                if let (Some(current), Value::Object(overrides)) = (client.as_object_mut(), desired) {
                    current.extend(overrides);
                }

                self.provider
                    .update_client(&admin_token, &id, &client)
                    .await
                    .map_err(|e| AuthError::from_idp(e, "Failed to update client"))?;
                false
            }
        };

        tracing::info!(client_id = %client_id, created, "Frontend client configured");
        Ok(FrontendClientSetup { client_id, created })
    }

    fn desired_frontend_client(&self) -> Value {
        let root = self.frontend_client.root_url.trim_end_matches('/');
        json!({
            "clientId": self.frontend_client.client_id,
            "publicClient": true,
            "directAccessGrantsEnabled": true,
            "standardFlowEnabled": true,
            "implicitFlowEnabled": false,
            "serviceAccountsEnabled": false,
            "redirectUris": [format!("{root}/*")],
            "webOrigins": [root, "+"],
            "rootUrl": root,
            "baseUrl": root,
        })
    }
}
