//! Identity provider client.
//!
//! [`IdentityProvider`] is the seam between the orchestration flows and the
//! provider. [`KeycloakClient`] implements it against the Keycloak REST API;
//! tests substitute in-memory doubles.
//!
//! Every admin operation takes the bearer token explicitly. Nothing is cached
//! between calls.

mod error;
mod keycloak;
mod types;

use async_trait::async_trait;
use serde_json::Value;

pub use error::IdpError;
pub use keycloak::{ClientBuildError, KeycloakClient};
pub use types::{
    NewUser, PasswordCredential, ProviderToken, ProviderUser, RoleRepresentation, UserInfo,
    UserUpdate,
};

/// Operations the gateway needs from an OAuth2/OIDC identity provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Exchanges the configured service account credentials for an admin token.
    async fn admin_token(&self) -> Result<ProviderToken, IdpError>;

    /// End-user password grant against the application realm.
    async fn exchange_password(
        &self,
        username: &str,
        password: &str,
    ) -> Result<ProviderToken, IdpError>;

    /// Fetches the OIDC userinfo document for an access token.
    async fn user_info(&self, access_token: &str) -> Result<UserInfo, IdpError>;

    /// Looks a user up by exact username.
    async fn find_user_by_username(
        &self,
        admin_token: &str,
        username: &str,
    ) -> Result<Option<ProviderUser>, IdpError>;

    /// Lists the users of the realm, bounded by the configured maximum.
    async fn list_users(&self, admin_token: &str) -> Result<Vec<ProviderUser>, IdpError>;

    /// Creates a user. Fails with [`IdpError::Conflict`] if it already exists.
    async fn create_user(&self, admin_token: &str, user: &NewUser) -> Result<(), IdpError>;

    /// Applies a partial update to a user.
    async fn update_user(
        &self,
        admin_token: &str,
        user_id: &str,
        update: &UserUpdate,
    ) -> Result<(), IdpError>;

    /// Deletes a user.
    async fn delete_user(&self, admin_token: &str, user_id: &str) -> Result<(), IdpError>;

    /// Sets a permanent password for a user.
    async fn reset_password(
        &self,
        admin_token: &str,
        user_id: &str,
        new_password: &str,
    ) -> Result<(), IdpError>;

    /// Looks a realm role up by name. Returns `None` if the role does not exist.
    async fn get_role(
        &self,
        admin_token: &str,
        role_name: &str,
    ) -> Result<Option<RoleRepresentation>, IdpError>;

    /// Lists the realm roles mapped to a user.
    async fn list_role_mappings(
        &self,
        admin_token: &str,
        user_id: &str,
    ) -> Result<Vec<RoleRepresentation>, IdpError>;

    /// Maps realm roles to a user.
    async fn add_role_mappings(
        &self,
        admin_token: &str,
        user_id: &str,
        roles: &[RoleRepresentation],
    ) -> Result<(), IdpError>;

    /// Removes realm role mappings from a user.
    async fn remove_role_mappings(
        &self,
        admin_token: &str,
        user_id: &str,
        roles: &[RoleRepresentation],
    ) -> Result<(), IdpError>;

    /// Removes `remove` then adds `add`.
    ///
    /// The two requests are independent: if the second one fails the user is
    /// left without the removed roles. Concurrent changes for the same user
    /// can interleave.
    async fn replace_role_mappings(
        &self,
        admin_token: &str,
        user_id: &str,
        remove: &[RoleRepresentation],
        add: &[RoleRepresentation],
    ) -> Result<(), IdpError> {
        if !remove.is_empty() {
            self.remove_role_mappings(admin_token, user_id, remove)
                .await?;
        }
        if !add.is_empty() {
            self.add_role_mappings(admin_token, user_id, add).await?;
        }
        Ok(())
    }

    /// Finds a client by its public client id and returns its representation.
    async fn find_client(
        &self,
        admin_token: &str,
        client_id: &str,
    ) -> Result<Option<Value>, IdpError>;

    /// Creates a client from a representation.
    async fn create_client(&self, admin_token: &str, client: &Value) -> Result<(), IdpError>;

    /// Replaces the client with internal id `id`.
    async fn update_client(
        &self,
        admin_token: &str,
        id: &str,
        client: &Value,
    ) -> Result<(), IdpError>;
}
