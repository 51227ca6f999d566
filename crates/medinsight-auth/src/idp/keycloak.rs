//! Keycloak REST implementation of [`IdentityProvider`].

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use url::Url;

use super::types::{
    NewUser, ProviderToken, ProviderUser, RoleRepresentation, UserInfo, UserUpdate,
};
use super::{IdentityProvider, IdpError};
use crate::config::ProviderConfig;

/// Errors raised while constructing a [`KeycloakClient`].
#[derive(Debug, thiserror::Error)]
pub enum ClientBuildError {
    /// The provider URL does not parse.
    #[error("Invalid identity provider URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The provider URL cannot carry a path (e.g. `mailto:`).
    #[error("Identity provider URL cannot be used as a base: {0}")]
    NotABase(String),

    /// The HTTP client could not be built.
    #[error("Failed to create HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}

/// HTTP client for a Keycloak realm and its admin API.
#[derive(Debug, Clone)]
pub struct KeycloakClient {
    http: reqwest::Client,
    base: Url,
    config: ProviderConfig,
}

impl KeycloakClient {
    /// Creates a client for the realm described by `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or the HTTP client cannot
    /// be built.
    pub fn new(config: ProviderConfig) -> Result<Self, ClientBuildError> {
        let base = Url::parse(config.base_url())?;
        if base.cannot_be_a_base() {
            return Err(ClientBuildError::NotABase(config.url.clone()));
        }

        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self { http, base, config })
    }

    /// Returns the provider configuration.
    #[must_use]
    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        // `new` rejects cannot-be-a-base URLs, so this always succeeds.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn token_url(&self, realm: &str) -> Url {
        self.url(&["realms", realm, "protocol", "openid-connect", "token"])
    }

    fn admin_url(&self, segments: &[&str]) -> Url {
        let mut all = vec!["admin", "realms", self.config.realm.as_str()];
        all.extend_from_slice(segments);
        self.url(&all)
    }

    async fn password_grant(
        &self,
        realm: &str,
        client_id: &str,
        username: &str,
        password: &str,
    ) -> Result<ProviderToken, IdpError> {
        let params = [
            ("client_id", client_id),
            ("grant_type", "password"),
            ("username", username),
            ("password", password),
        ];

        let response = self
            .http
            .post(self.token_url(realm))
            .form(&params)
            .send()
            .await
            .map_err(IdpError::Unreachable)?;

        let status = response.status();
        let body = response.text().await.map_err(IdpError::Unreachable)?;

        let json: Value = if body.trim().is_empty() {
            Value::Object(Map::new())
        } else {
            serde_json::from_str(&body).map_err(|e| {
                tracing::warn!(realm, status = status.as_u16(), "Token endpoint returned non-JSON body");
                IdpError::Malformed(e.to_string())
            })?
        };

        if !status.is_success() {
            let message = json
                .get("error_description")
                .and_then(Value::as_str)
                .or_else(|| json.get("errorMessage").and_then(Value::as_str))
                .unwrap_or("Invalid credentials")
                .to_string();
            tracing::debug!(realm, status = status.as_u16(), "Password grant rejected");
            return Err(IdpError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_value(json).map_err(|e| IdpError::Malformed(e.to_string()))
    }

    /// Sends a request and turns non-2xx answers into [`IdpError::Status`].
    async fn send(&self, request: RequestBuilder) -> Result<Response, IdpError> {
        let response = request.send().await.map_err(IdpError::Unreachable)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        tracing::debug!(status = status.as_u16(), "Identity provider call failed");
        Err(IdpError::Status {
            status: status.as_u16(),
            body,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, IdpError> {
        let response = self.send(request).await?;
        read_json(response).await
    }
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, IdpError> {
    let body = response.text().await.map_err(IdpError::Unreachable)?;
    serde_json::from_str(&body).map_err(|e| IdpError::Malformed(e.to_string()))
}

#[async_trait]
impl IdentityProvider for KeycloakClient {
    async fn admin_token(&self) -> Result<ProviderToken, IdpError> {
        self.password_grant(
            &self.config.admin_realm,
            &self.config.admin_client_id,
            &self.config.admin_username,
            &self.config.admin_password,
        )
        .await
    }

    async fn exchange_password(
        &self,
        username: &str,
        password: &str,
    ) -> Result<ProviderToken, IdpError> {
        self.password_grant(&self.config.realm, &self.config.client_id, username, password)
            .await
    }

    async fn user_info(&self, access_token: &str) -> Result<UserInfo, IdpError> {
        let url = self.url(&[
            "realms",
            &self.config.realm,
            "protocol",
            "openid-connect",
            "userinfo",
        ]);
        self.get_json(self.http.get(url).bearer_auth(access_token))
            .await
    }

    async fn find_user_by_username(
        &self,
        admin_token: &str,
        username: &str,
    ) -> Result<Option<ProviderUser>, IdpError> {
        let request = self
            .http
            .get(self.admin_url(&["users"]))
            .bearer_auth(admin_token)
            .query(&[("username", username), ("exact", "true")]);
        let users: Vec<ProviderUser> = self.get_json(request).await?;

        Ok(users
            .into_iter()
            .find(|user| user.username.eq_ignore_ascii_case(username)))
    }

    /// Pages through the realm users, `list_max` per request, until a short
    /// page comes back.
    async fn list_users(&self, admin_token: &str) -> Result<Vec<ProviderUser>, IdpError> {
        let page_size = self.config.list_max.max(1);
        let mut users = Vec::new();
        let mut first: u32 = 0;

        loop {
            let request = self
                .http
                .get(self.admin_url(&["users"]))
                .bearer_auth(admin_token)
                .query(&[("first", first), ("max", page_size)]);
            let page: Vec<ProviderUser> = self.get_json(request).await?;
            let fetched = page.len();
            users.extend(page);

            if fetched < page_size as usize {
                break;
            }
            match first.checked_add(page_size) {
                Some(next) => first = next,
                None => break,
            }
        }

        tracing::debug!(count = users.len(), "Listed realm users");
        Ok(users)
    }

    async fn create_user(&self, admin_token: &str, user: &NewUser) -> Result<(), IdpError> {
        let response = self
            .http
            .post(self.admin_url(&["users"]))
            .bearer_auth(admin_token)
            .json(user)
            .send()
            .await
            .map_err(IdpError::Unreachable)?;

        match response.status() {
            StatusCode::CONFLICT => Err(IdpError::Conflict),
            status if status.is_success() => Ok(()),
            status => Err(IdpError::Status {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            }),
        }
    }

    async fn update_user(
        &self,
        admin_token: &str,
        user_id: &str,
        update: &UserUpdate,
    ) -> Result<(), IdpError> {
        let request = self
            .http
            .put(self.admin_url(&["users", user_id]))
            .bearer_auth(admin_token)
            .json(update);
        self.send(request).await.map(drop)
    }

    async fn delete_user(&self, admin_token: &str, user_id: &str) -> Result<(), IdpError> {
        let request = self
            .http
            .delete(self.admin_url(&["users", user_id]))
            .bearer_auth(admin_token);
        self.send(request).await.map(drop)
    }

    async fn reset_password(
        &self,
        admin_token: &str,
        user_id: &str,
        new_password: &str,
    ) -> Result<(), IdpError> {
        let credential = serde_json::json!({
            "type": "password",
            "value": new_password,
            "temporary": false,
        });
        let request = self
            .http
            .put(self.admin_url(&["users", user_id, "reset-password"]))
            .bearer_auth(admin_token)
            .json(&credential);
        self.send(request).await.map(drop)
    }

    async fn get_role(
        &self,
        admin_token: &str,
        role_name: &str,
    ) -> Result<Option<RoleRepresentation>, IdpError> {
        let response = self
            .http
            .get(self.admin_url(&["roles", role_name]))
            .bearer_auth(admin_token)
            .send()
            .await
            .map_err(IdpError::Unreachable)?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(IdpError::Status {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        read_json(response).await.map(Some)
    }

    async fn list_role_mappings(
        &self,
        admin_token: &str,
        user_id: &str,
    ) -> Result<Vec<RoleRepresentation>, IdpError> {
        let request = self
            .http
            .get(self.admin_url(&["users", user_id, "role-mappings", "realm"]))
            .bearer_auth(admin_token);
        self.get_json(request).await
    }

    async fn add_role_mappings(
        &self,
        admin_token: &str,
        user_id: &str,
        roles: &[RoleRepresentation],
    ) -> Result<(), IdpError> {
        let request = self
            .http
            .post(self.admin_url(&["users", user_id, "role-mappings", "realm"]))
            .bearer_auth(admin_token)
            .json(roles);
        self.send(request).await.map(drop)
    }

    async fn remove_role_mappings(
        &self,
        admin_token: &str,
        user_id: &str,
        roles: &[RoleRepresentation],
    ) -> Result<(), IdpError> {
        let request = self
            .http
            .delete(self.admin_url(&["users", user_id, "role-mappings", "realm"]))
            .bearer_auth(admin_token)
            .json(roles);
        self.send(request).await.map(drop)
    }

    async fn find_client(
        &self,
        admin_token: &str,
        client_id: &str,
    ) -> Result<Option<Value>, IdpError> {
        let request = self
            .http
            .get(self.admin_url(&["clients"]))
            .bearer_auth(admin_token)
            .query(&[("clientId", client_id)]);
        let clients: Vec<Value> = self.get_json(request).await?;
        Ok(clients.into_iter().next())
    }

    async fn create_client(&self, admin_token: &str, client: &Value) -> Result<(), IdpError> {
        let request = self
            .http
            .post(self.admin_url(&["clients"]))
            .bearer_auth(admin_token)
            .json(client);
        self.send(request).await.map(drop)
    }

    async fn update_client(
        &self,
        admin_token: &str,
        id: &str,
        client: &Value,
    ) -> Result<(), IdpError> {
        let request = self
            .http
            .put(self.admin_url(&["clients", id]))
            .bearer_auth(admin_token)
            .json(client);
        self.send(request).await.map(drop)
    }
}
