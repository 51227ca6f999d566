//! Identity provider wire types.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Token endpoint response.
///
/// `Debug` never prints the token values.
#[derive(Clone, Deserialize)]
pub struct ProviderToken {
    /// Bearer access token.
    pub access_token: String,

    /// Refresh token, when the grant issued one.
    #[serde(default)]
    pub refresh_token: Option<String>,

    /// Access token lifetime in seconds.
    #[serde(default)]
    pub expires_in: Option<u64>,
}

impl fmt::Debug for ProviderToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderToken")
            .field("access_token", &"<redacted>")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "<redacted>"),
            )
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

/// Subset of the OpenID Connect userinfo response used by the gateway.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserInfo {
    /// Subject identifier.
    #[serde(default)]
    pub sub: Option<String>,

    /// Email address.
    #[serde(default)]
    pub email: Option<String>,

    /// Preferred username.
    #[serde(default)]
    pub preferred_username: Option<String>,
}

/// A user as returned by the admin users endpoint.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderUser {
    /// Provider-issued opaque id (UUID in Keycloak).
    pub id: String,

    /// Login name.
    pub username: String,

    /// Email address.
    #[serde(default)]
    pub email: Option<String>,

    /// Whether the account can sign in.
    #[serde(default)]
    pub enabled: bool,

    /// Given name.
    #[serde(default)]
    pub first_name: Option<String>,

    /// Family name.
    #[serde(default)]
    pub last_name: Option<String>,
}

/// A realm role.
///
/// Unknown fields are kept so the representation can be posted back
/// unchanged to the role-mapping endpoints.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RoleRepresentation {
    /// Role id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Role name.
    pub name: String,

    /// Remaining provider fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RoleRepresentation {
    /// Creates a role representation from an id and a name.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            name: name.into(),
            extra: Map::new(),
        }
    }
}

/// Password credential attached to a new user.
#[derive(Clone, Serialize)]
pub struct PasswordCredential {
    #[serde(rename = "type")]
    kind: &'static str,
    value: String,
    temporary: bool,
}

impl PasswordCredential {
    /// Creates a permanent password credential.
    #[must_use]
    pub fn permanent(value: impl Into<String>) -> Self {
        Self {
            kind: "password",
            value: value.into(),
            temporary: false,
        }
    }
}

impl fmt::Debug for PasswordCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PasswordCredential")
            .field("type", &self.kind)
            .field("temporary", &self.temporary)
            .finish_non_exhaustive()
    }
}

/// User representation posted to the admin users endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    /// Login name.
    pub username: String,

    /// Email address.
    pub email: String,

    /// Given name.
    pub first_name: String,

    /// Family name.
    pub last_name: String,

    /// Whether the account is enabled.
    pub enabled: bool,

    /// Whether the email is marked as verified.
    pub email_verified: bool,

    /// Initial credentials.
    pub credentials: Vec<PasswordCredential>,

    /// Custom user attributes.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, Vec<String>>,
}

/// Partial user update; absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UserUpdate {
    /// New login name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// New email address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// New enabled flag.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
}

impl UserUpdate {
    /// Returns `true` if the update carries no change.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.email.is_none() && self.enabled.is_none()
    }
}
