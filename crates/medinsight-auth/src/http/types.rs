//! Request and response bodies of the JSON endpoints.
//!
//! Request fields are all optional at the serde level so that a missing field
//! produces the endpoint's own 400 message rather than a deserializer error.

use serde::{Deserialize, Serialize};

use crate::idp::UserUpdate;
use crate::orchestrator::{Degradation, RegisteredUser, Registration};
use crate::role::ApplicationRole;

/// Returns the value if it is present and not blank.
pub(crate) fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// `POST /auth/login` body.
#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// `POST /auth/register` body.
#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub nom: Option<String>,
    #[serde(default)]
    pub prenom: Option<String>,
    #[serde(default)]
    pub date_naissance: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub telephone: Option<String>,
    #[serde(default)]
    pub emergency_contact: Option<String>,
    #[serde(default)]
    pub rue: Option<String>,
    #[serde(default)]
    pub ville: Option<String>,
    #[serde(default)]
    pub code_postal: Option<String>,
    #[serde(default)]
    pub pays: Option<String>,
}

impl RegisterRequest {
    /// Converts to a [`Registration`], or `None` if a required field is missing.
    pub(crate) fn into_registration(self) -> Option<Registration> {
        Some(Registration {
            username: present(self.username)?,
            email: present(self.email)?,
            password: present(self.password)?,
            role: self.role,
            nom: self.nom,
            prenom: self.prenom,
            date_naissance: self.date_naissance,
            gender: self.gender,
            telephone: self.telephone,
            emergency_contact: self.emergency_contact,
            rue: self.rue,
            ville: self.ville,
            code_postal: self.code_postal,
            pays: self.pays,
        })
    }
}

/// `POST /auth/register` response.
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: String,
    pub username: String,
    pub email: String,
    /// Role the account signs in with, `PATIENT` if the requested role
    /// could not be mapped.
    pub role: ApplicationRole,
    /// Best-effort steps that did not complete.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl RegisterResponse {
    pub(crate) fn new(user: RegisteredUser, degradations: &[Degradation]) -> Self {
        Self {
            message: "Account created successfully".to_string(),
            username: user.username,
            email: user.email,
            role: user.role,
            warnings: degradations.iter().map(ToString::to_string).collect(),
        }
    }
}

/// `POST /admin/change-role` body.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeRoleRequest {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub new_role: Option<String>,
}

/// `POST /admin/change-role` response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeRoleResponse {
    pub message: String,
    pub new_role: ApplicationRole,
}

/// `PUT /admin/reset-password` body.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub new_password: Option<String>,
}

/// `PUT /admin/users` body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub enabled: Option<bool>,
}

impl UpdateUserRequest {
    pub(crate) fn update(&self) -> UserUpdate {
        UserUpdate {
            username: present(self.username.clone()),
            email: present(self.email.clone()),
            enabled: self.enabled,
        }
    }
}

/// `DELETE /admin/users` query parameters.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteUserParams {
    #[serde(default)]
    pub user_id: Option<String>,
}

/// Plain `{message}` body.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// `POST /admin/setup` response.
#[derive(Debug, Serialize)]
pub struct SetupResponse {
    pub message: String,
    pub created: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_register_request_requires_credentials() {
        let request: RegisterRequest = serde_json::from_value(json!({
            "username": "u1",
            "email": "u1@x.com",
            "password": "p1",
            "role": "MEDECIN",
            "codePostal": "69000",
            "emergencyContact": "0600000000"
        }))
        .unwrap();
        let registration = request.into_registration().unwrap();
        assert_eq!(registration.role.as_deref(), Some("MEDECIN"));
        assert_eq!(registration.code_postal.as_deref(), Some("69000"));
        assert_eq!(registration.emergency_contact.as_deref(), Some("0600000000"));

        let request: RegisterRequest =
            serde_json::from_value(json!({"username": "u1", "email": " ", "password": "p"}))
                .unwrap();
        assert!(request.into_registration().is_none());
    }

    #[test]
    fn test_register_response_omits_empty_warnings() {
        let user = RegisteredUser {
            username: "u1".to_string(),
            email: "u1@x.com".to_string(),
            role: ApplicationRole::Medecin,
            provider_id: "id".to_string(),
            numeric_id: crate::to_numeric_id("id"),
        };

        let body = serde_json::to_value(RegisterResponse::new(user.clone(), &[])).unwrap();
        assert_eq!(
            body,
            json!({
                "message": "Account created successfully",
                "username": "u1",
                "email": "u1@x.com",
                "role": "MEDECIN"
            })
        );

        let body = serde_json::to_value(RegisterResponse::new(
            user,
            &[Degradation::ProfileProvisioningFailed],
        ))
        .unwrap();
        assert_eq!(body["warnings"], json!(["Profile creation failed"]));
    }

    #[test]
    fn test_update_request_drops_blank_fields() {
        let request: UpdateUserRequest =
            serde_json::from_value(json!({"userId": "x", "username": "", "enabled": true}))
                .unwrap();
        let update = request.update();
        assert_eq!(update.username, None);
        assert_eq!(update.enabled, Some(true));
    }
}
