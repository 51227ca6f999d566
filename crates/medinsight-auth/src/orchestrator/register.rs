//! Self-service registration.

use std::collections::BTreeMap;
use std::fmt;

use super::{AuthOrchestrator, Degradation, Outcome};
use crate::AuthResult;
use crate::error::AuthError;
use crate::idp::{IdpError, NewUser, PasswordCredential};
use crate::numeric_id::{NumericIdentityId, to_numeric_id};
use crate::provisioning::{Address, ProfileDetails, ProfileRecord};
use crate::role::ApplicationRole;

/// Registration form.
#[derive(Clone, Default)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
    /// Requested role; missing, unknown or privileged means `PATIENT`.
    pub role: Option<String>,
    pub nom: Option<String>,
    pub prenom: Option<String>,
    pub date_naissance: Option<String>,
    pub gender: Option<String>,
    pub telephone: Option<String>,
    pub emergency_contact: Option<String>,
    pub rue: Option<String>,
    pub ville: Option<String>,
    pub code_postal: Option<String>,
    pub pays: Option<String>,
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("role", &self.role)
            .finish_non_exhaustive()
    }
}

impl Registration {
    fn first_name(&self) -> String {
        non_blank(&self.prenom)
            .unwrap_or(self.username.as_str())
            .to_string()
    }

    fn last_name(&self) -> String {
        non_blank(&self.nom).unwrap_or("User").to_string()
    }

    /// Extras stored as provider user attributes.
    fn attributes(&self) -> BTreeMap<String, Vec<String>> {
        [
            ("dateNaissance", &self.date_naissance),
            ("gender", &self.gender),
            ("telephone", &self.telephone),
            ("emergencyContact", &self.emergency_contact),
            ("rue", &self.rue),
            ("ville", &self.ville),
            ("codePostal", &self.code_postal),
            ("pays", &self.pays),
        ]
        .into_iter()
        .filter_map(|(name, value)| {
            non_blank(value).map(|v| (name.to_string(), vec![v.to_string()]))
        })
        .collect()
    }

    fn profile_record(&self, provider_id: &str) -> ProfileRecord {
        let field = |value: &Option<String>| non_blank(value).unwrap_or_default().to_string();
        ProfileRecord {
            user_id: to_numeric_id(provider_id),
            nom: self.last_name(),
            prenom: self.first_name(),
            email: self.email.clone(),
            profile: ProfileDetails {
                adresse: Address {
                    rue: field(&self.rue),
                    ville: field(&self.ville),
                    code_postal: field(&self.code_postal),
                    pays: field(&self.pays),
                },
            },
            date_naissance: non_blank(&self.date_naissance).map(str::to_string),
            gender: non_blank(&self.gender).map(str::to_string),
            telephone: non_blank(&self.telephone).map(str::to_string),
            emergency_contact: non_blank(&self.emergency_contact).map(str::to_string),
            keycloak_user_id: Some(provider_id.to_string()),
        }
    }
}

/// Role granted on the public form. Only patient, doctor and manager may be
/// self-assigned; anything else registers a patient.
fn self_assigned_role(username: &str, requested: Option<&str>) -> ApplicationRole {
    let requested = match requested.map(str::trim) {
        None | Some("") => return ApplicationRole::default(),
        Some(requested) => requested,
    };
    match ApplicationRole::parse(requested) {
        Some(role) if role.is_self_assignable() => role,
        Some(role) => {
            tracing::warn!(username, %role, "Privileged role requested at registration, registering as PATIENT");
            ApplicationRole::default()
        }
        None => {
            tracing::warn!(username, requested, "Unknown role requested, registering as PATIENT");
            ApplicationRole::default()
        }
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Identity created by a registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredUser {
    pub username: String,
    pub email: String,
    /// Role the user signs in with. `PATIENT` when the requested role could
    /// not be mapped.
    pub role: ApplicationRole,
    /// Provider user id.
    pub provider_id: String,
    pub numeric_id: NumericIdentityId,
}

impl AuthOrchestrator {
    /// Creates an identity, assigns its role and provisions its profile.
    ///
    /// # Errors
    ///
    /// `ProviderUnavailable` if no admin token can be obtained,
    /// `UserAlreadyExists` if the username or email is taken, and a provider
    /// error if the user cannot be created or read back. Role assignment and
    /// profile failures are reported as degradations instead.
    pub async fn register(&self, registration: &Registration) -> AuthResult<Outcome<RegisteredUser>> {
        let username = registration.username.as_str();
        tracing::info!(username, "Registering user");

        let role = self_assigned_role(username, registration.role.as_deref());

        let admin_token = self.admin_token().await?;

        let new_user = NewUser {
            username: registration.username.clone(),
            email: registration.email.clone(),
            first_name: registration.first_name(),
            last_name: registration.last_name(),
            enabled: true,
            email_verified: true,
            credentials: vec![PasswordCredential::permanent(registration.password.clone())],
            attributes: registration.attributes(),
        };

        self.provider
            .create_user(&admin_token, &new_user)
            .await
            .map_err(|e| match e {
                IdpError::Conflict => {
                    tracing::info!(username, "User already exists");
                    AuthError::user_already_exists("Username or email already exists")
                }
                other => {
                    tracing::error!(username, error = %other, "Failed to create user");
                    AuthError::from_idp(other, "Failed to create account")
                }
            })?;

        let user = self
            .provider
            .find_user_by_username(&admin_token, username)
            .await
            .map_err(|e| AuthError::from_idp(e, "User created but could not be retrieved"))?
            .ok_or_else(|| {
                tracing::error!(username, "User missing right after creation");
                AuthError::internal("User created but could not be retrieved")
            })?;

        let mut degradations = Vec::new();

        let mut effective_role = role;
        if let Some(degradation) = self.assign_initial_role(&admin_token, &user.id, role).await {
            degradations.push(degradation);
            effective_role = ApplicationRole::default();
        }

        let record = registration.profile_record(&user.id);
        if let Err(e) = self
            .provisioner
            .create_profile(role, &admin_token, &record)
            .await
        {
            tracing::warn!(username, error = %e, "Profile provisioning failed, keeping account");
            degradations.push(Degradation::ProfileProvisioningFailed);
        }

        tracing::info!(
            username,
            role = %effective_role,
            degraded = !degradations.is_empty(),
            "User registered"
        );

        let registered = RegisteredUser {
            username: registration.username.clone(),
            email: registration.email.clone(),
            role: effective_role,
            numeric_id: record.user_id,
            provider_id: user.id,
        };

        Ok(Outcome::from_parts(registered, degradations))
    }

    /// Maps the provider role for `role` to a new user. Never fails the flow.
    async fn assign_initial_role(
        &self,
        admin_token: &str,
        user_id: &str,
        role: ApplicationRole,
    ) -> Option<Degradation> {
        let role_name = self.resolver.naming().provider_name(role);

        let representation = match self.provider.get_role(admin_token, &role_name).await {
            Ok(Some(representation)) => representation,
            Ok(None) => {
                tracing::warn!(user_id, role = %role_name, "Role not found, user created without role");
                return Some(Degradation::RoleNotFound(role_name));
            }
            Err(e) => {
                tracing::warn!(user_id, role = %role_name, error = %e, "Role lookup failed");
                return Some(Degradation::RoleAssignmentFailed);
            }
        };

        match self
            .provider
            .replace_role_mappings(admin_token, user_id, &[], &[representation])
            .await
        {
            Ok(()) => None,
            Err(e) => {
                tracing::warn!(user_id, role = %role_name, error = %e, "Role assignment failed");
                Some(Degradation::RoleAssignmentFailed)
            }
        }
    }
}
