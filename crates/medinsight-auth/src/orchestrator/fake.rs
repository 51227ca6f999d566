//! In-memory identity provider and profile provisioner for flow tests.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::{Value, json};

use super::AuthOrchestrator;
use crate::claims::decode_unverified;
use crate::claims::test_support::jwt;
use crate::config::FrontendClientConfig;
use crate::idp::{
    IdentityProvider, IdpError, NewUser, ProviderToken, ProviderUser, RoleRepresentation,
    UserInfo, UserUpdate,
};
use crate::provisioning::{ProfileProvisioner, ProfileRecord, ProfileService, ProvisioningError};
use crate::role::{ApplicationRole, RoleResolver};

pub(crate) const ADMIN_TOKEN: &str = "admin-token";

/// Realm roles as provisioned in the MedInsight realm.
pub(crate) const REALM_ROLES: [&str; 5] = [
    "ROLE_ADMIN",
    "ROLE_MEDECIN",
    "ROLE_PATIENT",
    "ROLE_GESTIONNAIRE",
    "ROLE_RESPONSABLE_SECURITE",
];

pub(crate) struct FakeUser {
    pub user: ProviderUser,
    pub password: String,
    pub attributes: Vec<(String, Vec<String>)>,
}

#[derive(Default)]
pub(crate) struct FakeState {
    pub users: Vec<FakeUser>,
    pub roles: Vec<RoleRepresentation>,
    pub mappings: HashMap<String, Vec<RoleRepresentation>>,
    pub clients: Vec<Value>,
    /// Mutating role-mapping calls, as `remove:<user>:<role>` / `add:<user>:<role>`.
    pub calls: Vec<String>,
    pub next_id: u64,

    pub fail_admin_token: bool,
    pub fail_user_info: bool,
    pub fail_add_mappings: bool,
    pub fail_role_lookup: bool,
    pub hide_created_users: bool,
    pub failing_mapping_lookups: HashSet<String>,
}

#[derive(Default)]
pub(crate) struct FakeProvider {
    state: Mutex<FakeState>,
}

impl FakeProvider {
    /// Provider seeded with the realm roles of the MedInsight realm.
    pub fn with_default_roles() -> Self {
        let provider = Self::default();
        {
            let mut state = provider.state();
            for (i, name) in REALM_ROLES.into_iter().enumerate() {
                state
                    .roles
                    .push(RoleRepresentation::new(format!("role-{i}"), name));
            }
        }
        provider
    }

    pub fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    /// Adds a user holding the named realm roles and returns its id.
    pub fn seed_user(&self, username: &str, password: &str, roles: &[&str]) -> String {
        let mut state = self.state();
        let id = next_user_id(&mut state);
        state.users.push(FakeUser {
            user: ProviderUser {
                id: id.clone(),
                username: username.to_string(),
                email: Some(format!("{username}@example.com")),
                enabled: true,
                first_name: None,
                last_name: None,
            },
            password: password.to_string(),
            attributes: Vec::new(),
        });

        let mapped = roles
            .iter()
            .map(|name| {
                state
                    .roles
                    .iter()
                    .find(|r| r.name == *name)
                    .cloned()
                    .unwrap_or_else(|| RoleRepresentation::new(format!("x-{name}"), *name))
            })
            .collect();
        state.mappings.insert(id.clone(), mapped);
        id
    }

    pub fn role_names(&self, user_id: &str) -> Vec<String> {
        let state = self.state();
        let mut names: Vec<String> = state
            .mappings
            .get(user_id)
            .map(|roles| roles.iter().map(|r| r.name.clone()).collect())
            .unwrap_or_default();
        names.sort();
        names
    }

    pub fn user_id(&self, username: &str) -> Option<String> {
        self.state()
            .users
            .iter()
            .find(|u| u.user.username == username)
            .map(|u| u.user.id.clone())
    }
}

fn next_user_id(state: &mut FakeState) -> String {
    state.next_id += 1;
    format!("00000000-0000-4000-8000-{:012x}", state.next_id)
}

fn check_admin(token: &str) -> Result<(), IdpError> {
    if token == ADMIN_TOKEN {
        Ok(())
    } else {
        Err(IdpError::Status {
            status: 401,
            body: String::new(),
        })
    }
}

fn not_found() -> IdpError {
    IdpError::Status {
        status: 404,
        body: r#"{"error":"User not found"}"#.to_string(),
    }
}

fn server_error() -> IdpError {
    IdpError::Status {
        status: 500,
        body: String::new(),
    }
}

#[async_trait]
impl IdentityProvider for FakeProvider {
    async fn admin_token(&self) -> Result<ProviderToken, IdpError> {
        if self.state().fail_admin_token {
            return Err(IdpError::Rejected {
                status: 401,
                message: "Invalid user credentials".to_string(),
            });
        }
        Ok(ProviderToken {
            access_token: ADMIN_TOKEN.to_string(),
            refresh_token: None,
            expires_in: Some(60),
        })
    }

    async fn exchange_password(
        &self,
        username: &str,
        password: &str,
    ) -> Result<ProviderToken, IdpError> {
        let state = self.state();
        let user = state
            .users
            .iter()
            .find(|u| u.user.username.eq_ignore_ascii_case(username) && u.password == password)
            .ok_or_else(|| IdpError::Rejected {
                status: 401,
                message: "Invalid user credentials".to_string(),
            })?;

        let roles: Vec<String> = state
            .mappings
            .get(&user.user.id)
            .map(|roles| roles.iter().map(|r| r.name.clone()).collect())
            .unwrap_or_default();

        let access_token = jwt(&json!({
            "sub": user.user.id,
            "preferred_username": user.user.username,
            "email": user.user.email,
            "realm_access": {"roles": roles}
        }));

        Ok(ProviderToken {
            access_token,
            refresh_token: Some(format!("refresh-{}", user.user.id)),
            expires_in: Some(300),
        })
    }

    async fn user_info(&self, access_token: &str) -> Result<UserInfo, IdpError> {
        if self.state().fail_user_info {
            return Err(server_error());
        }
        let claims = decode_unverified(access_token).map_err(|e| IdpError::Malformed(e.to_string()))?;
        Ok(UserInfo {
            sub: claims.sub,
            email: claims.email,
            preferred_username: claims.preferred_username,
        })
    }

    async fn find_user_by_username(
        &self,
        admin_token: &str,
        username: &str,
    ) -> Result<Option<ProviderUser>, IdpError> {
        check_admin(admin_token)?;
        let state = self.state();
        if state.hide_created_users {
            return Ok(None);
        }
        Ok(state
            .users
            .iter()
            .find(|u| u.user.username.eq_ignore_ascii_case(username))
            .map(|u| u.user.clone()))
    }

    async fn list_users(&self, admin_token: &str) -> Result<Vec<ProviderUser>, IdpError> {
        check_admin(admin_token)?;
        Ok(self.state().users.iter().map(|u| u.user.clone()).collect())
    }

    async fn create_user(&self, admin_token: &str, user: &NewUser) -> Result<(), IdpError> {
        check_admin(admin_token)?;
        let mut state = self.state();
        let exists = state.users.iter().any(|u| {
            u.user.username.eq_ignore_ascii_case(&user.username)
                || u.user
                    .email
                    .as_deref()
                    .is_some_and(|e| e.eq_ignore_ascii_case(&user.email))
        });
        if exists {
            return Err(IdpError::Conflict);
        }

        let password = serde_json::to_value(&user.credentials)
            .ok()
            .and_then(|v| v[0]["value"].as_str().map(str::to_string))
            .unwrap_or_default();

        let id = next_user_id(&mut state);
        state.users.push(FakeUser {
            user: ProviderUser {
                id,
                username: user.username.to_lowercase(),
                email: Some(user.email.clone()),
                enabled: user.enabled,
                first_name: Some(user.first_name.clone()),
                last_name: Some(user.last_name.clone()),
            },
            password,
            attributes: user
                .attributes
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        });
        Ok(())
    }

    async fn update_user(
        &self,
        admin_token: &str,
        user_id: &str,
        update: &UserUpdate,
    ) -> Result<(), IdpError> {
        check_admin(admin_token)?;
        let mut state = self.state();
        let user = state
            .users
            .iter_mut()
            .find(|u| u.user.id == user_id)
            .ok_or_else(not_found)?;
        if let Some(username) = &update.username {
            user.user.username = username.clone();
        }
        if let Some(email) = &update.email {
            user.user.email = Some(email.clone());
        }
        if let Some(enabled) = update.enabled {
            user.user.enabled = enabled;
        }
        Ok(())
    }

    async fn delete_user(&self, admin_token: &str, user_id: &str) -> Result<(), IdpError> {
        check_admin(admin_token)?;
        let mut state = self.state();
        let before = state.users.len();
        state.users.retain(|u| u.user.id != user_id);
        if state.users.len() == before {
            return Err(not_found());
        }
        state.mappings.remove(user_id);
        Ok(())
    }

    async fn reset_password(
        &self,
        admin_token: &str,
        user_id: &str,
        new_password: &str,
    ) -> Result<(), IdpError> {
        check_admin(admin_token)?;
        let mut state = self.state();
        let user = state
            .users
            .iter_mut()
            .find(|u| u.user.id == user_id)
            .ok_or_else(not_found)?;
        user.password = new_password.to_string();
        Ok(())
    }

    async fn get_role(
        &self,
        admin_token: &str,
        role_name: &str,
    ) -> Result<Option<RoleRepresentation>, IdpError> {
        check_admin(admin_token)?;
        let state = self.state();
        if state.fail_role_lookup {
            return Err(server_error());
        }
        Ok(state.roles.iter().find(|r| r.name == role_name).cloned())
    }

    async fn list_role_mappings(
        &self,
        admin_token: &str,
        user_id: &str,
    ) -> Result<Vec<RoleRepresentation>, IdpError> {
        check_admin(admin_token)?;
        let state = self.state();
        if state.failing_mapping_lookups.contains(user_id) {
            return Err(server_error());
        }
        if !state.users.iter().any(|u| u.user.id == user_id) {
            return Err(not_found());
        }
        Ok(state.mappings.get(user_id).cloned().unwrap_or_default())
    }

    async fn add_role_mappings(
        &self,
        admin_token: &str,
        user_id: &str,
        roles: &[RoleRepresentation],
    ) -> Result<(), IdpError> {
        check_admin(admin_token)?;
        let mut state = self.state();
        if state.fail_add_mappings {
            return Err(server_error());
        }
        for role in roles {
            state.calls.push(format!("add:{user_id}:{}", role.name));
            let mapped = state.mappings.entry(user_id.to_string()).or_default();
            if !mapped.iter().any(|r| r.name == role.name) {
                mapped.push(role.clone());
            }
        }
        Ok(())
    }

    async fn remove_role_mappings(
        &self,
        admin_token: &str,
        user_id: &str,
        roles: &[RoleRepresentation],
    ) -> Result<(), IdpError> {
        check_admin(admin_token)?;
        let mut state = self.state();
        for role in roles {
            state.calls.push(format!("remove:{user_id}:{}", role.name));
        }
        if let Some(mapped) = state.mappings.get_mut(user_id) {
            mapped.retain(|r| !roles.iter().any(|x| x.name == r.name));
        }
        Ok(())
    }

    async fn find_client(
        &self,
        admin_token: &str,
        client_id: &str,
    ) -> Result<Option<Value>, IdpError> {
        check_admin(admin_token)?;
        Ok(self
            .state()
            .clients
            .iter()
            .find(|c| c["clientId"] == client_id)
            .cloned())
    }

    async fn create_client(&self, admin_token: &str, client: &Value) -> Result<(), IdpError> {
        check_admin(admin_token)?;
        let mut state = self.state();
        let id = format!("client-{}", state.clients.len() + 1);
        let mut client = client.clone();
        client["id"] = Value::String(id);
        state.clients.push(client);
        Ok(())
    }

    async fn update_client(
        &self,
        admin_token: &str,
        id: &str,
        client: &Value,
    ) -> Result<(), IdpError> {
        check_admin(admin_token)?;
        let mut state = self.state();
        let slot = state
            .clients
            .iter_mut()
            .find(|c| c["id"] == id)
            .ok_or_else(not_found)?;
        *slot = client.clone();
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct FakeProvisioner {
    pub fail: Mutex<bool>,
    pub calls: Mutex<Vec<(ApplicationRole, String, ProfileRecord)>>,
}

impl FakeProvisioner {
    pub fn failing() -> Self {
        Self {
            fail: Mutex::new(true),
            calls: Mutex::default(),
        }
    }

    pub fn calls(&self) -> Vec<(ApplicationRole, String, ProfileRecord)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProfileProvisioner for FakeProvisioner {
    async fn create_profile(
        &self,
        role: ApplicationRole,
        bearer_token: &str,
        record: &ProfileRecord,
    ) -> Result<(), ProvisioningError> {
        self.calls
            .lock()
            .unwrap()
            .push((role, bearer_token.to_string(), record.clone()));
        if *self.fail.lock().unwrap() {
            return Err(ProvisioningError::Rejected {
                service: ProfileService::for_role(role),
                status: 503,
            });
        }
        Ok(())
    }
}

pub(crate) fn orchestrator(
    provider: &Arc<FakeProvider>,
    provisioner: &Arc<FakeProvisioner>,
) -> AuthOrchestrator {
    AuthOrchestrator::new(
        provider.clone(),
        provisioner.clone(),
        RoleResolver::default(),
        FrontendClientConfig::default(),
    )
}
