//! Backend profile provisioning.
//!
//! At registration the gateway asks one of the backend services to create the
//! domain profile for the new user, keyed by its [`NumericIdentityId`]:
//!
//! | Role | Service | Path |
//! |------|---------|------|
//! | `MEDECIN` | medecin | `/api/medecins` |
//! | `MANAGER` | gestion | `/api/gestionnaires` |
//! | any other | patient | `/api/patients` |
//!
//! The call carries the admin bearer token. Whether the services check the
//! scope of that token is up to them.

use std::fmt;

use async_trait::async_trait;
use serde::Serialize;

use crate::config::ServicesConfig;
use crate::numeric_id::NumericIdentityId;
use crate::role::ApplicationRole;

/// Postal address of a profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    /// Street.
    pub rue: String,
    /// City.
    pub ville: String,
    /// Postal code.
    pub code_postal: String,
    /// Country.
    pub pays: String,
}

/// Nested profile data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProfileDetails {
    /// Postal address.
    pub adresse: Address,
}

/// Profile creation request sent to a backend service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRecord {
    /// Numeric id derived from the provider user id.
    pub user_id: NumericIdentityId,

    /// Family name.
    pub nom: String,

    /// Given name.
    pub prenom: String,

    /// Email address.
    pub email: String,

    /// Address and other nested data.
    pub profile: ProfileDetails,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_naissance: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub telephone: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub emergency_contact: Option<String>,

    /// Opaque provider user id, for services that keep both.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keycloak_user_id: Option<String>,
}

/// Backend service a profile is created in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileService {
    /// Patient service.
    Patient,
    /// Medecin service.
    Medecin,
    /// Gestion (manager) service.
    Gestion,
}

impl ProfileService {
    /// Selects the service for a role.
    #[must_use]
    pub fn for_role(role: ApplicationRole) -> Self {
        match role {
            ApplicationRole::Medecin => Self::Medecin,
            ApplicationRole::Manager => Self::Gestion,
            _ => Self::Patient,
        }
    }

    /// Collection path of the profile creation endpoint.
    #[must_use]
    pub fn path(self) -> &'static str {
        match self {
            Self::Patient => "/api/patients",
            Self::Medecin => "/api/medecins",
            Self::Gestion => "/api/gestionnaires",
        }
    }

    fn base_url(self, services: &ServicesConfig) -> &str {
        match self {
            Self::Patient => &services.patient_url,
            Self::Medecin => &services.medecin_url,
            Self::Gestion => &services.gestion_url,
        }
    }
}

impl fmt::Display for ProfileService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Patient => "patient",
            Self::Medecin => "medecin",
            Self::Gestion => "gestion",
        })
    }
}

/// Profile creation failures.
#[derive(Debug, thiserror::Error)]
pub enum ProvisioningError {
    /// The service could not be reached.
    #[error("{service} service unreachable: {source}")]
    Unreachable {
        /// Target service.
        service: ProfileService,
        /// Transport error.
        #[source]
        source: reqwest::Error,
    },

    /// The service answered with a non-2xx status.
    #[error("{service} service returned HTTP {status}")]
    Rejected {
        /// Target service.
        service: ProfileService,
        /// HTTP status.
        status: u16,
    },
}

/// Creates domain profiles in the backend services.
#[async_trait]
pub trait ProfileProvisioner: Send + Sync {
    /// Creates the profile of a freshly registered user.
    async fn create_profile(
        &self,
        role: ApplicationRole,
        bearer_token: &str,
        record: &ProfileRecord,
    ) -> Result<(), ProvisioningError>;
}

/// [`ProfileProvisioner`] posting JSON to the configured services.
#[derive(Debug, Clone)]
pub struct HttpProfileProvisioner {
    http: reqwest::Client,
    services: ServicesConfig,
}

impl HttpProfileProvisioner {
    /// Creates a provisioner for the given services.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(services: ServicesConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(services.request_timeout())
            .build()?;
        Ok(Self { http, services })
    }

    /// Full URL of the profile endpoint for a role.
    #[must_use]
    pub fn endpoint(&self, role: ApplicationRole) -> String {
        let service = ProfileService::for_role(role);
        format!(
            "{}{}",
            service.base_url(&self.services).trim_end_matches('/'),
            service.path()
        )
    }
}

#[async_trait]
impl ProfileProvisioner for HttpProfileProvisioner {
    async fn create_profile(
        &self,
        role: ApplicationRole,
        bearer_token: &str,
        record: &ProfileRecord,
    ) -> Result<(), ProvisioningError> {
        let service = ProfileService::for_role(role);
        let url = self.endpoint(role);

        let response = self
            .http
            .post(&url)
            .bearer_auth(bearer_token)
            .json(record)
            .send()
            .await
            .map_err(|source| ProvisioningError::Unreachable { service, source })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProvisioningError::Rejected {
                service,
                status: status.as_u16(),
            });
        }

        tracing::debug!(%service, user_id = %record.user_id, "Profile created");
        Ok(())
    }
}
