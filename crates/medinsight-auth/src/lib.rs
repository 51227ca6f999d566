//! # medinsight-auth
//!
//! Credential exchange and role resolution for the MedInsight gateway.
//!
//! This crate provides:
//! - A client for a Keycloak-compatible identity provider
//! - Application role resolution from realm-role claims
//! - Numeric identity ids for backend services keyed by integers
//! - Profile provisioning against the backend profile services
//! - The orchestration of login, registration and admin user flows
//! - Axum handlers exposing those flows as JSON endpoints
//!
//! ## Modules
//!
//! - [`config`] - Identity provider and backend service configuration
//! - [`idp`] - Identity provider client and wire types
//! - [`claims`] - Access token claim decoding
//! - [`role`] - Application roles and role resolution
//! - [`numeric_id`] - Numeric identity id derivation
//! - [`provisioning`] - Backend profile provisioning
//! - [`orchestrator`] - Login, registration and admin flows
//! - [`http`] - Axum HTTP handlers

pub mod claims;
pub mod config;
pub mod error;
pub mod http;
pub mod idp;
pub mod numeric_id;
pub mod orchestrator;
pub mod provisioning;
pub mod role;

pub use config::{ConfigError, IdentityConfig, ProviderConfig, ServicesConfig};
pub use error::AuthError;
pub use http::{AuthState, auth_routes};
pub use idp::{IdentityProvider, IdpError, KeycloakClient};
pub use numeric_id::{NumericIdentityId, to_numeric_id};
pub use orchestrator::{AuthOrchestrator, Degradation, Outcome};
pub use provisioning::{HttpProfileProvisioner, ProfileProvisioner, ProvisioningError};
pub use role::{ApplicationRole, RoleNaming, RoleResolver};

/// Type alias for orchestration results.
pub type AuthResult<T> = Result<T, AuthError>;
