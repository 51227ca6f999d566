//! Application roles and role resolution.
//!
//! A user holds exactly one [`ApplicationRole`] in the eyes of the gateway,
//! even when the provider briefly lists several realm roles (for example in
//! the middle of a role change). [`RoleResolver`] collapses any set of realm
//! role names to one role with a fixed priority order.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::claims::AccessTokenClaims;

/// The closed set of roles the application understands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApplicationRole {
    /// Patient (default role).
    #[default]
    Patient,
    /// Doctor.
    Medecin,
    /// Facility manager ("gestionnaire").
    Manager,
    /// Platform administrator.
    Admin,
    /// Security officer ("responsable sécurité").
    SecurityOfficer,
}

impl ApplicationRole {
    /// Roles in resolution priority order, highest first.
    pub const PRIORITY: [Self; 5] = [
        Self::Admin,
        Self::Medecin,
        Self::Manager,
        Self::SecurityOfficer,
        Self::Patient,
    ];

    /// Canonical role name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Patient => "PATIENT",
            Self::Medecin => "MEDECIN",
            Self::Manager => "MANAGER",
            Self::Admin => "ADMIN",
            Self::SecurityOfficer => "SECURITY_OFFICER",
        }
    }

    /// Names recognised for this role, canonical name first.
    #[must_use]
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            Self::Patient => &["PATIENT"],
            Self::Medecin => &["MEDECIN"],
            Self::Manager => &["MANAGER", "GESTIONNAIRE"],
            Self::Admin => &["ADMIN"],
            Self::SecurityOfficer => &["SECURITY_OFFICER", "RESPONSABLE_SECURITE"],
        }
    }

    /// Realm role name without the provider prefix.
    ///
    /// The realm keeps the French names for the manager and security roles.
    #[must_use]
    pub fn realm_name(self) -> &'static str {
        match self {
            Self::Patient => "PATIENT",
            Self::Medecin => "MEDECIN",
            Self::Manager => "GESTIONNAIRE",
            Self::Admin => "ADMIN",
            Self::SecurityOfficer => "RESPONSABLE_SECURITE",
        }
    }

    /// Whether the role may be chosen on the public registration form.
    #[must_use]
    pub fn is_self_assignable(self) -> bool {
        matches!(self, Self::Patient | Self::Medecin | Self::Manager)
    }

    /// Parses a role name or alias, ignoring ASCII case and surrounding blanks.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::PRIORITY.into_iter().find(|role| {
            role.aliases()
                .iter()
                .any(|alias| alias.eq_ignore_ascii_case(name))
        })
    }
}

impl fmt::Display for ApplicationRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string is not an application role.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown application role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for ApplicationRole {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| UnknownRole(s.to_string()))
    }
}

/// Maps application roles to provider realm role names and back.
#[derive(Debug, Clone)]
pub struct RoleNaming {
    prefix: String,
}

impl RoleNaming {
    /// Creates a naming scheme with the given provider role prefix (e.g. `ROLE_`).
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Provider realm role name for an application role.
    #[must_use]
    pub fn provider_name(&self, role: ApplicationRole) -> String {
        format!("{}{}", self.prefix, role.realm_name())
    }

    /// Recognises a realm role name, with or without the provider prefix.
    #[must_use]
    pub fn recognise(&self, name: &str) -> Option<ApplicationRole> {
        let name = name.trim();
        if !self.prefix.is_empty()
            && name.len() > self.prefix.len()
            && name.is_char_boundary(self.prefix.len())
            && name[..self.prefix.len()].eq_ignore_ascii_case(&self.prefix)
        {
            if let Some(role) = ApplicationRole::parse(&name[self.prefix.len()..]) {
                return Some(role);
            }
        }
        ApplicationRole::parse(name)
    }
}

impl Default for RoleNaming {
    fn default() -> Self {
        Self::new("ROLE_")
    }
}

/// Collapses realm role names to a single application role.
#[derive(Debug, Clone, Default)]
pub struct RoleResolver {
    naming: RoleNaming,
}

impl RoleResolver {
    /// Creates a resolver using `naming` to recognise provider role names.
    #[must_use]
    pub fn new(naming: RoleNaming) -> Self {
        Self { naming }
    }

    /// Returns the naming scheme.
    #[must_use]
    pub fn naming(&self) -> &RoleNaming {
        &self.naming
    }

    /// Returns the highest-priority role among `names`, or `PATIENT`.
    pub fn resolve_names<I, S>(&self, names: I) -> ApplicationRole
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let held: Vec<ApplicationRole> = names
            .into_iter()
            .filter_map(|name| self.naming.recognise(name.as_ref()))
            .collect();

        ApplicationRole::PRIORITY
            .into_iter()
            .find(|role| held.contains(role))
            .unwrap_or_default()
    }

    /// Resolves the role carried by decoded claims.
    #[must_use]
    pub fn resolve_claims(&self, claims: &AccessTokenClaims) -> ApplicationRole {
        self.resolve_names(&claims.realm_roles)
    }
}
