//! Numeric identity ids.
//!
//! The backend profile services key users by integer. The id is derived from
//! the provider's opaque subject with a base-31 rolling hash over UTF-16 code
//! units, wrapping to 32 bits at every step. Collisions are possible and are
//! not detected.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Non-negative numeric stand-in for a provider subject.
///
/// Carried as `i64` so the absolute value of `i32::MIN` is representable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NumericIdentityId(i64);

impl NumericIdentityId {
    /// Returns the raw value.
    #[must_use]
    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for NumericIdentityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<NumericIdentityId> for i64 {
    fn from(id: NumericIdentityId) -> Self {
        id.0
    }
}

/// Derives the numeric id of a subject. Pure and deterministic.
#[must_use]
pub fn to_numeric_id(sub: &str) -> NumericIdentityId {
    let hash = sub.encode_utf16().fold(0i32, |hash, unit| {
        hash.wrapping_shl(5)
            .wrapping_sub(hash)
            .wrapping_add(i32::from(unit))
    });
    NumericIdentityId(i64::from(hash).abs())
}
