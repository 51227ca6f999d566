//! Access token claim decoding.
//!
//! The payload segment is decoded **without verifying the signature**. This is
//! only sound for tokens this process has just received from the provider's
//! token endpoint. A token arriving from anywhere else must be verified
//! against the provider's published keys before its claims are trusted.

use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::Deserialize;

/// Claims the gateway reads from an access token.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessTokenClaims {
    /// Stable subject identifier.
    pub sub: Option<String>,

    /// Realm roles from `realm_access.roles`.
    pub realm_roles: Vec<String>,

    /// `preferred_username` claim.
    pub preferred_username: Option<String>,

    /// `email` claim.
    pub email: Option<String>,
}

/// Error decoding a token payload.
#[derive(Debug, thiserror::Error)]
#[error("Invalid access token: {0}")]
pub struct ClaimsError(#[from] jsonwebtoken::errors::Error);

#[derive(Clone, Deserialize)]
struct RawClaims {
    #[serde(default)]
    sub: Option<String>,
    #[serde(default)]
    preferred_username: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    realm_access: Option<RealmAccess>,
}

#[derive(Clone, Deserialize)]
struct RealmAccess {
    #[serde(default)]
    roles: Vec<String>,
}

/// Decodes the payload of a JWT without checking its signature.
///
/// Expiry, audience and the other registered claims are not checked either.
///
/// # Errors
///
/// Returns a [`ClaimsError`] if the token is not a well-formed JWT or its
/// payload is not a JSON claims object.
pub fn decode_unverified(token: &str) -> Result<AccessTokenClaims, ClaimsError> {
    let header = jsonwebtoken::decode_header(token)?;

    let mut validation = Validation::new(header.alg);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    let key = unchecked_key(header.alg)?;
    let raw = jsonwebtoken::decode::<RawClaims>(token, &key, &validation)?.claims;

    Ok(AccessTokenClaims {
        sub: raw.sub,
        realm_roles: raw.realm_access.map(|ra| ra.roles).unwrap_or_default(),
        preferred_username: raw.preferred_username,
        email: raw.email,
    })
}

/// Key of the family `alg` expects. It is never used to verify anything.
fn unchecked_key(alg: Algorithm) -> Result<DecodingKey, ClaimsError> {
    let key = match alg {
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => DecodingKey::from_secret(&[]),
        Algorithm::ES256 | Algorithm::ES384 => DecodingKey::from_ec_components("AA", "AA")?,
        Algorithm::EdDSA => DecodingKey::from_ed_components("AA")?,
        _ => DecodingKey::from_rsa_components("AQAB", "AQAB")?,
    };
    Ok(key)
}

#[cfg(test)]
pub(crate) mod test_support {
    use jsonwebtoken::{EncodingKey, Header};

    /// Builds an HS256 JWT carrying `payload`, signed with a throwaway key.
    pub fn jwt(payload: &serde_json::Value) -> String {
        jsonwebtoken::encode(&Header::default(), payload, &EncodingKey::from_secret(b"test"))
            .unwrap()
    }
}
