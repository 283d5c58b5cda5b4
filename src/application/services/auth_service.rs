//! Bearer token verification for owner identity.

use hmac::{Hmac, Mac};
use serde_json::json;
use sha2::Sha256;

use crate::domain::entities::OwnerId;
use crate::error::AppError;

type HmacSha256 = Hmac<Sha256>;

/// Verifies owner tokens minted by the identity provider.
///
/// A token has the form `<owner_id>.<mac>`, where `mac` is the lowercase hex
/// HMAC-SHA256 of `owner_id` keyed by `signing_secret`. Nothing is stored:
/// any holder of the secret can mint tokens, and verification is a pure
/// function of the token and the secret.
pub struct AuthService {
    signing_secret: String,
}

impl AuthService {
    /// Creates a new authentication service.
    ///
    /// `signing_secret` must match the value the identity provider signs with.
    pub fn new(signing_secret: String) -> Self {
        Self { signing_secret }
    }

    fn mac(&self) -> Result<HmacSha256, AppError> {
        HmacSha256::new_from_slice(self.signing_secret.as_bytes()).map_err(|e| {
            AppError::internal("Invalid signing key", json!({ "reason": e.to_string() }))
        })
    }

    /// Mints a token for `owner_id`.
    ///
    /// Used by operator tooling and tests; the HTTP surface never issues tokens.
    pub fn sign(&self, owner_id: &OwnerId) -> Result<String, AppError> {
        let mut mac = self.mac()?;
        mac.update(owner_id.as_str().as_bytes());
        Ok(format!(
            "{}.{}",
            owner_id,
            hex::encode(mac.finalize().into_bytes())
        ))
    }

    /// Verifies `token` and returns the owner it was minted for.
    ///
    /// The MAC comparison is constant time.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Unauthorized`] if the token is malformed or its MAC
    /// does not match.
    pub fn authenticate(&self, token: &str) -> Result<OwnerId, AppError> {
        let invalid = || {
            AppError::unauthorized("Unauthorized", json!({ "reason": "Invalid token" }))
        };

        let (owner, signature) = token.trim().rsplit_once('.').ok_or_else(invalid)?;
        if owner.is_empty() {
            return Err(invalid());
        }

        let signature = hex::decode(signature).map_err(|_| invalid())?;

        let mut mac = self.mac()?;
        mac.update(owner.as_bytes());
        mac.verify_slice(&signature).map_err(|_| invalid())?;

        Ok(OwnerId::new(owner))
    }
}
