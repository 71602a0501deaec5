//! Identity resolution for roadmap ownership.
//!
//! Callers authenticate with `Authorization: Bearer <token>`. Tokens are
//! never stored in the clear: the SHA-256 hex digest is what the `owners`
//! table keeps, and resolution is a digest lookup. A missing or malformed
//! header is an authentication failure; a well-formed token with no
//! matching owner record is reported as not-found, mirroring how a
//! missing user record behaves elsewhere in the API.

use std::sync::Arc;

use anyhow::Result;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::error::ServiceError;
use crate::storage::{OwnerRow, Storage};

/// Resolves a request's bearer credential to the owning identity.
#[derive(Clone)]
pub struct Resolver {
    storage: Arc<Storage>,
}

impl Resolver {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }

    /// Resolve the raw `Authorization` header value to an owner record.
    pub async fn resolve(&self, authorization: Option<&str>) -> Result<OwnerRow, ServiceError> {
        let token = authorization
            .and_then(bearer_token)
            .ok_or(ServiceError::Authentication)?;
        self.storage
            .get_owner_by_token_hash(&token_digest(token))
            .await
            .map_err(ServiceError::Persistence)?
            .ok_or_else(|| ServiceError::NotFound("Owner not found".to_string()))
    }
}

/// Extract the token from a `Bearer <token>` header value.
/// Returns `None` for any other scheme or an empty token.
fn bearer_token(header_value: &str) -> Option<&str> {
    header_value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// SHA-256 hex digest of an access token, as stored in `owners.token_hash`.
pub fn token_digest(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Create an owner record and issue its access token.
///
/// The plaintext token is returned exactly once — only its digest is
/// persisted, so it cannot be recovered later.
pub async fn provision_owner(
    storage: &Storage,
    name: &str,
    email: &str,
) -> Result<(OwnerRow, String)> {
    let id = Uuid::new_v4().to_string();
    // UUID v4 hex without dashes = 32-char token.
    let token = Uuid::new_v4().to_string().replace('-', "");
    let owner = storage
        .create_owner(&id, name, email, &token_digest(&token))
        .await?;
    Ok((owner, token))
}
