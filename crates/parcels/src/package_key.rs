//! One-way hash of the delivery credential.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use parcelhub_core::{DomainError, DomainResult};

/// Lowercase hex SHA-256 of a package key. The clear key is never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PackageKeyHash(String);

impl PackageKeyHash {
    pub fn from_key(key: &str) -> Self {
        Self(hex::encode(Sha256::digest(key.as_bytes())))
    }

    /// Rehydrate a stored hash.
    pub fn from_hex(value: &str) -> DomainResult<Self> {
        let value = value.trim().to_ascii_lowercase();
        let valid = value.len() == 64 && hex::decode(&value).is_ok();
        if !valid {
            return Err(DomainError::validation("package key hash must be 64 hex characters"));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn verify(&self, key: &str) -> bool {
        Self::from_key(key) == *self
    }

    /// Resolve the hash to store for a new parcel under the tenant's policy.
    ///
    /// With the requirement on, both values must be present and equal. With it
    /// off, an empty pair stores no hash, but a supplied key still has to be
    /// confirmed.
    pub fn for_creation(key: &str, confirm: &str, required: bool) -> DomainResult<Option<Self>> {
        let key_blank = key.trim().is_empty();
        let confirm_blank = confirm.trim().is_empty();

        if required && (key_blank || confirm_blank) {
            return Err(DomainError::validation(
                "package_key and package_key_confirm are required",
            ));
        }
        if !required && key_blank && confirm_blank {
            return Ok(None);
        }
        if key != confirm {
            return Err(DomainError::validation(
                "package_key and package_key_confirm do not match",
            ));
        }
        Ok(Some(Self::from_key(key)))
    }
}
