//! Capsule secrets and their on-disk lifecycle.
//!
//! A capsule is sealed either with a 32-byte key kept in a key file or with a
//! passphrase stretched through Argon2id. Key files hold a single line of
//! URL-safe base64. Nothing here is process-global: callers load or generate
//! a key and hand it to [`crate::TimeCapsule`] explicitly.

use std::fmt;
use std::path::Path;

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE;
use rand::RngCore;
use rand::rngs::OsRng;
use zeroize::{Zeroize, Zeroizing};

use crate::constants::KEY_SIZE;
use crate::error::{CapsuleError, Result};
use crate::header::KdfAlgorithm;
use crate::io::write_atomic;

/// Symmetric key for raw-key capsules. Zeroized on drop.
#[derive(Clone, PartialEq, Eq)]
pub struct CapsuleKey {
    bytes: [u8; KEY_SIZE],
}

impl CapsuleKey {
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_SIZE];
        OsRng.fill_bytes(&mut bytes);
        Self { bytes }
    }

    #[must_use]
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self { bytes }
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }

    /// Short, non-reversible identifier for telling keys apart.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        let hash = blake3::hash(&self.bytes);
        hex::encode(&hash.as_bytes()[..8])
    }

    #[must_use]
    pub fn to_base64(&self) -> Zeroizing<String> {
        Zeroizing::new(URL_SAFE.encode(self.bytes))
    }

    pub fn from_base64(encoded: &str) -> std::result::Result<Self, String> {
        let decoded = Zeroizing::new(
            URL_SAFE
                .decode(encoded.trim())
                .map_err(|e| format!("not valid base64: {e}"))?,
        );
        if decoded.len() != KEY_SIZE {
            return Err(format!(
                "expected {KEY_SIZE} key bytes, found {}",
                decoded.len()
            ));
        }
        let mut bytes = [0u8; KEY_SIZE];
        bytes.copy_from_slice(&decoded);
        Ok(Self { bytes })
    }

    /// Load a key previously written by [`CapsuleKey::save`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = Zeroizing::new(std::fs::read_to_string(path).map_err(|e| {
            CapsuleError::KeyFile {
                path: path.to_path_buf(),
                reason: e.to_string(),
            }
        })?);
        Self::from_base64(&text).map_err(|reason| CapsuleError::KeyFile {
            path: path.to_path_buf(),
            reason,
        })
    }

    /// Write the key to `path`. Refuses to replace an existing file so a key
    /// that still guards capsules is never lost.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if path.exists() {
            return Err(CapsuleError::KeyFile {
                path: path.to_path_buf(),
                reason: "refusing to overwrite existing key file".to_string(),
            });
        }
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(CapsuleError::io(parent))?;
        }
        let encoded = self.to_base64();
        write_atomic(path, &[encoded.as_bytes(), b"\n".as_slice()])?;
        restrict_permissions(path)?;
        tracing::debug!(path = %path.display(), fingerprint = %self.fingerprint(), "saved capsule key");
        Ok(())
    }

    /// Load the key at `path`, or generate and save one if the file is absent.
    ///
    /// Returns the key and whether it was freshly generated.
    pub fn load_or_generate(path: impl AsRef<Path>) -> Result<(Self, bool)> {
        let path = path.as_ref();
        if path.exists() {
            return Ok((Self::load(path)?, false));
        }
        let key = Self::generate();
        key.save(path)?;
        Ok((key, true))
    }
}

impl Drop for CapsuleKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl fmt::Debug for CapsuleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapsuleKey")
            .field("fingerprint", &self.fingerprint())
            .finish()
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
        .map_err(CapsuleError::io(path))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<()> {
    Ok(())
}

/// The secret a capsule is sealed with.
#[derive(Clone)]
pub enum Secret {
    Key(CapsuleKey),
    Passphrase(Zeroizing<Vec<u8>>),
}

impl Secret {
    #[must_use]
    pub fn passphrase(value: impl Into<String>) -> Self {
        Secret::Passphrase(Zeroizing::new(value.into().into_bytes()))
    }

    #[must_use]
    pub fn kdf(&self) -> KdfAlgorithm {
        match self {
            Secret::Key(_) => KdfAlgorithm::RawKey,
            Secret::Passphrase(_) => KdfAlgorithm::Argon2id,
        }
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Secret::Key(key) => f.debug_tuple("Key").field(key).finish(),
            Secret::Passphrase(_) => f.write_str("Passphrase(..)"),
        }
    }
}

impl From<CapsuleKey> for Secret {
    fn from(key: CapsuleKey) -> Self {
        Secret::Key(key)
    }
}
