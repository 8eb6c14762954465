use aes_gcm::aead::{Aead, Payload};
use aes_gcm::{Aes256Gcm, KeyInit, Nonce};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::RngCore;
use rand::rngs::OsRng;
use zeroize::Zeroize;

use crate::constants::{
    ARGON2_ITERATIONS, ARGON2_MEMORY_KIB, ARGON2_PARALLELISM, KEY_SIZE, NONCE_SIZE, SALT_SIZE,
};
use crate::error::CapsuleError;
use crate::header::{CapsuleHeader, KdfAlgorithm};
use crate::key::Secret;

pub fn derive_key(
    password: &[u8],
    salt: &[u8; SALT_SIZE],
) -> Result<[u8; KEY_SIZE], CapsuleError> {
    let params = Params::new(
        ARGON2_MEMORY_KIB,
        ARGON2_ITERATIONS,
        ARGON2_PARALLELISM,
        Some(KEY_SIZE),
    )
    .map_err(|e| CapsuleError::KeyDerivation {
        reason: e.to_string(),
    })?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let mut key = [0u8; KEY_SIZE];
    argon2
        .hash_password_into(password, salt, &mut key)
        .map_err(|e| CapsuleError::KeyDerivation {
            reason: e.to_string(),
        })?;

    Ok(key)
}

pub fn encrypt(
    plaintext: &[u8],
    aad: &[u8],
    key: &[u8; KEY_SIZE],
    nonce: &[u8; NONCE_SIZE],
) -> Result<Vec<u8>, CapsuleError> {
    let cipher = Aes256Gcm::new_from_slice(key).map_err(|e| CapsuleError::Encryption {
        reason: e.to_string(),
    })?;
    cipher
        .encrypt(
            Nonce::from_slice(nonce),
            Payload {
                msg: plaintext,
                aad,
            },
        )
        .map_err(|e| CapsuleError::Encryption {
            reason: e.to_string(),
        })
}

pub fn decrypt(
    ciphertext: &[u8],
    aad: &[u8],
    key: &[u8; KEY_SIZE],
    nonce: &[u8; NONCE_SIZE],
) -> Result<Vec<u8>, CapsuleError> {
    let cipher = Aes256Gcm::new_from_slice(key).map_err(|e| CapsuleError::DecryptionFailed {
        reason: e.to_string(),
    })?;
    cipher
        .decrypt(
            Nonce::from_slice(nonce),
            Payload {
                msg: ciphertext,
                aad,
            },
        )
        .map_err(|_| CapsuleError::DecryptionFailed {
            reason: "authentication tag mismatch".to_string(),
        })
}

fn key_for(secret: &Secret, salt: &[u8; SALT_SIZE]) -> Result<[u8; KEY_SIZE], CapsuleError> {
    match secret {
        Secret::Key(key) => Ok(*key.as_bytes()),
        Secret::Passphrase(passphrase) => derive_key(passphrase, salt),
    }
}

/// Encrypt an archive into the full capsule byte layout: `[header][ciphertext]`.
pub fn seal(secret: &Secret, archive: &[u8]) -> Result<Vec<u8>, CapsuleError> {
    let mut salt = [0u8; SALT_SIZE];
    let mut nonce = [0u8; NONCE_SIZE];
    let kdf = secret.kdf();
    if kdf == KdfAlgorithm::Argon2id {
        OsRng.fill_bytes(&mut salt);
    }
    OsRng.fill_bytes(&mut nonce);

    let header = CapsuleHeader::new(kdf, salt, nonce, archive.len() as u64);
    let header_bytes = header.encode();

    let mut key = key_for(secret, &salt)?;
    let ciphertext = encrypt(archive, &header_bytes, &key, &nonce);
    key.zeroize();
    let ciphertext = ciphertext?;

    let mut out = Vec::with_capacity(CapsuleHeader::SIZE + ciphertext.len());
    out.extend_from_slice(&header_bytes);
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

/// Decrypt a capsule produced by [`seal`], returning its header and archive bytes.
pub fn unseal(secret: &Secret, bytes: &[u8]) -> Result<(CapsuleHeader, Vec<u8>), CapsuleError> {
    // a header that no longer parses is a damaged capsule, same as a bad tag
    let (header, ciphertext) =
        CapsuleHeader::split(bytes).map_err(|err| CapsuleError::DecryptionFailed {
            reason: match err {
                CapsuleError::InvalidCapsuleFormat { reason } => reason,
                other => other.to_string(),
            },
        })?;

    if header.kdf != secret.kdf() {
        return Err(CapsuleError::DecryptionFailed {
            reason: format!(
                "capsule was sealed with a {}, not a {}",
                header.kdf.label(),
                secret.kdf().label()
            ),
        });
    }

    let header_bytes = header.encode();
    let mut key = key_for(secret, &header.salt)?;
    let plaintext = decrypt(ciphertext, &header_bytes, &key, &header.nonce);
    key.zeroize();
    let plaintext = plaintext?;

    if plaintext.len() as u64 != header.archive_size {
        return Err(CapsuleError::format(format!(
            "size mismatch: expected {} bytes, got {}",
            header.archive_size,
            plaintext.len()
        )));
    }

    Ok((header, plaintext))
}
