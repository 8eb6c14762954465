use crate::constants::{
    CAPSULE_HEADER_SIZE, CAPSULE_MAGIC, CAPSULE_VERSION, CIPHER_AES_256_GCM, KDF_ARGON2ID,
    KDF_RAW_KEY, NONCE_SIZE, SALT_SIZE,
};
use crate::error::CapsuleError;

/// Capsule file header (fixed-size, 64 bytes).
///
/// The encoded header doubles as associated data for the cipher, so any edit
/// to it is caught by the authentication tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapsuleHeader {
    pub magic: [u8; 4],
    pub version: u16,
    pub kdf: KdfAlgorithm,
    pub cipher: CipherAlgorithm,
    pub salt: [u8; SALT_SIZE],
    pub nonce: [u8; NONCE_SIZE],
    pub archive_size: u64,
    pub reserved: [u8; 4],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum KdfAlgorithm {
    /// 32-byte key read from a key file, used as-is.
    RawKey = KDF_RAW_KEY,
    /// Key stretched from a passphrase with the header's salt.
    Argon2id = KDF_ARGON2ID,
}

impl KdfAlgorithm {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            KdfAlgorithm::RawKey => "key-file",
            KdfAlgorithm::Argon2id => "passphrase",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CipherAlgorithm {
    Aes256Gcm = CIPHER_AES_256_GCM,
}

impl CapsuleHeader {
    pub const SIZE: usize = CAPSULE_HEADER_SIZE;

    #[must_use]
    pub fn new(
        kdf: KdfAlgorithm,
        salt: [u8; SALT_SIZE],
        nonce: [u8; NONCE_SIZE],
        archive_size: u64,
    ) -> Self {
        Self {
            magic: CAPSULE_MAGIC,
            version: CAPSULE_VERSION,
            kdf,
            cipher: CipherAlgorithm::Aes256Gcm,
            salt,
            nonce,
            archive_size,
            reserved: [0u8; 4],
        }
    }

    #[must_use]
    pub fn encode(&self) -> [u8; Self::SIZE] {
        let mut out = [0u8; Self::SIZE];
        let fields: [&[u8]; 8] = [
            &self.magic,
            &self.version.to_le_bytes(),
            &[self.kdf as u8],
            &[self.cipher as u8],
            &self.salt,
            &self.nonce,
            &self.archive_size.to_le_bytes(),
            &self.reserved,
        ];
        let mut at = 0;
        for field in fields {
            out[at..at + field.len()].copy_from_slice(field);
            at += field.len();
        }
        out
    }

    pub fn decode(bytes: &[u8; Self::SIZE]) -> Result<Self, CapsuleError> {
        let mut fields = Fields(bytes);

        let magic: [u8; 4] = fields.take()?;
        if magic != CAPSULE_MAGIC {
            return Err(CapsuleError::format(format!(
                "invalid magic header: expected {CAPSULE_MAGIC:?}, found {magic:?}"
            )));
        }

        let version = u16::from_le_bytes(fields.take()?);
        if version != CAPSULE_VERSION {
            return Err(CapsuleError::format(format!(
                "unsupported format version {version}"
            )));
        }

        let kdf = match fields.take::<1>()?[0] {
            KDF_RAW_KEY => KdfAlgorithm::RawKey,
            KDF_ARGON2ID => KdfAlgorithm::Argon2id,
            other => {
                return Err(CapsuleError::format(format!(
                    "unsupported key derivation id {other}"
                )));
            }
        };

        let cipher = match fields.take::<1>()?[0] {
            CIPHER_AES_256_GCM => CipherAlgorithm::Aes256Gcm,
            other => {
                return Err(CapsuleError::format(format!(
                    "unsupported cipher id {other}"
                )));
            }
        };

        Ok(Self {
            magic,
            version,
            kdf,
            cipher,
            salt: fields.take()?,
            nonce: fields.take()?,
            archive_size: u64::from_le_bytes(fields.take()?),
            reserved: fields.take()?,
        })
    }

    /// Split a capsule file into its decoded header and the ciphertext body.
    pub fn split(bytes: &[u8]) -> Result<(Self, &[u8]), CapsuleError> {
        if bytes.len() < Self::SIZE {
            return Err(CapsuleError::format(format!(
                "file is {} bytes, shorter than the {}-byte header",
                bytes.len(),
                Self::SIZE
            )));
        }
        let (head, body) = bytes.split_at(Self::SIZE);
        let head: [u8; Self::SIZE] = Fields(head).take()?;
        Ok((Self::decode(&head)?, body))
    }
}

/// Reads fixed-width header fields front to back.
struct Fields<'a>(&'a [u8]);

impl Fields<'_> {
    fn take<const N: usize>(&mut self) -> Result<[u8; N], CapsuleError> {
        let (field, rest) = self
            .0
            .split_first_chunk::<N>()
            .ok_or_else(|| CapsuleError::format("header ends mid-field"))?;
        self.0 = rest;
        Ok(*field)
    }
}
