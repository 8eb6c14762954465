//! Constants for the `.capsule` file format and storage layout.

/// Magic bytes identifying an encrypted capsule file.
pub const CAPSULE_MAGIC: [u8; 4] = *b"TCAP";

/// Current `.capsule` format version.
pub const CAPSULE_VERSION: u16 = 1;

/// Fixed header size for `.capsule`.
pub const CAPSULE_HEADER_SIZE: usize = 64;

/// Extension of encrypted capsule files.
pub const CAPSULE_EXTENSION: &str = "capsule";

/// Reserved archive entry carrying the serialized metadata.
pub const METADATA_ENTRY: &str = "metadata.json";

/// Day-month-year format used for every date a user sees or types.
pub const DATE_FORMAT: &str = "%d-%m-%Y";

/// Key derivation identifiers.
pub const KDF_RAW_KEY: u8 = 0;
pub const KDF_ARGON2ID: u8 = 1;

/// Cipher algorithm identifiers.
pub const CIPHER_AES_256_GCM: u8 = 1;

/// Cryptographic parameter sizes.
pub const SALT_SIZE: usize = 32;
pub const NONCE_SIZE: usize = 12;
pub const TAG_SIZE: usize = 16;
pub const KEY_SIZE: usize = 32;

/// Argon2id parameters (OWASP 2024 recommendations).
pub const ARGON2_MEMORY_KIB: u32 = 64 * 1024; // 64 MiB
pub const ARGON2_ITERATIONS: u32 = 3;
pub const ARGON2_PARALLELISM: u32 = 4;

/// Longest title kept when deriving file names.
pub const MAX_TITLE_CHARS: usize = 100;
