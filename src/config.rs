//! Runtime settings resolved from flags, environment and `config.json`.
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `TIMECAPSULE_HOME` | Storage root for capsules and extractions | `./time_capsules` |
//! | `TIMECAPSULE_KEY_FILE` | Key file sealing and opening capsules | `<home>/capsule.key` |
//! | `RUST_LOG` | Log filter (overrides `-v`) | `warn` |

use std::path::{Path, PathBuf};

use capsule_core::{CapsuleKey, Secret, TimeCapsule};

use crate::cli::Cli;
use crate::config_file::{FileConfig, config_file_path, load_file_config};
use crate::util::env_optional;

pub(crate) const DEFAULT_HOME_DIR: &str = "./time_capsules";
pub(crate) const DEFAULT_KEY_FILE: &str = "capsule.key";
pub(crate) const HOME_ENV: &str = "TIMECAPSULE_HOME";
pub(crate) const KEY_FILE_ENV: &str = "TIMECAPSULE_KEY_FILE";

/// Whether a missing key file may be created on the spot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum KeyAccess {
    /// Sealing: generate and save a key the first time one is needed.
    CreateIfMissing,
    /// Opening: a fresh key could never decrypt an existing capsule.
    MustExist,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Settings {
    pub(crate) home: PathBuf,
    pub(crate) key_file: PathBuf,
    pub(crate) passphrase_env: Option<String>,
    pub(crate) strict_attachments: bool,
}

pub(crate) fn resolve_home(cli: Option<PathBuf>, env_home: Option<String>) -> PathBuf {
    if let Some(path) = cli {
        return path;
    }
    if let Some(value) = env_home {
        return PathBuf::from(value);
    }
    PathBuf::from(DEFAULT_HOME_DIR)
}

fn resolve_against(home: &Path, path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        home.join(path)
    }
}

impl Settings {
    pub(crate) fn from_cli(cli: &Cli) -> Result<Self, Box<dyn std::error::Error>> {
        let home = resolve_home(cli.home.clone(), env_optional(HOME_ENV));
        let file = load_file_config(&config_file_path(&home))?;
        Ok(Self::merge(
            home,
            cli.key_file.clone(),
            env_optional(KEY_FILE_ENV),
            cli.passphrase_env.clone(),
            file,
        ))
    }

    pub(crate) fn merge(
        home: PathBuf,
        cli_key_file: Option<PathBuf>,
        env_key_file: Option<String>,
        cli_passphrase_env: Option<String>,
        file: FileConfig,
    ) -> Self {
        // flag and env paths are taken as given; config paths are relative to home
        let key_file = cli_key_file
            .or_else(|| env_key_file.map(PathBuf::from))
            .or_else(|| file.key_file.map(|p| resolve_against(&home, p)))
            .unwrap_or_else(|| home.join(DEFAULT_KEY_FILE));
        Self {
            key_file,
            passphrase_env: cli_passphrase_env.or(file.passphrase_env),
            strict_attachments: file.strict_attachments,
            home,
        }
    }

    pub(crate) fn secret(&self, access: KeyAccess) -> Result<Secret, Box<dyn std::error::Error>> {
        if let Some(var) = &self.passphrase_env {
            let passphrase = env_optional(var)
                .ok_or_else(|| format!("passphrase variable {var} is not set or empty"))?;
            return Ok(Secret::passphrase(passphrase));
        }

        match access {
            KeyAccess::CreateIfMissing => {
                let (key, created) = CapsuleKey::load_or_generate(&self.key_file)?;
                if created {
                    tracing::info!(
                        key_file = %self.key_file.display(),
                        fingerprint = %key.fingerprint(),
                        "generated new capsule key; back it up to open capsules later"
                    );
                    eprintln!(
                        "Generated key {} ({}). Keep it safe: capsules cannot be opened without it.",
                        self.key_file.display(),
                        key.fingerprint()
                    );
                }
                Ok(Secret::Key(key))
            }
            KeyAccess::MustExist => {
                if !self.key_file.exists() {
                    return Err(format!(
                        "key file {} not found (use --key-file or TIMECAPSULE_KEY_FILE)",
                        self.key_file.display()
                    )
                    .into());
                }
                Ok(Secret::Key(CapsuleKey::load(&self.key_file)?))
            }
        }
    }

    pub(crate) fn open_store(
        &self,
        access: KeyAccess,
    ) -> Result<TimeCapsule, Box<dyn std::error::Error>> {
        let store = TimeCapsule::new(&self.home, self.secret(access)?)?
            .strict_attachments(self.strict_attachments);
        Ok(store)
    }
}
