use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Optional `<home>/config.json`.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub(crate) struct FileConfig {
    /// Key file path; relative paths resolve against the storage root.
    #[serde(default)]
    pub(crate) key_file: Option<PathBuf>,
    /// Environment variable holding a passphrase to seal with instead of a key file.
    #[serde(default)]
    pub(crate) passphrase_env: Option<String>,
    #[serde(default)]
    pub(crate) strict_attachments: bool,
}

pub(crate) fn config_file_path(home: &Path) -> PathBuf {
    home.join("config.json")
}

pub(crate) fn load_file_config(path: &Path) -> Result<FileConfig, Box<dyn std::error::Error>> {
    match std::fs::read_to_string(path) {
        Ok(data) => serde_json::from_str(&data)
            .map_err(|e| format!("invalid config {}: {e}", path.display()).into()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(FileConfig::default()),
        Err(e) => Err(format!("cannot read config {}: {e}", path.display()).into()),
    }
}

pub(crate) fn save_file_config(
    path: &Path,
    config: &FileConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(config)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, &json)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}
