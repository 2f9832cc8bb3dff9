pub mod error;

pub use error::*;

use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

/// Environment variable naming the manifest directly
pub const CONFIG_PATH_ENV: &str = "SKYWEAVE_CONFIG_PATH";

const CANDIDATES: [&str; 4] = [
    "skyweave.local.yaml",
    ".skyweave.local.yaml",
    "skyweave.yaml",
    ".skyweave.yaml",
];

/// Locate the project manifest.
///
/// Search order:
/// 1. `SKYWEAVE_CONFIG_PATH`
/// 2. current directory: skyweave.local.yaml, .skyweave.local.yaml, skyweave.yaml, .skyweave.yaml
/// 3. the same names under `./.skyweave/`
/// 4. `~/.config/skyweave/skyweave.yaml`
pub fn find_manifest() -> Result<PathBuf> {
    if let Ok(config_path) = std::env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(config_path);
        if path.exists() {
            return Ok(path);
        }
        tracing::warn!(path = %path.display(), "{} points at a missing file", CONFIG_PATH_ENV);
    }

    let current_dir = std::env::current_dir()?;

    for filename in &CANDIDATES {
        let path = current_dir.join(filename);
        if path.exists() {
            return Ok(path);
        }
    }

    let project_dir = current_dir.join(".skyweave");
    if project_dir.is_dir() {
        for filename in &CANDIDATES {
            let path = project_dir.join(filename);
            if path.exists() {
                return Ok(path);
            }
        }
    }

    if let Some(config_dir) = dirs::config_dir() {
        let global_config = config_dir.join("skyweave").join("skyweave.yaml");
        if global_config.exists() {
            return Ok(global_config);
        }
    }

    Err(ConfigError::ManifestNotFound)
}

/// Use `explicit` when given, otherwise [`find_manifest`]
pub fn resolve_manifest(explicit: Option<&Path>) -> Result<PathBuf> {
    match explicit {
        Some(path) if path.exists() => Ok(path.to_path_buf()),
        Some(path) => Err(ConfigError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("{} does not exist", path.display()),
        ))),
        None => find_manifest(),
    }
}

/// Read a YAML (`.yaml`/`.yml`) or JSON (`.json`) manifest
pub fn load_manifest<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    let content = std::fs::read_to_string(path)?;
    tracing::debug!(path = %path.display(), bytes = content.len(), "loaded manifest");

    match extension.as_deref() {
        Some("yaml") | Some("yml") => {
            serde_yaml::from_str(&content).map_err(|source| ConfigError::Yaml {
                path: path.to_path_buf(),
                source,
            })
        }
        Some("json") => serde_json::from_str(&content).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        }),
        _ => Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
    }
}
