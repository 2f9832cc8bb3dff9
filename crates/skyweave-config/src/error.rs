use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(
        "manifest not found. Looked in:\n\
        - current directory: skyweave.local.yaml, .skyweave.local.yaml, skyweave.yaml, .skyweave.yaml\n\
        - ./.skyweave/ directory\n\
        - ~/.config/skyweave/skyweave.yaml\n\
        A path can also be given with the SKYWEAVE_CONFIG_PATH environment variable"
    )]
    ManifestNotFound,

    #[error("unsupported manifest format: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error("failed to parse {}: {source}", path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
