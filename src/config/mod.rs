pub mod property;
pub mod schema;

use std::path::Path;

use crate::error::{KarozuError, Result};

pub use schema::ManifestConfig;

pub const MANIFEST_FILE: &str = "karozu.toml";

/// Load and validate a ManifestConfig from a karozu.toml file.
pub fn load_manifest(path: &Path) -> Result<ManifestConfig> {
    let manifest_path = if path.ends_with(MANIFEST_FILE) {
        path.to_path_buf()
    } else {
        path.join(MANIFEST_FILE)
    };

    if !manifest_path.exists() {
        return Err(KarozuError::ManifestNotFound {
            path: manifest_path,
        });
    }

    let content = std::fs::read_to_string(&manifest_path).map_err(|e| KarozuError::Io {
        context: format!("reading {}", manifest_path.display()),
        source: e,
    })?;

    let config: ManifestConfig =
        toml::from_str(&content).map_err(|e| KarozuError::ManifestParse { source: e })?;

    config.validate()?;

    Ok(config)
}
