use sqlprom::ObserverConfig;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "sqlprom.toml";

/// Load observer settings.
///
/// An explicit path must exist. Without one, `sqlprom.toml` in the working
/// directory is used when present and built-in defaults otherwise.
pub fn load(explicit: Option<&Path>) -> anyhow::Result<ObserverConfig> {
    let config_path = match explicit {
        Some(p) => p.to_path_buf(),
        None => {
            let default = PathBuf::from(DEFAULT_CONFIG_FILE);
            if !default.is_file() {
                tracing::debug!(target: "sqlprom", "no {DEFAULT_CONFIG_FILE}, using defaults");
                return Ok(ObserverConfig::default());
            }
            default
        }
    };

    let raw = std::fs::read_to_string(&config_path).map_err(|e| {
        anyhow::anyhow!(
            "failed to read config file {}: {e}",
            config_path.display()
        )
    })?;

    ObserverConfig::from_toml_str(&raw).map_err(|e| {
        anyhow::anyhow!(
            "failed to parse config file {}: {e}",
            config_path.display()
        )
    })
}
