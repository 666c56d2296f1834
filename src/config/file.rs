use serde::Deserialize;
use std::{fs, path::Path};

use crate::config::consts::DEFAULT_TIMESTAMP_FORMAT;
use crate::gif::GifConfig;
use crate::reader::DisplayOptions;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub timestamp_format: String,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            timestamp_format: DEFAULT_TIMESTAMP_FORMAT.to_string(),
        }
    }
}

impl From<&DisplayConfig> for DisplayOptions {
    fn from(config: &DisplayConfig) -> Self {
        DisplayOptions {
            timestamp_format: config.timestamp_format.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ContractSection {
    /// Fixed gas limit for ledger writes.
    pub gas_limit: Option<u64>,
}

/// Optional settings file. Every section and field may be omitted.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub display: DisplayConfig,
    pub gif: GifConfig,
    pub contract: ContractSection,
}

/// Load configuration from a TOML file.
pub fn load_config_from_path<P: AsRef<Path>>(path: P) -> anyhow::Result<FileConfig> {
    let s = fs::read_to_string(path)?;
    let cfg: FileConfig = toml::from_str(&s)?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::consts::{GIPHY_SEARCH_URL, PLACEHOLDER_GIF_URL};

    #[test]
    fn test_default_config() {
        let config = FileConfig::default();
        assert_eq!(config.display.timestamp_format, DEFAULT_TIMESTAMP_FORMAT);
        assert_eq!(config.gif.endpoint, GIPHY_SEARCH_URL);
        assert_eq!(config.gif.placeholder_url, PLACEHOLDER_GIF_URL);
        assert_eq!(config.contract.gas_limit, None);
    }

    #[test]
    fn test_partial_config() {
        let config: FileConfig = toml::from_str(
            r#"
            [display]
            timestamp_format = "%Y-%m-%d %H:%M"

            [gif]
            timeout_secs = 3
            "#,
        )
        .unwrap();

        assert_eq!(config.display.timestamp_format, "%Y-%m-%d %H:%M");
        assert_eq!(config.gif.timeout_secs, 3);
        assert_eq!(config.gif.endpoint, GIPHY_SEARCH_URL);
        assert_eq!(config.contract.gas_limit, None);
    }

    #[test]
    fn test_load_from_path() {
        let path = std::env::temp_dir().join(format!("krypt_config_{}.toml", std::process::id()));
        fs::write(&path, "[contract]\ngas_limit = 250000\n").unwrap();

        let config = load_config_from_path(&path).unwrap();
        assert_eq!(config.contract.gas_limit, Some(250_000));

        fs::remove_file(&path).unwrap();
    }
}
