use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Global configuration loaded from `~/.config/partup/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Maximum number of uploads running at once across the process.
    pub max_concurrent_uploads: usize,
    /// Return an error instead of no result when parts fail or dispatch breaks.
    #[serde(default)]
    pub fail_on_part_error: bool,
    /// Account may upload files up to the privileged size limit.
    #[serde(default)]
    pub privileged_account: bool,
    /// Directory used by the local part store (CLI). None = XDG data dir.
    #[serde(default)]
    pub store_dir: Option<PathBuf>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_concurrent_uploads: 1,
            fail_on_part_error: false,
            privileged_account: false,
            store_dir: None,
        }
    }
}

impl UploadConfig {
    /// Store directory from config, falling back to `~/.local/share/partup/store`.
    pub fn resolved_store_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.store_dir {
            return Ok(dir.clone());
        }
        let xdg_dirs = xdg::BaseDirectories::with_prefix("partup")?;
        Ok(xdg_dirs.get_data_home().join("store"))
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("partup")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<UploadConfig> {
    load_or_init_at(&config_path()?)
}

/// Like [`load_or_init`] with an explicit path.
pub fn load_or_init_at(path: &Path) -> Result<UploadConfig> {
    if !path.exists() {
        let default_cfg = UploadConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(path)?;
    let cfg: UploadConfig = toml::from_str(&data)?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let cfg = UploadConfig::default();
        assert_eq!(cfg.max_concurrent_uploads, 1);
        assert!(!cfg.fail_on_part_error);
        assert!(!cfg.privileged_account);
        assert!(cfg.store_dir.is_none());
    }

    #[test]
    fn config_toml_roundtrip() {
        let cfg = UploadConfig::default();
        let toml = toml::to_string_pretty(&cfg).unwrap();
        let parsed: UploadConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed.max_concurrent_uploads, cfg.max_concurrent_uploads);
        assert_eq!(parsed.fail_on_part_error, cfg.fail_on_part_error);
    }

    #[test]
    fn config_toml_custom_values() {
        let toml = r#"
            max_concurrent_uploads = 3
            fail_on_part_error = true
            privileged_account = true
            store_dir = "/tmp/parts"
        "#;
        let cfg: UploadConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.max_concurrent_uploads, 3);
        assert!(cfg.fail_on_part_error);
        assert!(cfg.privileged_account);
        assert_eq!(cfg.resolved_store_dir().unwrap(), PathBuf::from("/tmp/parts"));
    }

    #[test]
    fn config_toml_optional_fields_default() {
        let cfg: UploadConfig = toml::from_str("max_concurrent_uploads = 2").unwrap();
        assert_eq!(cfg.max_concurrent_uploads, 2);
        assert!(!cfg.fail_on_part_error);
        assert!(cfg.store_dir.is_none());
    }

    #[test]
    fn load_or_init_writes_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let cfg = load_or_init_at(&path).unwrap();
        assert!(path.exists());
        assert_eq!(cfg.max_concurrent_uploads, 1);

        fs::write(&path, "max_concurrent_uploads = 5\n").unwrap();
        let cfg = load_or_init_at(&path).unwrap();
        assert_eq!(cfg.max_concurrent_uploads, 5);
    }
}
