use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::artwork::DEFAULT_ARTWORK_SIZE;
use crate::LibraryOptions;

pub const CONFIG_VERSION: u32 = 2;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LibraryConfig {
    pub version: u32,
    /// Holds `stores/`, `artworks/` and `waveforms/`.
    pub data_path: String,
    pub artwork_size: u32,
    pub resort_on_scan: bool,
    pub scan_folders: Vec<String>,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            data_path: "data".to_string(),
            artwork_size: DEFAULT_ARTWORK_SIZE,
            resort_on_scan: true,
            scan_folders: Vec::new(),
        }
    }
}

impl LibraryConfig {
    pub fn library_options(&self, config_path: &Path) -> LibraryOptions {
        LibraryOptions {
            data_root: resolve_path(config_path, &self.data_path),
            artwork_size: self.artwork_size,
        }
    }

    pub fn scan_folder_paths(&self, config_path: &Path) -> Vec<PathBuf> {
        self.scan_folders
            .iter()
            .map(|folder| folder.trim())
            .filter(|folder| !folder.is_empty())
            .map(|folder| resolve_path(config_path, folder))
            .collect()
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Yaml(serde_yaml::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(err) => write!(f, "io error: {}", err),
            ConfigError::Yaml(err) => write!(f, "yaml error: {}", err),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Io(err)
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        ConfigError::Yaml(err)
    }
}

pub fn config_path_from_env() -> PathBuf {
    match env::var("CATALOG_CONFIG") {
        Ok(value) if !value.trim().is_empty() => PathBuf::from(value),
        _ => default_config_path(),
    }
}

fn default_config_path() -> PathBuf {
    match env::current_exe() {
        Ok(exe) => exe
            .parent()
            .map(|dir| dir.join("config.yaml"))
            .unwrap_or_else(|| PathBuf::from("config.yaml")),
        Err(_) => PathBuf::from("config.yaml"),
    }
}

/// Returns the config and whether it was freshly created with defaults.
pub fn load_or_create_config(path: &Path) -> Result<(LibraryConfig, bool), ConfigError> {
    if path.exists() {
        let contents = fs::read_to_string(path)?;
        let mut config: LibraryConfig = serde_yaml::from_str(&contents)?;
        if config.version < CONFIG_VERSION {
            config.version = CONFIG_VERSION;
        }
        if config.data_path.trim().is_empty() {
            config.data_path = "data".to_string();
        }
        if config.artwork_size == 0 {
            config.artwork_size = DEFAULT_ARTWORK_SIZE;
        }
        return Ok((config, false));
    }

    let config = LibraryConfig::default();
    save_config(path, &config)?;
    Ok((config, true))
}

pub fn save_config(path: &Path, config: &LibraryConfig) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let contents = serde_yaml::to_string(config)?;
    fs::write(path, contents)?;
    Ok(())
}

pub fn resolve_path(config_path: &Path, value: &str) -> PathBuf {
    let raw = PathBuf::from(value);
    if raw.is_absolute() {
        return raw;
    }
    let base = config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    base.join(raw)
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::{Path, PathBuf};

    use super::{load_or_create_config, resolve_path, LibraryConfig, CONFIG_VERSION};

    #[test]
    fn missing_config_is_created_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conf").join("config.yaml");

        let (config, created) = load_or_create_config(&path).unwrap();
        assert!(created);
        assert_eq!(config, LibraryConfig::default());
        assert!(path.is_file());

        let (again, created) = load_or_create_config(&path).unwrap();
        assert!(!created);
        assert_eq!(again, config);
    }

    #[test]
    fn old_or_empty_values_are_normalised() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "version: 1\ndata_path: ' '\nartwork_size: 0\n").unwrap();

        let (config, _) = load_or_create_config(&path).unwrap();
        assert_eq!(config.version, CONFIG_VERSION);
        assert_eq!(config.data_path, "data");
        assert_eq!(config.artwork_size, 256);
        assert!(config.resort_on_scan);
    }

    #[test]
    fn relative_paths_resolve_against_config_dir() {
        let config_path = Path::new("/etc/catalog/config.yaml");
        assert_eq!(
            resolve_path(config_path, "data"),
            PathBuf::from("/etc/catalog/data")
        );
        assert_eq!(resolve_path(config_path, "/srv/music"), PathBuf::from("/srv/music"));
        assert_eq!(
            resolve_path(Path::new("config.yaml"), "data"),
            PathBuf::from("./data")
        );
    }

    #[test]
    fn options_and_folders_follow_config() {
        let config = LibraryConfig {
            data_path: "store".to_string(),
            artwork_size: 128,
            scan_folders: vec!["music".to_string(), "  ".to_string()],
            ..LibraryConfig::default()
        };
        let config_path = Path::new("/opt/app/config.yaml");
        let options = config.library_options(config_path);
        assert_eq!(options.data_root, PathBuf::from("/opt/app/store"));
        assert_eq!(options.artwork_size, 128);
        assert_eq!(
            config.scan_folder_paths(config_path),
            vec![PathBuf::from("/opt/app/music")]
        );
    }
}
