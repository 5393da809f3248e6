//! Configuration loading and root folder resolution
//!
//! The root folder holds the database and anything else the services persist.
//! Resolution priority:
//! 1. Command-line argument (handled by the service's own CLI parsing)
//! 2. `CLINCURA_ROOT_FOLDER` environment variable (then `CLINCURA_ROOT`)
//! 3. `root_folder` key in the TOML config file
//! 4. OS-dependent compiled default
//!
//! Missing or malformed config files never abort startup; resolution falls
//! through to the next tier with a warning.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Database file name inside the root folder
pub const DATABASE_FILE_NAME: &str = "clincura.db";

/// Primary environment variable for the root folder
pub const ROOT_FOLDER_ENV: &str = "CLINCURA_ROOT_FOLDER";

/// Alternative environment variable, checked after the primary
pub const ROOT_ENV: &str = "CLINCURA_ROOT";

/// Platform-compiled fallback configuration
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub root_folder: PathBuf,
    pub log_level: String,
    pub log_file: Option<PathBuf>,
}

impl CompiledDefaults {
    pub fn for_current_platform() -> Self {
        let root_folder = if cfg!(target_os = "linux") {
            // ~/.local/share/clincura (or /var/lib/clincura system-wide)
            dirs::data_local_dir()
                .map(|d| d.join("clincura"))
                .unwrap_or_else(|| PathBuf::from("/var/lib/clincura"))
        } else if cfg!(target_os = "macos") {
            dirs::data_dir()
                .map(|d| d.join("clincura"))
                .unwrap_or_else(|| PathBuf::from("/Library/Application Support/clincura"))
        } else if cfg!(target_os = "windows") {
            dirs::data_local_dir()
                .map(|d| d.join("clincura"))
                .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\clincura"))
        } else {
            PathBuf::from("./clincura_data")
        };

        Self {
            root_folder,
            log_level: "info".to_string(),
            log_file: None,
        }
    }
}

/// Logging section of the TOML config file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    pub level: Option<String>,
    pub file: Option<PathBuf>,
}

/// TOML config file schema.
///
/// Looked up at `~/.config/clincura/config.toml`, then
/// `/etc/clincura/config.toml` on Linux. All keys optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    pub root_folder: Option<PathBuf>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl TomlConfig {
    /// Load the first config file found, if any. Parse failures warn and
    /// return `None` rather than aborting startup.
    pub fn load() -> Option<Self> {
        let path = Self::find_config_file()?;
        match Self::load_from_path(&path) {
            Ok(config) => Some(config),
            Err(e) => {
                warn!("Ignoring config file {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Parse a specific config file, with errors surfaced to the caller
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str::<TomlConfig>(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    fn find_config_file() -> Option<PathBuf> {
        if let Some(user_config) = dirs::config_dir().map(|d| d.join("clincura").join("config.toml"))
        {
            if user_config.exists() {
                return Some(user_config);
            }
        }
        if cfg!(target_os = "linux") {
            let system_config = PathBuf::from("/etc/clincura/config.toml");
            if system_config.exists() {
                return Some(system_config);
            }
        }
        None
    }
}

/// Resolves the root folder through the environment / config / default tiers.
///
/// CLI overrides are the caller's business; a service that accepts
/// `--root-folder` applies it before consulting the resolver.
pub struct RootFolderResolver {
    module_name: String,
}

impl RootFolderResolver {
    pub fn new(module_name: &str) -> Self {
        Self {
            module_name: module_name.to_string(),
        }
    }

    pub fn resolve(&self) -> PathBuf {
        if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
            return PathBuf::from(path);
        }
        if let Ok(path) = std::env::var(ROOT_ENV) {
            return PathBuf::from(path);
        }

        if let Some(config) = TomlConfig::load() {
            if let Some(root) = config.root_folder {
                return root;
            }
        }

        let defaults = CompiledDefaults::for_current_platform();
        warn!(
            "{}: no root folder configured, using default {}",
            self.module_name,
            defaults.root_folder.display()
        );
        defaults.root_folder
    }
}

/// Prepares a resolved root folder for use
pub struct RootFolderInitializer {
    root: PathBuf,
}

impl RootFolderInitializer {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the root folder (and parents) if missing. Idempotent.
    pub fn ensure_directory_exists(&self) -> Result<()> {
        if self.root.exists() && !self.root.is_dir() {
            return Err(Error::Config(format!(
                "Root folder path {} exists but is not a directory",
                self.root.display()
            )));
        }
        std::fs::create_dir_all(&self.root)?;
        Ok(())
    }

    /// Path of the database file inside the root folder
    pub fn database_path(&self) -> PathBuf {
        self.root.join(DATABASE_FILE_NAME)
    }

    pub fn database_exists(&self) -> bool {
        self.database_path().exists()
    }
}
