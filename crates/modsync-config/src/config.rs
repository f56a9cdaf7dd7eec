use std::{
    fs,
    path::{Path, PathBuf},
    sync::{LazyLock, PoisonError, RwLock},
};

use documented::{Documented, DocumentedFields};
use modsync_utils::{
    fs::ensure_dir_exists,
    hash::DigestAlgorithm,
    path::{resolve_path, xdg_config_home, xdg_data_home},
};
use serde::{Deserialize, Serialize};
use toml_edit::DocumentMut;
use tracing::{debug, info};

use crate::{
    annotations::annotate_toml_table,
    error::{ConfigError, Result},
};

/// modsync configuration
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize, Documented, DocumentedFields)]
pub struct Config {
    /// Path to the SQLite database holding imported module content.
    /// Default: $XDG_DATA_HOME/modsync/modsync.db
    pub db_path: Option<String>,

    /// Directory of the content-addressed artifact store where canonical
    /// module documents are written.
    /// Default: $XDG_DATA_HOME/modsync/artifacts
    pub storage_path: Option<String>,

    /// Hash function used for artifact addresses and defaults digests.
    /// One of "sha256" or "blake3".
    /// Default: sha256
    pub digest_algorithm: Option<DigestAlgorithm>,
}

pub static CONFIG: LazyLock<RwLock<Option<Config>>> = LazyLock::new(|| RwLock::new(None));

pub static CONFIG_PATH: LazyLock<RwLock<PathBuf>> = LazyLock::new(|| {
    RwLock::new(match std::env::var("MODSYNC_CONFIG") {
        Ok(path) => PathBuf::from(path),
        Err(_) => xdg_config_home().join("modsync").join("config.toml"),
    })
});

/// Loads the configuration file into the global configuration.
pub fn init() -> Result<()> {
    let config = Config::new()?;
    *CONFIG.write().unwrap_or_else(PoisonError::into_inner) = Some(config);
    Ok(())
}

/// Returns the global configuration, falling back to defaults when [`init`]
/// was never called.
pub fn get_config() -> Config {
    CONFIG
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
        .unwrap_or_else(Config::default_config)
}

/// Overrides the configuration file location.
pub fn set_config_path<P: AsRef<Path>>(path: P) -> Result<()> {
    let resolved = resolve_path(&path.as_ref().to_string_lossy())?;
    *CONFIG_PATH.write().unwrap_or_else(PoisonError::into_inner) = resolved;
    Ok(())
}

pub fn config_path() -> PathBuf {
    CONFIG_PATH
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

fn data_root() -> PathBuf {
    xdg_data_home().join("modsync")
}

impl Config {
    pub fn default_config() -> Self {
        let root = data_root();
        Self {
            db_path: Some(root.join("modsync.db").display().to_string()),
            storage_path: Some(root.join("artifacts").display().to_string()),
            digest_algorithm: Some(DigestAlgorithm::default()),
        }
    }

    /// Loads the configuration from [`CONFIG_PATH`].
    ///
    /// A missing file yields the default configuration.
    pub fn new() -> Result<Self> {
        let path = config_path();

        let mut config = match fs::read_to_string(&path) {
            Ok(content) => toml::from_str(&content)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!("No config file at {}, using defaults", path.display());
                Self::default_config()
            }
            Err(err) => return Err(ConfigError::IoError(err)),
        };

        config.resolve();
        Ok(config)
    }

    /// Fills unset fields with their defaults.
    pub fn resolve(&mut self) {
        let defaults = Self::default_config();
        if self.db_path.is_none() {
            self.db_path = defaults.db_path;
        }
        if self.storage_path.is_none() {
            self.storage_path = defaults.storage_path;
        }
        self.digest_algorithm.get_or_insert_with(DigestAlgorithm::default);
    }

    pub fn get_db_path(&self) -> Result<PathBuf> {
        if let Ok(env_path) = std::env::var("MODSYNC_DB") {
            return Ok(resolve_path(&env_path)?);
        }
        match &self.db_path {
            Some(db_path) => Ok(resolve_path(db_path)?),
            None => Ok(data_root().join("modsync.db")),
        }
    }

    pub fn get_storage_path(&self) -> Result<PathBuf> {
        if let Ok(env_path) = std::env::var("MODSYNC_STORAGE") {
            return Ok(resolve_path(&env_path)?);
        }
        match &self.storage_path {
            Some(storage_path) => Ok(resolve_path(storage_path)?),
            None => Ok(data_root().join("artifacts")),
        }
    }

    pub fn digest_algorithm(&self) -> DigestAlgorithm {
        self.digest_algorithm.unwrap_or_default()
    }

    pub fn to_annotated_document(&self) -> Result<DocumentMut> {
        let toml_string = toml::to_string_pretty(self)?;
        let mut doc = toml_string.parse::<DocumentMut>()?;
        annotate_toml_table::<Config>(doc.as_table_mut(), true)?;
        Ok(doc)
    }
}

/// Writes a documented default configuration to [`CONFIG_PATH`].
///
/// # Errors
///
/// * [`ConfigError::ConfigAlreadyExists`] if the file is already present
pub fn generate_default_config() -> Result<PathBuf> {
    let path = config_path();

    if path.exists() {
        return Err(ConfigError::ConfigAlreadyExists(path.display().to_string()));
    }

    let annotated = Config::default_config().to_annotated_document()?;

    if let Some(parent) = path.parent() {
        ensure_dir_exists(parent)?;
    }
    fs::write(&path, annotated.to_string())?;
    info!(
        "Default configuration file generated with documentation at: {}",
        path.display()
    );
    Ok(path)
}
