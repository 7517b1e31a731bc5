use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{
    core::utils::{ensure_dir, write_atomic, PathResolver},
    domain::{participants::DEFAULT_PARTICIPANTS, Participants},
    errors::BudgetResult,
    storage::DEFAULT_STORAGE_KEY,
};

const REGISTRY_FILE: &str = "entity_registry.json";

/// User preferences for the budget manager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Currency code used in the published unit, e.g. `DKK/month`.
    #[serde(default = "Config::default_currency")]
    pub currency: String,
    /// Participants used when no document has been stored yet.
    #[serde(default = "Config::default_participants")]
    pub default_participants: Vec<String>,
    #[serde(default = "Config::default_storage_key")]
    pub storage_key: String,
    /// File name of the entity registry inside the storage directory. `None` keeps the
    /// registry in memory only.
    #[serde(default = "Config::default_registry_file")]
    pub registry_file: Option<String>,
}

impl Config {
    fn default_currency() -> String {
        "DKK".into()
    }

    fn default_participants() -> Vec<String> {
        DEFAULT_PARTICIPANTS.iter().map(|name| name.to_string()).collect()
    }

    fn default_storage_key() -> String {
        DEFAULT_STORAGE_KEY.into()
    }

    fn default_registry_file() -> Option<String> {
        Some(REGISTRY_FILE.into())
    }

    pub fn unit(&self) -> String {
        format!("{}/month", self.currency)
    }

    pub fn participants(&self) -> Participants {
        Participants::from_names(&self.default_participants).unwrap_or_default()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            currency: Self::default_currency(),
            default_participants: Self::default_participants(),
            storage_key: Self::default_storage_key(),
            registry_file: Self::default_registry_file(),
        }
    }
}

/// Loads and saves [`Config`] under `<base>/config/config.json`.
pub struct ConfigManager {
    base: PathBuf,
    path: PathBuf,
}

impl ConfigManager {
    pub fn new() -> BudgetResult<Self> {
        Self::with_base_dir(PathResolver::base_dir())
    }

    pub fn with_base_dir(base: PathBuf) -> BudgetResult<Self> {
        ensure_dir(&base)?;
        ensure_dir(&PathResolver::config_dir_in(&base))?;
        Ok(Self {
            path: PathResolver::config_file_in(&base),
            base,
        })
    }

    pub fn load(&self) -> BudgetResult<Config> {
        if self.path.exists() {
            let data = fs::read_to_string(&self.path)?;
            Ok(serde_json::from_str(&data)?)
        } else {
            Ok(Config::default())
        }
    }

    pub fn save(&self, config: &Config) -> BudgetResult<()> {
        let json = serde_json::to_string_pretty(config)?;
        write_atomic(&self.path, &json)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn base_dir(&self) -> &Path {
        &self.base
    }

    /// Absolute registry path for `config`, if the registry is persisted.
    pub fn registry_path(&self, config: &Config) -> Option<PathBuf> {
        config
            .registry_file
            .as_ref()
            .map(|file| PathResolver::storage_dir_in(&self.base).join(file))
    }
}
