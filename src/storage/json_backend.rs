use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{
    core::utils::{ensure_dir, write_atomic, PathResolver},
    domain::BudgetDocument,
    errors::{BudgetError, BudgetResult},
};

use super::DocumentStorage;

pub const STORAGE_VERSION: u32 = 1;
pub const DEFAULT_STORAGE_KEY: &str = "budget_manager";

/// Versioned wrapper written around the document on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredEnvelope<T> {
    pub version: u32,
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,
    pub data: T,
}

/// Stores the budget document as a single JSON file, rewritten atomically on save.
#[derive(Debug, Clone)]
pub struct JsonStorage {
    key: String,
    path: PathBuf,
}

impl JsonStorage {
    pub fn new(root: Option<PathBuf>, key: Option<&str>) -> BudgetResult<Self> {
        let base = PathResolver::resolve_base(root);
        let dir = PathResolver::storage_dir_in(&base);
        ensure_dir(&dir)?;
        let key = key.unwrap_or(DEFAULT_STORAGE_KEY).to_string();
        let path = dir.join(format!("{}.json", key));
        Ok(Self { key, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl DocumentStorage for JsonStorage {
    fn load(&self) -> BudgetResult<Option<BudgetDocument>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let data = fs::read_to_string(&self.path)?;
        let envelope: StoredEnvelope<BudgetDocument> = serde_json::from_str(&data)?;
        if envelope.version > STORAGE_VERSION {
            return Err(BudgetError::Persistence(format!(
                "document `{}` has version {} which is newer than supported v{}",
                self.path.display(),
                envelope.version,
                STORAGE_VERSION
            )));
        }
        Ok(Some(envelope.data.sanitized()))
    }

    fn save(&self, document: &BudgetDocument) -> BudgetResult<()> {
        let envelope = StoredEnvelope {
            version: STORAGE_VERSION,
            key: self.key.clone(),
            saved_at: Some(Utc::now()),
            data: document,
        };
        let json = serde_json::to_string_pretty(&envelope)?;
        write_atomic(&self.path, &json).map_err(|err| {
            BudgetError::Persistence(format!("failed to write `{}`: {err}", self.path.display()))
        })
    }
}
