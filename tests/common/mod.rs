#![allow(dead_code)]

use std::{
    path::{Path, PathBuf},
    sync::Mutex,
};

use budget_manager::{
    config::Config,
    core::{
        manager::{BudgetManager, Outcome},
        presentation::{EntityRegistry, InMemorySink},
        Command,
    },
    storage::JsonStorage,
};
use once_cell::sync::Lazy;
use tempfile::TempDir;

/// Holds TempDir guards so temporary folders live for the duration of the test run.
static TEST_DIRS: Lazy<Mutex<Vec<TempDir>>> = Lazy::new(|| Mutex::new(Vec::new()));

/// Creates an isolated data directory for one test.
pub fn temp_home() -> PathBuf {
    let temp = TempDir::new().expect("create temp dir");
    let base = temp.path().to_path_buf();
    TEST_DIRS.lock().expect("lock temp dir registry").push(temp);
    base
}

pub fn registry_path(home: &Path) -> PathBuf {
    home.join("storage").join("entity_registry.json")
}

pub fn storage_path(home: &Path) -> PathBuf {
    home.join("storage").join("budget_manager.json")
}

/// Sets up a manager over `home` with a file-backed registry, like a fresh activation.
pub fn activate(home: &Path) -> BudgetManager<InMemorySink> {
    let storage = JsonStorage::new(Some(home.to_path_buf()), None).expect("create json storage");
    let registry = EntityRegistry::open(&registry_path(home)).expect("open registry");
    BudgetManager::setup(
        Box::new(storage),
        InMemorySink::with_registry(registry).recording(),
        &Config::default(),
    )
    .expect("set up manager")
}

pub fn call(manager: &mut BudgetManager<InMemorySink>, json: &str) -> Outcome {
    let command = Command::from_json(json).expect("parse command");
    manager.handle(command).expect("handle command")
}

pub fn overview_total(manager: &BudgetManager<InMemorySink>) -> f64 {
    manager
        .with_sink(|sink| sink.overview().and_then(|state| state.state))
        .expect("lock sink")
        .expect("overview published")
}
