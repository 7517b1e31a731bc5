#![doc(test(attr(deny(warnings))))]

//! Budget Manager tracks recurring household expenses, normalizes them to a monthly
//! figure, splits the cost between participants and keeps one published state object
//! per expense in sync with the stored data.

pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod errors;
pub mod storage;
pub mod utils;

pub use errors::{BudgetError, BudgetResult};

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("Budget Manager tracing initialized.");
    });
}
