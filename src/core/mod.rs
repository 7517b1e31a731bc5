//! Store, change signal, reconciliation and the command surface.

pub mod allocation;
pub mod broadcast;
pub mod commands;
pub mod manager;
pub mod presentation;
pub mod reconciler;
pub mod store;
pub mod utils;

pub use commands::Command;
pub use manager::{BudgetManager, Outcome};
pub use presentation::{EntityState, InMemorySink, PresentationSink};
pub use reconciler::{EntityReconciler, ReconcileReport};
pub use store::ItemStore;
