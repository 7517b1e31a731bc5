pub mod json_backend;

use crate::{domain::BudgetDocument, errors::BudgetResult};

/// Abstraction over the key/value document store the budget lives in.
pub trait DocumentStorage: Send {
    /// Returns `None` when nothing has been saved yet.
    fn load(&self) -> BudgetResult<Option<BudgetDocument>>;
    fn save(&self, document: &BudgetDocument) -> BudgetResult<()>;
}

pub use json_backend::{JsonStorage, StoredEnvelope, DEFAULT_STORAGE_KEY, STORAGE_VERSION};
