use thiserror::Error;

pub type BudgetResult<T> = Result<T, BudgetError>;

/// Error type that captures budget store, persistence and presentation failures.
#[derive(Debug, Error)]
pub enum BudgetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Persistence error: {0}")]
    Persistence(String),
    #[error("Item not found: {0}")]
    ItemNotFound(String),
    #[error("No items matched name `{0}`")]
    NoMatchingName(String),
    #[error("No fields to update for name `{0}`")]
    NoChanges(String),
    #[error("At least one participant name is required")]
    EmptyParticipants,
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Presentation error: {0}")]
    Presentation(String),
}

impl BudgetError {
    /// Soft failures are reported as warnings and leave state untouched; everything
    /// else aborts the operation and reaches the caller.
    pub fn is_soft(&self) -> bool {
        matches!(
            self,
            BudgetError::ItemNotFound(_)
                | BudgetError::NoMatchingName(_)
                | BudgetError::NoChanges(_)
                | BudgetError::EmptyParticipants
                | BudgetError::InvalidInput(_)
        )
    }
}
