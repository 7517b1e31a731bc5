//! Budget items, participants and the persisted document that holds them.

pub mod document;
pub mod item;
pub mod participants;

pub use document::BudgetDocument;
pub use item::{BudgetItem, Frequency, ItemId, ItemPatch, NewItem};
pub use participants::Participants;
