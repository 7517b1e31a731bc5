use tracing::debug;

use crate::{
    core::broadcast::{ChangeBroadcaster, ChangeListener, ListenerId},
    domain::{BudgetDocument, BudgetItem, ItemId, ItemPatch, NewItem, Participants},
    errors::{BudgetError, BudgetResult},
    storage::DocumentStorage,
};

/// Owns the budget document. Every mutation is applied to a working copy, persisted,
/// committed and then broadcast exactly once; a failed write leaves the in-memory
/// document untouched and sends nothing.
pub struct ItemStore {
    document: BudgetDocument,
    storage: Box<dyn DocumentStorage>,
    broadcaster: ChangeBroadcaster,
}

impl ItemStore {
    /// Loads the stored document, or starts from an empty one with `defaults` as the
    /// participant list.
    pub fn open(storage: Box<dyn DocumentStorage>, defaults: Participants) -> BudgetResult<Self> {
        let document = match storage.load()? {
            Some(document) => document,
            None => BudgetDocument {
                items: Vec::new(),
                participants: defaults,
            },
        };
        debug!(
            items = document.items.len(),
            participants = document.participants.len(),
            "budget document loaded"
        );
        Ok(Self::with_document(document, storage))
    }

    pub fn with_document(document: BudgetDocument, storage: Box<dyn DocumentStorage>) -> Self {
        Self {
            document,
            storage,
            broadcaster: ChangeBroadcaster::new(),
        }
    }

    pub fn document(&self) -> &BudgetDocument {
        &self.document
    }

    pub fn items(&self) -> &[BudgetItem] {
        &self.document.items
    }

    pub fn item(&self, id: &ItemId) -> Option<&BudgetItem> {
        self.document.item(id)
    }

    pub fn participants(&self) -> &Participants {
        &self.document.participants
    }

    pub fn subscribe(&mut self, listener: Box<dyn ChangeListener>) -> ListenerId {
        self.broadcaster.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.broadcaster.unsubscribe(id)
    }

    pub fn broadcaster(&self) -> &ChangeBroadcaster {
        &self.broadcaster
    }

    pub fn add(&mut self, draft: NewItem) -> BudgetResult<ItemId> {
        ensure_finite(draft.amount)?;
        let id = self.commit(|document| {
            let payer = draft
                .payer
                .as_deref()
                .unwrap_or(document.participants.group_label());
            let mut item = BudgetItem::new(
                draft.name.as_str(),
                draft.amount,
                draft.frequency.clone().unwrap_or_default(),
                payer,
            );
            item.payer = document.participants.normalize_payer(&item.payer);
            let id = item.id.clone();
            document.items.push(item);
            Ok(id)
        })?;
        debug!(%id, name = %draft.name.trim(), "budget item added");
        Ok(id)
    }

    pub fn update(&mut self, id: &ItemId, patch: &ItemPatch) -> BudgetResult<()> {
        if let Some(amount) = patch.amount {
            ensure_finite(amount)?;
        }
        self.commit(|document| {
            let participants = document.participants.clone();
            let item = document
                .item_mut(id)
                .ok_or_else(|| BudgetError::ItemNotFound(id.to_string()))?;
            item.apply(patch);
            item.payer = participants.normalize_payer(&item.payer);
            Ok(())
        })?;
        debug!(%id, "budget item updated");
        Ok(())
    }

    /// Updates every item whose name matches `name` and returns how many changed.
    pub fn update_by_name(&mut self, name: &str, patch: &ItemPatch) -> BudgetResult<usize> {
        if patch.is_empty() {
            return Err(BudgetError::NoChanges(name.trim().to_string()));
        }
        if let Some(amount) = patch.amount {
            ensure_finite(amount)?;
        }
        let updated = self.commit(|document| {
            let participants = document.participants.clone();
            let mut updated = 0;
            for item in document.items.iter_mut().filter(|item| item.name_matches(name)) {
                item.apply(patch);
                item.payer = participants.normalize_payer(&item.payer);
                updated += 1;
            }
            if updated == 0 {
                return Err(BudgetError::NoMatchingName(name.trim().to_string()));
            }
            Ok(updated)
        })?;
        debug!(name = %name.trim(), updated, "budget items updated by name");
        Ok(updated)
    }

    pub fn remove(&mut self, id: &ItemId) -> BudgetResult<()> {
        self.commit(|document| {
            let before = document.items.len();
            document.items.retain(|item| &item.id != id);
            if document.items.len() == before {
                return Err(BudgetError::ItemNotFound(id.to_string()));
            }
            Ok(())
        })?;
        debug!(%id, "budget item removed");
        Ok(())
    }

    /// Removes every item whose name matches `name` and returns how many were removed.
    pub fn remove_by_name(&mut self, name: &str) -> BudgetResult<usize> {
        let removed = self.commit(|document| {
            let before = document.items.len();
            document.items.retain(|item| !item.name_matches(name));
            let removed = before - document.items.len();
            if removed == 0 {
                return Err(BudgetError::NoMatchingName(name.trim().to_string()));
            }
            Ok(removed)
        })?;
        debug!(name = %name.trim(), removed, "budget items removed by name");
        Ok(removed)
    }

    /// Removes all items and returns how many there were.
    pub fn clear(&mut self) -> BudgetResult<usize> {
        let removed = self.commit(|document| {
            let removed = document.items.len();
            document.items.clear();
            Ok(removed)
        })?;
        debug!(removed, "budget items cleared");
        Ok(removed)
    }

    /// Replaces the participant list and re-labels group payers to match it.
    pub fn set_participants<I, S>(&mut self, names: I) -> BudgetResult<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let participants =
            Participants::from_names(names).ok_or(BudgetError::EmptyParticipants)?;
        self.commit(|document| {
            document.participants = participants;
            document.normalize_payers();
            Ok(())
        })?;
        debug!(
            participants = ?self.document.participants.names(),
            "participants replaced"
        );
        Ok(())
    }

    fn commit<T>(
        &mut self,
        mutate: impl FnOnce(&mut BudgetDocument) -> BudgetResult<T>,
    ) -> BudgetResult<T> {
        let mut working = self.document.clone();
        let outcome = mutate(&mut working)?;
        self.storage.save(&working)?;
        self.document = working;
        self.broadcaster.broadcast(&self.document)?;
        Ok(outcome)
    }
}

fn ensure_finite(amount: f64) -> BudgetResult<()> {
    if amount.is_finite() {
        Ok(())
    } else {
        Err(BudgetError::InvalidInput(format!(
            "amount `{amount}` is not a finite number"
        )))
    }
}
