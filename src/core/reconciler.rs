use std::collections::BTreeSet;

use tracing::debug;

use crate::{
    core::{
        broadcast::ChangeListener,
        presentation::{item_id_from_unique_id, item_unique_id, EntityState, PresentationSink},
    },
    domain::{BudgetDocument, ItemId},
    errors::BudgetResult,
};

/// What a reconciliation pass changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub added: Vec<ItemId>,
    pub removed: Vec<ItemId>,
    pub refreshed: usize,
}

impl ReconcileReport {
    /// True when no object was published or unpublished.
    pub fn is_noop(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Keeps exactly one published object per budget item, plus the overview object, and
/// removes registry records whose item no longer exists.
pub struct EntityReconciler<S: PresentationSink> {
    sink: S,
    unit: String,
    runtime: BTreeSet<ItemId>,
    overview_published: bool,
}

impl<S: PresentationSink> EntityReconciler<S> {
    pub fn new(sink: S, unit: impl Into<String>) -> Self {
        Self {
            sink,
            unit: unit.into(),
            runtime: BTreeSet::new(),
            overview_published: false,
        }
    }

    /// Publishes the overview and one object per existing item, then runs a full
    /// reconciliation so records left behind by an earlier run are cleaned up.
    pub fn attach(&mut self, document: &BudgetDocument) -> BudgetResult<ReconcileReport> {
        if !self.overview_published {
            self.sink
                .publish(&EntityState::overview(document, &self.unit))?;
            self.overview_published = true;
        }
        self.reconcile(document)
    }

    pub fn reconcile(&mut self, document: &BudgetDocument) -> BudgetResult<ReconcileReport> {
        let mut report = ReconcileReport::default();

        let current: BTreeSet<ItemId> =
            document.items.iter().map(|item| item.id.clone()).collect();
        let registry: BTreeSet<ItemId> = self
            .sink
            .registry_records()?
            .iter()
            .filter_map(|unique_id| item_id_from_unique_id(unique_id))
            .collect();

        for item in &document.items {
            if self.runtime.contains(&item.id) {
                continue;
            }
            self.sink
                .publish(&EntityState::item(&item.id, document, &self.unit))?;
            self.runtime.insert(item.id.clone());
            report.added.push(item.id.clone());
        }

        let stale: Vec<ItemId> = self
            .runtime
            .union(&registry)
            .filter(|id| !current.contains(*id))
            .cloned()
            .collect();
        for id in stale {
            self.runtime.remove(&id);
            self.sink.unpublish(&item_unique_id(&id))?;
            report.removed.push(id);
        }

        for id in &self.runtime {
            self.sink
                .update(&EntityState::item(id, document, &self.unit))?;
            report.refreshed += 1;
        }
        if self.overview_published {
            self.sink
                .update(&EntityState::overview(document, &self.unit))?;
            report.refreshed += 1;
        }

        debug!(
            added = report.added.len(),
            removed = report.removed.len(),
            refreshed = report.refreshed,
            "entities reconciled"
        );
        Ok(report)
    }

    /// Ids that currently have a published object.
    pub fn published_ids(&self) -> impl Iterator<Item = &ItemId> {
        self.runtime.iter()
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Drops the runtime mapping and hands the sink back; registry records are kept.
    pub fn into_sink(self) -> S {
        self.sink
    }
}

impl<S: PresentationSink> ChangeListener for EntityReconciler<S> {
    fn on_change(&mut self, document: &BudgetDocument) -> BudgetResult<()> {
        self.reconcile(document).map(|_| ())
    }
}
