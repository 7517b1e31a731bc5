use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{info, warn};

use crate::{
    config::Config,
    core::{
        broadcast::ListenerId,
        commands::Command,
        presentation::PresentationSink,
        reconciler::{EntityReconciler, ReconcileReport},
        store::ItemStore,
    },
    domain::NewItem,
    errors::{BudgetError, BudgetResult},
    storage::DocumentStorage,
};

pub type SharedReconciler<S> = Arc<Mutex<EntityReconciler<S>>>;

/// Result of a handled command.
#[derive(Debug)]
pub enum Outcome {
    Applied,
    Rebuilt(ReconcileReport),
    /// The command was a no-op; the error says why.
    Ignored(BudgetError),
}

/// Facade that owns the item store and the entity reconciler for one activation.
pub struct BudgetManager<S: PresentationSink + 'static> {
    store: ItemStore,
    reconciler: SharedReconciler<S>,
    listener: ListenerId,
}

impl<S: PresentationSink + 'static> BudgetManager<S> {
    /// Loads the document, publishes the initial objects, cleans up orphaned registry
    /// records and starts listening for changes.
    pub fn setup(
        storage: Box<dyn DocumentStorage>,
        sink: S,
        config: &Config,
    ) -> BudgetResult<Self> {
        let mut store = ItemStore::open(storage, config.participants())?;
        let mut reconciler = EntityReconciler::new(sink, config.unit());
        let report = reconciler.attach(store.document())?;
        let reconciler = Arc::new(Mutex::new(reconciler));
        let listener = store.subscribe(Box::new(Arc::clone(&reconciler)));
        info!(
            items = store.items().len(),
            removed_orphans = report.removed.len(),
            "budget manager ready"
        );
        Ok(Self {
            store,
            reconciler,
            listener,
        })
    }

    /// Runs one command. Unknown ids, unmatched names and empty participant lists are
    /// logged and reported as [`Outcome::Ignored`]; persistence failures are returned.
    pub fn handle(&mut self, command: Command) -> BudgetResult<Outcome> {
        let service = command.service();
        let result = match command {
            Command::AddItem(add) => self.store.add(NewItem::from(add)).map(|_| ()),
            Command::UpdateItem(update) => self.store.update(&update.id, &update.patch()),
            Command::UpdateItemByName(update) => self
                .store
                .update_by_name(&update.name, &update.patch())
                .map(|_| ()),
            Command::RemoveItem { id } => self.store.remove(&id),
            Command::RemoveItemByName { name } => self.store.remove_by_name(&name).map(|_| ()),
            Command::Clear => self.store.clear().map(|_| ()),
            Command::SetParticipants { names } => self.store.set_participants(&names),
            Command::RebuildEntities => return self.rebuild_entities().map(Outcome::Rebuilt),
        };
        match result {
            Ok(()) => Ok(Outcome::Applied),
            Err(err) if err.is_soft() => {
                warn!(service, error = %err, "budget command ignored");
                Ok(Outcome::Ignored(err))
            }
            Err(err) => Err(err),
        }
    }

    /// Forces a reconciliation pass without changing any data.
    pub fn rebuild_entities(&mut self) -> BudgetResult<ReconcileReport> {
        let document = self.store.document();
        lock(&self.reconciler)?.reconcile(document)
    }

    pub fn store(&self) -> &ItemStore {
        &self.store
    }

    pub fn reconciler(&self) -> &SharedReconciler<S> {
        &self.reconciler
    }

    /// Runs `inspect` against the sink while holding the reconciler lock.
    pub fn with_sink<R>(&self, inspect: impl FnOnce(&S) -> R) -> BudgetResult<R> {
        Ok(inspect(lock(&self.reconciler)?.sink()))
    }

    /// Stops listening for changes and returns the sink. Registry records stay in the
    /// sink so the next activation can reconcile against them.
    pub fn unload(mut self) -> BudgetResult<S> {
        self.store.unsubscribe(self.listener);
        let reconciler = Arc::try_unwrap(self.reconciler).map_err(|_| {
            BudgetError::Presentation("reconciler still shared at unload".into())
        })?;
        let reconciler = reconciler
            .into_inner()
            .map_err(|_| BudgetError::Presentation("reconciler lock poisoned".into()))?;
        info!("budget manager unloaded");
        Ok(reconciler.into_sink())
    }
}

fn lock<S: PresentationSink>(
    reconciler: &SharedReconciler<S>,
) -> BudgetResult<MutexGuard<'_, EntityReconciler<S>>> {
    reconciler
        .lock()
        .map_err(|_| BudgetError::Presentation("reconciler lock poisoned".into()))
}
