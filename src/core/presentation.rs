//! Published state objects and the sink that exposes them to the host.

use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use crate::{
    core::{
        allocation::{round_currency, BudgetTotals, ItemBreakdown, Transfers},
        utils::write_atomic,
    },
    domain::{BudgetDocument, BudgetItem, ItemId},
    errors::BudgetResult,
};

pub const ITEM_UNIQUE_ID_PREFIX: &str = "budget_item_";
pub const OVERVIEW_UNIQUE_ID: &str = "budget_manager_overview";
pub const OVERVIEW_NAME: &str = "Budget Overview";
const OVERVIEW_ICON: &str = "mdi:calculator-variant";
const ITEM_ICON: &str = "mdi:cash";
const PLATFORM: &str = "sensor";

/// Derives the published unique id for an item.
pub fn item_unique_id(id: &ItemId) -> String {
    format!("{ITEM_UNIQUE_ID_PREFIX}{id}")
}

/// Recovers the item id from a published unique id, if it follows the item scheme.
pub fn item_id_from_unique_id(unique_id: &str) -> Option<ItemId> {
    unique_id
        .strip_prefix(ITEM_UNIQUE_ID_PREFIX)
        .filter(|rest| !rest.is_empty())
        .map(ItemId::from)
}

pub fn item_display_name(item: Option<&BudgetItem>) -> String {
    match item {
        Some(item) => format!("Budget – {}", item.name),
        None => "Budget – (slettet)".to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceInfo {
    pub identifier: &'static str,
    pub name: &'static str,
    pub manufacturer: &'static str,
}

impl Default for DeviceInfo {
    fn default() -> Self {
        Self {
            identifier: "budget_manager",
            name: "Budget Manager",
            manufacturer: "Custom",
        }
    }
}

/// Rounded per-item figures as they are published.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemAttributes {
    pub id: ItemId,
    pub name: String,
    pub amount: f64,
    pub frequency: String,
    pub payer: String,
    pub monthly: f64,
    pub transfers: Transfers,
}

impl ItemAttributes {
    pub fn from_breakdown(item: &BudgetItem, breakdown: &ItemBreakdown) -> Self {
        Self {
            id: item.id.clone(),
            name: item.name.clone(),
            amount: round_currency(item.amount),
            frequency: item.frequency.to_string(),
            payer: item.payer.clone(),
            monthly: round_currency(breakdown.monthly),
            transfers: breakdown.transfers.rounded(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverviewAttributes {
    pub participants: Vec<String>,
    pub items: Vec<ItemAttributes>,
    pub totals: Transfers,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EntityAttributes {
    Overview(OverviewAttributes),
    Item(ItemAttributes),
}

/// Snapshot of one published object.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityState {
    pub unique_id: String,
    pub name: String,
    pub icon: &'static str,
    pub unit: String,
    pub state: Option<f64>,
    pub attributes: Option<EntityAttributes>,
    pub device: DeviceInfo,
}

impl EntityState {
    /// Aggregate object: total monthly cost plus every item and per-participant totals.
    pub fn overview(document: &BudgetDocument, unit: &str) -> Self {
        let participants = &document.participants;
        let items = document
            .items
            .iter()
            .map(|item| {
                ItemAttributes::from_breakdown(item, &ItemBreakdown::compute(item, participants))
            })
            .collect();
        let totals = BudgetTotals::compute(document);
        Self {
            unique_id: OVERVIEW_UNIQUE_ID.to_string(),
            name: OVERVIEW_NAME.to_string(),
            icon: OVERVIEW_ICON,
            unit: unit.to_string(),
            state: Some(round_currency(totals.monthly)),
            attributes: Some(EntityAttributes::Overview(OverviewAttributes {
                participants: participants.names().to_vec(),
                items,
                totals: totals.per_participant.rounded(),
            })),
            device: DeviceInfo::default(),
        }
    }

    /// Per-item object. An id with no backing item yields an empty placeholder.
    pub fn item(id: &ItemId, document: &BudgetDocument, unit: &str) -> Self {
        let item = document.item(id);
        let (state, attributes) = match item {
            Some(item) => {
                let breakdown = ItemBreakdown::compute(item, &document.participants);
                let attributes = ItemAttributes::from_breakdown(item, &breakdown);
                (
                    Some(attributes.monthly),
                    Some(EntityAttributes::Item(attributes)),
                )
            }
            None => (None, None),
        };
        Self {
            unique_id: item_unique_id(id),
            name: item_display_name(item),
            icon: ITEM_ICON,
            unit: unit.to_string(),
            state,
            attributes,
            device: DeviceInfo::default(),
        }
    }

    pub fn item_attributes(&self) -> Option<&ItemAttributes> {
        match &self.attributes {
            Some(EntityAttributes::Item(attributes)) => Some(attributes),
            _ => None,
        }
    }

    pub fn overview_attributes(&self) -> Option<&OverviewAttributes> {
        match &self.attributes {
            Some(EntityAttributes::Overview(attributes)) => Some(attributes),
            _ => None,
        }
    }
}

/// Host capability for exposing state objects.
///
/// `unpublish` removes both the live object and its registry record. Registry records
/// may outlive the process, so `registry_records` can list ids that were never
/// published by the current instance.
pub trait PresentationSink: Send {
    fn publish(&mut self, state: &EntityState) -> BudgetResult<()>;
    fn update(&mut self, state: &EntityState) -> BudgetResult<()>;
    fn unpublish(&mut self, unique_id: &str) -> BudgetResult<()>;
    fn registry_records(&self) -> BudgetResult<Vec<String>>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryRecord {
    pub unique_id: String,
    pub name: String,
    pub platform: String,
}

/// Durable list of published unique ids, optionally backed by a JSON file.
#[derive(Debug, Clone, Default)]
pub struct EntityRegistry {
    path: Option<PathBuf>,
    records: BTreeMap<String, RegistryRecord>,
}

impl EntityRegistry {
    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn open(path: &Path) -> BudgetResult<Self> {
        let records: Vec<RegistryRecord> = if path.exists() {
            serde_json::from_str(&fs::read_to_string(path)?)?
        } else {
            Vec::new()
        };
        Ok(Self {
            path: Some(path.to_path_buf()),
            records: records
                .into_iter()
                .map(|record| (record.unique_id.clone(), record))
                .collect(),
        })
    }

    pub fn upsert(&mut self, unique_id: &str, name: &str) -> BudgetResult<()> {
        let record = RegistryRecord {
            unique_id: unique_id.to_string(),
            name: name.to_string(),
            platform: PLATFORM.to_string(),
        };
        if self.records.get(unique_id) == Some(&record) {
            return Ok(());
        }
        let mut updated = self.records.clone();
        updated.insert(unique_id.to_string(), record);
        self.commit(updated)
    }

    pub fn remove(&mut self, unique_id: &str) -> BudgetResult<bool> {
        if !self.records.contains_key(unique_id) {
            return Ok(false);
        }
        let mut updated = self.records.clone();
        updated.remove(unique_id);
        self.commit(updated)?;
        Ok(true)
    }

    pub fn get(&self, unique_id: &str) -> Option<&RegistryRecord> {
        self.records.get(unique_id)
    }

    pub fn unique_ids(&self) -> Vec<String> {
        self.records.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Writes `records` and only then replaces the in-memory map.
    fn commit(&mut self, records: BTreeMap<String, RegistryRecord>) -> BudgetResult<()> {
        if let Some(path) = &self.path {
            let values: Vec<&RegistryRecord> = records.values().collect();
            write_atomic(path, &serde_json::to_string_pretty(&values)?)?;
        }
        self.records = records;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkEvent {
    Published(String),
    Updated(String),
    Unpublished(String),
}

/// Sink that keeps published objects in memory. Actions are only logged after
/// [`InMemorySink::recording`] has been called.
#[derive(Debug, Default)]
pub struct InMemorySink {
    published: BTreeMap<String, EntityState>,
    registry: EntityRegistry,
    events: Option<Vec<SinkEvent>>,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_registry(registry: EntityRegistry) -> Self {
        Self {
            registry,
            ..Self::default()
        }
    }

    /// Turns on the action log read by [`InMemorySink::events`].
    pub fn recording(mut self) -> Self {
        self.events.get_or_insert_with(Vec::new);
        self
    }

    pub fn get(&self, unique_id: &str) -> Option<&EntityState> {
        self.published.get(unique_id)
    }

    pub fn overview(&self) -> Option<&EntityState> {
        self.get(OVERVIEW_UNIQUE_ID)
    }

    pub fn published_ids(&self) -> Vec<String> {
        self.published.keys().cloned().collect()
    }

    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    pub fn events(&self) -> &[SinkEvent] {
        self.events.as_deref().unwrap_or_default()
    }

    pub fn take_events(&mut self) -> Vec<SinkEvent> {
        self.events.as_mut().map(std::mem::take).unwrap_or_default()
    }

    fn record(&mut self, event: SinkEvent) {
        if let Some(events) = &mut self.events {
            events.push(event);
        }
    }
}

impl PresentationSink for InMemorySink {
    fn publish(&mut self, state: &EntityState) -> BudgetResult<()> {
        self.registry.upsert(&state.unique_id, &state.name)?;
        self.published.insert(state.unique_id.clone(), state.clone());
        self.record(SinkEvent::Published(state.unique_id.clone()));
        Ok(())
    }

    fn update(&mut self, state: &EntityState) -> BudgetResult<()> {
        self.registry.upsert(&state.unique_id, &state.name)?;
        self.published.insert(state.unique_id.clone(), state.clone());
        self.record(SinkEvent::Updated(state.unique_id.clone()));
        Ok(())
    }

    fn unpublish(&mut self, unique_id: &str) -> BudgetResult<()> {
        self.published.remove(unique_id);
        self.registry.remove(unique_id)?;
        self.record(SinkEvent::Unpublished(unique_id.to_string()));
        Ok(())
    }

    fn registry_records(&self) -> BudgetResult<Vec<String>> {
        Ok(self.registry.unique_ids())
    }
}
