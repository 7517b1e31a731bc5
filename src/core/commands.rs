//! The operation surface exposed to the host, shaped like its service calls:
//! `{"service": "<operation>", "data": {...}}`.

use serde::{de, Deserialize, Deserializer};

use crate::{
    domain::{Frequency, ItemId, ItemPatch, NewItem},
    errors::{BudgetError, BudgetResult},
};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "service", content = "data", rename_all = "snake_case")]
pub enum Command {
    AddItem(AddItem),
    UpdateItem(UpdateItem),
    UpdateItemByName(UpdateItemByName),
    RemoveItem { id: ItemId },
    RemoveItemByName { name: String },
    Clear,
    RebuildEntities,
    SetParticipants { names: Vec<String> },
}

impl Command {
    pub fn from_json(raw: &str) -> BudgetResult<Self> {
        serde_json::from_str(raw).map_err(|err| BudgetError::InvalidInput(err.to_string()))
    }

    pub fn from_value(value: serde_json::Value) -> BudgetResult<Self> {
        serde_json::from_value(value).map_err(|err| BudgetError::InvalidInput(err.to_string()))
    }

    /// Service name used in logs.
    pub fn service(&self) -> &'static str {
        match self {
            Command::AddItem(_) => "add_item",
            Command::UpdateItem(_) => "update_item",
            Command::UpdateItemByName(_) => "update_item_by_name",
            Command::RemoveItem { .. } => "remove_item",
            Command::RemoveItemByName { .. } => "remove_item_by_name",
            Command::Clear => "clear",
            Command::RebuildEntities => "rebuild_entities",
            Command::SetParticipants { .. } => "set_participants",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AddItem {
    pub name: String,
    #[serde(deserialize_with = "coerce_amount")]
    pub amount: f64,
    #[serde(default)]
    pub frequency: Option<String>,
    #[serde(default)]
    pub payer: Option<String>,
}

impl From<AddItem> for NewItem {
    fn from(value: AddItem) -> Self {
        NewItem {
            name: value.name,
            amount: value.amount,
            frequency: value.frequency.as_deref().map(Frequency::parse),
            payer: value.payer,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UpdateItem {
    pub id: ItemId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "coerce_optional_amount")]
    pub amount: Option<f64>,
    #[serde(default)]
    pub frequency: Option<String>,
    #[serde(default)]
    pub payer: Option<String>,
}

impl UpdateItem {
    pub fn patch(&self) -> ItemPatch {
        ItemPatch {
            name: self.name.clone(),
            amount: self.amount,
            frequency: self.frequency.as_deref().map(Frequency::parse),
            payer: self.payer.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UpdateItemByName {
    pub name: String,
    #[serde(default)]
    pub new_name: Option<String>,
    #[serde(default, deserialize_with = "coerce_optional_amount")]
    pub amount: Option<f64>,
    #[serde(default)]
    pub frequency: Option<String>,
    #[serde(default)]
    pub payer: Option<String>,
}

impl UpdateItemByName {
    pub fn patch(&self) -> ItemPatch {
        ItemPatch {
            name: self.new_name.clone(),
            amount: self.amount,
            frequency: self.frequency.as_deref().map(Frequency::parse),
            payer: self.payer.clone(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawAmount {
    Number(f64),
    Text(String),
}

impl RawAmount {
    /// Only finite values are accepted; NaN and infinities cannot be stored as JSON.
    fn into_amount(self) -> Result<f64, String> {
        let (value, shown) = match self {
            RawAmount::Number(value) => (value, value.to_string()),
            RawAmount::Text(text) => {
                let value = text
                    .trim()
                    .replace(',', ".")
                    .parse::<f64>()
                    .map_err(|_| format!("`{text}` is not a number"))?;
                (value, text)
            }
        };
        if value.is_finite() {
            Ok(value)
        } else {
            Err(format!("`{shown}` is not a finite amount"))
        }
    }
}

fn coerce_amount<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    RawAmount::deserialize(deserializer)?
        .into_amount()
        .map_err(de::Error::custom)
}

fn coerce_optional_amount<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<RawAmount>::deserialize(deserializer)? {
        Some(raw) => raw.into_amount().map(Some).map_err(de::Error::custom),
        None => Ok(None),
    }
}
