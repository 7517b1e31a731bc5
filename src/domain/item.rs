use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque identifier assigned to a budget item at creation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ItemId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ItemId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Billing cycle of an item. Unrecognized cycles are kept verbatim (lower-cased) and
/// amortize like a monthly item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Frequency {
    Monthly,
    Quarterly,
    Yearly,
    Other(String),
}

impl Frequency {
    pub fn parse(raw: &str) -> Self {
        let lowered = raw.trim().to_lowercase();
        match lowered.as_str() {
            "" | "monthly" => Frequency::Monthly,
            "quarterly" => Frequency::Quarterly,
            "yearly" => Frequency::Yearly,
            _ => Frequency::Other(lowered),
        }
    }

    /// Multiplier that converts one billing-cycle amount into a monthly amount.
    pub fn monthly_factor(&self) -> f64 {
        match self {
            Frequency::Monthly | Frequency::Other(_) => 1.0,
            Frequency::Quarterly => 1.0 / 3.0,
            Frequency::Yearly => 1.0 / 12.0,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Frequency::Monthly => "monthly",
            Frequency::Quarterly => "quarterly",
            Frequency::Yearly => "yearly",
            Frequency::Other(raw) => raw,
        }
    }
}

impl Default for Frequency {
    fn default() -> Self {
        Frequency::Monthly
    }
}

impl From<String> for Frequency {
    fn from(value: String) -> Self {
        Frequency::parse(&value)
    }
}

impl From<Frequency> for String {
    fn from(value: Frequency) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A recurring expense tracked by the household.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetItem {
    pub id: ItemId,
    pub name: String,
    pub amount: f64,
    #[serde(default)]
    pub frequency: Frequency,
    #[serde(default)]
    pub payer: String,
}

impl BudgetItem {
    pub fn new(
        name: impl Into<String>,
        amount: f64,
        frequency: Frequency,
        payer: impl Into<String>,
    ) -> Self {
        Self {
            id: ItemId::generate(),
            name: name.into().trim().to_string(),
            amount,
            frequency,
            payer: payer.into().trim().to_string(),
        }
    }

    /// Case-insensitive, whitespace-trimmed comparison used by the by-name commands.
    pub fn name_matches(&self, name: &str) -> bool {
        self.name.trim().to_lowercase() == name.trim().to_lowercase()
    }

    pub fn apply(&mut self, patch: &ItemPatch) {
        if let Some(name) = &patch.name {
            self.name = name.trim().to_string();
        }
        if let Some(amount) = patch.amount {
            self.amount = amount;
        }
        if let Some(frequency) = &patch.frequency {
            self.frequency = frequency.clone();
        }
        if let Some(payer) = &patch.payer {
            self.payer = payer.trim().to_string();
        }
    }
}

/// Input for creating an item. Missing frequency means monthly; missing payer means
/// the whole group.
#[derive(Debug, Clone, PartialEq)]
pub struct NewItem {
    pub name: String,
    pub amount: f64,
    pub frequency: Option<Frequency>,
    pub payer: Option<String>,
}

impl NewItem {
    pub fn new(name: impl Into<String>, amount: f64) -> Self {
        Self {
            name: name.into(),
            amount,
            frequency: None,
            payer: None,
        }
    }

    pub fn frequency(mut self, frequency: Frequency) -> Self {
        self.frequency = Some(frequency);
        self
    }

    pub fn payer(mut self, payer: impl Into<String>) -> Self {
        self.payer = Some(payer.into());
        self
    }
}

/// Partial update for an existing item; `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemPatch {
    pub name: Option<String>,
    pub amount: Option<f64>,
    pub frequency: Option<Frequency>,
    pub payer: Option<String>,
}

impl ItemPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.amount.is_none()
            && self.frequency.is_none()
            && self.payer.is_none()
    }

    pub fn with_amount(mut self, amount: f64) -> Self {
        self.amount = Some(amount);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frequency_parsing_is_case_insensitive() {
        assert_eq!(Frequency::parse("Quarterly"), Frequency::Quarterly);
        assert_eq!(Frequency::parse(" YEARLY "), Frequency::Yearly);
        assert_eq!(Frequency::parse(""), Frequency::Monthly);
    }

    #[test]
    fn unknown_frequency_is_kept_lowercased() {
        let freq = Frequency::parse("Weekly");
        assert_eq!(freq.as_str(), "weekly");
        assert_eq!(freq.monthly_factor(), 1.0);
    }

    #[test]
    fn frequency_serializes_as_plain_string() {
        let json = serde_json::to_string(&Frequency::Yearly).unwrap();
        assert_eq!(json, "\"yearly\"");
        let back: Frequency = serde_json::from_str("\"BOGUS\"").unwrap();
        assert_eq!(back, Frequency::Other("bogus".into()));
    }

    #[test]
    fn new_item_trims_name() {
        let item = BudgetItem::new("  Rent ", 500.0, Frequency::Monthly, "Begge");
        assert_eq!(item.name, "Rent");
        assert!(item.name_matches("rent"));
        assert!(!item.name_matches("rental"));
    }

    #[test]
    fn patch_only_touches_given_fields() {
        let mut item = BudgetItem::new("Internet", 300.0, Frequency::Monthly, "Yasmin");
        item.apply(&ItemPatch::default().with_amount(320.0));
        assert_eq!(item.amount, 320.0);
        assert_eq!(item.name, "Internet");
        assert_eq!(item.payer, "Yasmin");
    }
}
