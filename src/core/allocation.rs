//! Monthly normalization and cost splitting.
//!
//! All figures here are kept at full precision; rounding happens in [`round_currency`]
//! only when a value is emitted.

use serde::{ser::SerializeMap, Serialize, Serializer};

use crate::domain::{BudgetDocument, BudgetItem, Frequency, Participants};

/// Converts an amount billed at `frequency` into its monthly equivalent.
pub fn monthly_amount(amount: f64, frequency: &Frequency) -> f64 {
    amount * frequency.monthly_factor()
}

/// Two-decimal rounding applied to published values. Ties round to even, so
/// `0.125` becomes `0.12`.
pub fn round_currency(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

/// Ordered participant → amount mapping. Serializes as a JSON object in participant
/// order.
#[derive(Debug, Clone, PartialEq)]
pub struct Transfers(Vec<(String, f64)>);

impl Transfers {
    pub fn zeroed(participants: &Participants) -> Self {
        Self(participants.iter().map(|name| (name.clone(), 0.0)).collect())
    }

    pub fn get(&self, participant: &str) -> Option<f64> {
        self.0
            .iter()
            .find(|(name, _)| name == participant)
            .map(|(_, amount)| *amount)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(name, amount)| (name.as_str(), *amount))
    }

    pub fn total(&self) -> f64 {
        self.0.iter().map(|(_, amount)| amount).sum()
    }

    pub fn accumulate(&mut self, other: &Transfers) {
        for (name, amount) in &mut self.0 {
            if let Some(extra) = other.get(name) {
                *amount += extra;
            }
        }
    }

    pub fn rounded(&self) -> Self {
        Self(
            self.0
                .iter()
                .map(|(name, amount)| (name.clone(), round_currency(*amount)))
                .collect(),
        )
    }
}

impl Serialize for Transfers {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, amount) in &self.0 {
            map.serialize_entry(name, amount)?;
        }
        map.end()
    }
}

/// Splits a monthly amount between participants.
///
/// Group payers share evenly; a payer naming a participant carries the whole amount;
/// a payer naming nobody (for example a removed participant) falls back to the even
/// split.
pub fn split(monthly: f64, payer: &str, participants: &Participants) -> Transfers {
    let mut transfers = Transfers::zeroed(participants);
    let individual = if participants.is_empty() || participants.is_group_payer(payer) {
        None
    } else {
        participants.find(payer)
    };

    match individual {
        Some(name) => {
            for (candidate, amount) in &mut transfers.0 {
                if candidate.as_str() == name {
                    *amount = monthly;
                }
            }
        }
        None => {
            let share = monthly / participants.len().max(1) as f64;
            for (_, amount) in &mut transfers.0 {
                *amount = share;
            }
        }
    }
    transfers
}

/// Full-precision computation for one item.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemBreakdown {
    pub monthly: f64,
    pub transfers: Transfers,
}

impl ItemBreakdown {
    pub fn compute(item: &BudgetItem, participants: &Participants) -> Self {
        let monthly = monthly_amount(item.amount, &item.frequency);
        let transfers = split(monthly, &item.payer, participants);
        Self { monthly, transfers }
    }
}

/// Full-precision totals across the whole document.
#[derive(Debug, Clone, PartialEq)]
pub struct BudgetTotals {
    pub monthly: f64,
    pub per_participant: Transfers,
}

impl BudgetTotals {
    pub fn compute(document: &BudgetDocument) -> Self {
        let mut monthly = 0.0;
        let mut per_participant = Transfers::zeroed(&document.participants);
        for item in &document.items {
            let breakdown = ItemBreakdown::compute(item, &document.participants);
            monthly += breakdown.monthly;
            per_participant.accumulate(&breakdown.transfers);
        }
        Self {
            monthly,
            per_participant,
        }
    }
}
