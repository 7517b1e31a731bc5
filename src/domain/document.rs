use serde::{Deserialize, Serialize};

use super::{BudgetItem, ItemId, Participants};

/// The single persisted document: every item plus the participant list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BudgetDocument {
    #[serde(default)]
    pub items: Vec<BudgetItem>,
    #[serde(default)]
    pub participants: Participants,
}

impl BudgetDocument {
    /// Repairs a freshly loaded document: an empty or unusable participant list falls
    /// back to the default pair.
    pub fn sanitized(mut self) -> Self {
        self.participants = Participants::from_names(self.participants.names())
            .unwrap_or_default();
        self
    }

    pub fn item(&self, id: &ItemId) -> Option<&BudgetItem> {
        self.items.iter().find(|item| &item.id == id)
    }

    pub fn item_mut(&mut self, id: &ItemId) -> Option<&mut BudgetItem> {
        self.items.iter_mut().find(|item| &item.id == id)
    }

    /// Re-applies the group-label rule to every item's payer.
    pub fn normalize_payers(&mut self) {
        let participants = &self.participants;
        for item in &mut self.items {
            item.payer = participants.normalize_payer(&item.payer);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_load_as_defaults() {
        let doc: BudgetDocument = serde_json::from_str("{}").unwrap();
        let doc = doc.sanitized();
        assert!(doc.items.is_empty());
        assert_eq!(doc.participants, Participants::default());
    }

    #[test]
    fn empty_participant_list_loads_as_default() {
        let doc: BudgetDocument =
            serde_json::from_str(r#"{"items": [], "participants": []}"#).unwrap();
        assert_eq!(doc.sanitized().participants, Participants::default());
    }

    #[test]
    fn legacy_item_payload_is_accepted() {
        let raw = r#"{
            "items": [{"id": "a1", "name": "Rent", "amount": 9000, "frequency": "Monthly", "payer": "Begge"}],
            "participants": ["Christian", "Yasmin"]
        }"#;
        let doc: BudgetDocument = serde_json::from_str(raw).unwrap();
        let item = doc.item(&ItemId::from("a1")).unwrap();
        assert_eq!(item.amount, 9000.0);
        assert_eq!(item.frequency.as_str(), "monthly");
    }
}
