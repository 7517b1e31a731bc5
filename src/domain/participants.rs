use serde::{Deserialize, Serialize};

pub const DEFAULT_PARTICIPANTS: [&str; 2] = ["Christian", "Yasmin"];
pub const PAIR_LABEL: &str = "Begge";
pub const GROUP_LABEL: &str = "Alle";

const GROUP_PREFIXES: [&str; 2] = ["beg", "all"];
const RESERVED_NAMES: [&str; 2] = ["begge", "alle"];

/// Ordered list of people sharing the budget. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Participants(Vec<String>);

impl Participants {
    /// Builds a participant list from raw input: names are trimmed, blank and reserved
    /// group labels are dropped, duplicates are removed case-insensitively keeping the
    /// first occurrence. Returns `None` when nothing usable remains.
    pub fn from_names<I, S>(names: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen: Vec<String> = Vec::new();
        let mut kept = Vec::new();
        for raw in names {
            let name = raw.as_ref().trim();
            if name.is_empty() {
                continue;
            }
            let lowered = name.to_lowercase();
            if RESERVED_NAMES.contains(&lowered.as_str()) || seen.contains(&lowered) {
                continue;
            }
            seen.push(lowered);
            kept.push(name.to_string());
        }
        if kept.is_empty() {
            None
        } else {
            Some(Self(kept))
        }
    }

    pub fn names(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.0.iter()
    }

    /// "Begge" for a couple, "Alle" otherwise.
    pub fn group_label(&self) -> &'static str {
        if self.0.len() == 2 {
            PAIR_LABEL
        } else {
            GROUP_LABEL
        }
    }

    /// Exact case-insensitive lookup of a participant by name.
    pub fn find(&self, name: &str) -> Option<&str> {
        let needle = name.trim().to_lowercase();
        self.0
            .iter()
            .find(|candidate| candidate.to_lowercase() == needle)
            .map(String::as_str)
    }

    /// Whether a payer value means "split across everyone". A payer that names a
    /// current participant is never a group payer, even if it shares a prefix.
    pub fn is_group_payer(&self, payer: &str) -> bool {
        if self.find(payer).is_some() {
            return false;
        }
        has_group_prefix(payer)
    }

    /// Rewrites group aliases to the current group label; individual names are kept
    /// verbatim (trimmed), including names of removed participants.
    pub fn normalize_payer(&self, payer: &str) -> String {
        let trimmed = payer.trim();
        if trimmed.is_empty() || self.is_group_payer(trimmed) {
            self.group_label().to_string()
        } else {
            trimmed.to_string()
        }
    }
}

impl Default for Participants {
    fn default() -> Self {
        Self(DEFAULT_PARTICIPANTS.iter().map(|name| name.to_string()).collect())
    }
}

impl<'a> IntoIterator for &'a Participants {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

fn has_group_prefix(payer: &str) -> bool {
    let lowered = payer.trim().to_lowercase();
    GROUP_PREFIXES
        .iter()
        .any(|prefix| lowered.starts_with(prefix))
}
