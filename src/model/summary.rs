use serde::{Deserialize, Serialize};

/// Outcome of one crawled unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitOutcome {
    /// Unit (or batch-prefixed) name
    pub name: String,
    /// URL the unit was crawled from
    pub url: String,
    /// Records not seen before in this ledger scope
    pub saved: usize,
}

impl UnitOutcome {
    pub fn new(name: impl Into<String>, url: impl Into<String>, saved: usize) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            saved,
        }
    }
}

/// Ordered per-unit outcomes of one crawl invocation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunSummary {
    outcomes: Vec<UnitOutcome>,
}

impl RunSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, outcome: UnitOutcome) {
        self.outcomes.push(outcome);
    }

    pub fn extend(&mut self, other: RunSummary) {
        self.outcomes.extend(other.outcomes);
    }

    pub fn outcomes(&self) -> &[UnitOutcome] {
        &self.outcomes
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Sum of saved counts over all units
    pub fn total_saved(&self) -> usize {
        self.outcomes.iter().map(|o| o.saved).sum()
    }

    /// `(name, url, saved)` tuples in crawl order
    pub fn as_tuples(&self) -> Vec<(&str, &str, usize)> {
        self.outcomes
            .iter()
            .map(|o| (o.name.as_str(), o.url.as_str(), o.saved))
            .collect()
    }
}

impl IntoIterator for RunSummary {
    type Item = UnitOutcome;
    type IntoIter = std::vec::IntoIter<UnitOutcome>;

    fn into_iter(self) -> Self::IntoIter {
        self.outcomes.into_iter()
    }
}
