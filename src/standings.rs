//! Final tournament standings
//!
//! Winner first, then everyone else in reverse elimination order (the last
//! entrant knocked out places second).

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::TournamentError;

/// Number of places shown on the podium
pub const PODIUM_SIZE: usize = 3;

/// A single standings row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandingEntry {
    /// 1-indexed final place
    pub place: usize,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Standings {
    pub entries: Vec<StandingEntry>,
}

impl Standings {
    /// Build from the winner (if decided) and the elimination order
    pub fn new(winner: Option<&str>, elimination_order: &[String]) -> Self {
        let labels = winner
            .into_iter()
            .map(str::to_string)
            .chain(elimination_order.iter().rev().cloned());
        let entries = labels
            .enumerate()
            .map(|(i, label)| StandingEntry { place: i + 1, label })
            .collect();
        Self { entries }
    }

    pub fn winner(&self) -> Option<&str> {
        self.entries.first().map(|e| e.label.as_str())
    }

    /// Top three (or fewer)
    pub fn podium(&self) -> &[StandingEntry] {
        &self.entries[..self.entries.len().min(PODIUM_SIZE)]
    }

    /// Final place of a label, case-insensitive
    pub fn place_of(&self, label: &str) -> Option<usize> {
        let label = label.trim();
        self.entries
            .iter()
            .find(|e| e.label.eq_ignore_ascii_case(label))
            .map(|e| e.place)
    }

    pub fn labels(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.label.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write the standings as JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), TournamentError> {
        let json = self.to_json()?;
        std::fs::write(path.as_ref(), json)?;
        log::info!("Standings saved ({} entries)", self.entries.len());
        Ok(())
    }
}
