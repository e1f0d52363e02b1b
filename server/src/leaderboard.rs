//! Per-country win/loss/draw tallies. In-memory only; rebuilt empty on start.

use rps_protocol::{CountryTag, LeaderboardEntry, Outcome};
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct Leaderboard {
    /// First-sighting order; stable sorts fall back on it for equal wins.
    entries: Vec<LeaderboardEntry>,
    index: HashMap<String, usize>,
}

impl Leaderboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the entry for `tag`, creating a zeroed one on first sighting.
    /// The display name and flag of an existing entry are never rewritten.
    pub fn ensure(&mut self, tag: &CountryTag) -> &mut LeaderboardEntry {
        let idx = match self.index.get(&tag.country_code) {
            Some(&idx) => idx,
            None => {
                self.entries.push(LeaderboardEntry::new(tag));
                let idx = self.entries.len() - 1;
                self.index.insert(tag.country_code.clone(), idx);
                idx
            }
        };
        &mut self.entries[idx]
    }

    /// Applies one resolved round. `first` sat in seat 1.
    pub fn record_outcome(&mut self, first: &CountryTag, second: &CountryTag, outcome: Outcome) {
        match outcome {
            Outcome::Player1 => {
                self.ensure(first).wins += 1;
                self.ensure(second).losses += 1;
            }
            Outcome::Player2 => {
                self.ensure(second).wins += 1;
                self.ensure(first).losses += 1;
            }
            Outcome::Draw => {
                self.ensure(first).draws += 1;
                self.ensure(second).draws += 1;
            }
        }
    }

    /// Top `limit` entries by wins, descending. Equal win counts keep
    /// first-sighting order.
    pub fn query(&self, limit: usize) -> Vec<LeaderboardEntry> {
        let mut ranked: Vec<&LeaderboardEntry> = self.entries.iter().collect();
        ranked.sort_by(|a, b| b.wins.cmp(&a.wins));
        ranked.into_iter().take(limit).cloned().collect()
    }

    pub fn query_one(&self, country_code: &str) -> Option<&LeaderboardEntry> {
        self.index.get(country_code).map(|&idx| &self.entries[idx])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
