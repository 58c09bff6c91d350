use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineageRecord {
    pub enzyme_id: String,
    pub parent: Option<String>,
    /// Founders are generation 0.
    pub generation: u32,
    pub birth_time: f64,
    pub death_time: Option<f64>,
    pub death_cause: Option<String>,
}

impl LineageRecord {
    pub fn is_alive(&self) -> bool {
        self.death_time.is_none()
    }
}

/// Ancestry of every enzyme that ever existed in a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineageTree {
    records: BTreeMap<String, LineageRecord>,
}

impl LineageTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an enzyme present from the start. Returns `false`, leaving the tree
    /// untouched, if the id already has a record.
    pub fn register_founder(&mut self, enzyme_id: &str, time: f64) -> bool {
        if self.records.contains_key(enzyme_id) {
            return false;
        }
        self.records.insert(
            enzyme_id.to_string(),
            LineageRecord {
                enzyme_id: enzyme_id.to_string(),
                parent: None,
                generation: 0,
                birth_time: time,
                death_time: None,
                death_cause: None,
            },
        );
        true
    }

    /// Records a birth one generation below `parent`. A child without a known parent
    /// starts a new line at generation 1. Ids are never reused: returns `false` if the
    /// id already has a record, living or dead.
    pub fn record_birth(&mut self, enzyme_id: &str, parent: Option<&str>, time: f64) -> bool {
        if self.records.contains_key(enzyme_id) {
            return false;
        }
        let generation = parent
            .and_then(|p| self.records.get(p))
            .map_or(1, |p| p.generation + 1);
        self.records.insert(
            enzyme_id.to_string(),
            LineageRecord {
                enzyme_id: enzyme_id.to_string(),
                parent: parent.map(str::to_string),
                generation,
                birth_time: time,
                death_time: None,
                death_cause: None,
            },
        );
        true
    }

    /// Marks the enzyme dead. Unknown or already dead enzymes are left untouched.
    pub fn record_death(&mut self, enzyme_id: &str, time: f64, cause: &str) {
        if let Some(record) = self.records.get_mut(enzyme_id) {
            if record.is_alive() {
                record.death_time = Some(time);
                record.death_cause = Some(cause.to_string());
            }
        }
    }

    pub fn contains(&self, enzyme_id: &str) -> bool {
        self.records.contains_key(enzyme_id)
    }

    /// Every id that has ever been recorded, living or dead.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }

    pub fn get(&self, enzyme_id: &str) -> Option<&LineageRecord> {
        self.records.get(enzyme_id)
    }

    /// Parent, grandparent, ... of `enzyme_id`, nearest first.
    pub fn ancestors(&self, enzyme_id: &str) -> Vec<&str> {
        let mut chain = Vec::new();
        let mut current = self.records.get(enzyme_id).and_then(|r| r.parent.as_deref());
        while let Some(id) = current {
            if chain.contains(&id) {
                break;
            }
            chain.push(id);
            current = self.records.get(id).and_then(|r| r.parent.as_deref());
        }
        chain
    }

    pub fn living_count(&self) -> usize {
        self.records.values().filter(|r| r.is_alive()).count()
    }

    pub fn max_generation(&self) -> u32 {
        self.records.values().map(|r| r.generation).max().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> impl Iterator<Item = &LineageRecord> {
        self.records.values()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}
