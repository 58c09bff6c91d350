use super::fitness::FitnessScore;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EliminationReason {
    LowFitness,
    Depleted,
    Redundant { rival: String },
}

impl fmt::Display for EliminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EliminationReason::LowFitness => f.write_str("low fitness"),
            EliminationReason::Depleted => f.write_str("depleted"),
            EliminationReason::Redundant { rival } => write!(f, "redundant with {}", rival),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Elimination {
    pub enzyme_id: String,
    pub reason: EliminationReason,
    pub fitness: f64,
}

/// Multiplies the gene's basal rate by `factor`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Boost {
    pub enzyme_id: String,
    pub factor: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Competition {
    pub winner: String,
    pub loser: String,
    pub winner_fitness: f64,
    pub loser_fitness: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdaptiveAdjustment {
    pub enzyme_id: String,
    pub old_basal_rate: f64,
    pub new_basal_rate: f64,
}

/// Everything the evolution system proposes for one step. Nothing here has been applied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionResult {
    pub fitness: BTreeMap<String, FitnessScore>,
    pub rolling_fitness: BTreeMap<String, f64>,
    pub eliminations: Vec<Elimination>,
    pub boosts: Vec<Boost>,
    pub competitions: Vec<Competition>,
    pub competition_losers: BTreeSet<String>,
    pub adaptive_adjustments: Vec<AdaptiveAdjustment>,
}

impl SelectionResult {
    /// `true` when no action is proposed. Fitness scores alone do not count.
    pub fn is_empty(&self) -> bool {
        self.eliminations.is_empty()
            && self.boosts.is_empty()
            && self.competitions.is_empty()
            && self.adaptive_adjustments.is_empty()
    }

    pub fn is_eliminated(&self, enzyme_id: &str) -> bool {
        self.eliminations.iter().any(|e| e.enzyme_id == enzyme_id)
    }

    pub fn mean_fitness(&self) -> Option<f64> {
        if self.fitness.is_empty() {
            return None;
        }
        Some(self.fitness.values().map(|f| f.total).sum::<f64>() / self.fitness.len() as f64)
    }
}

/// Cumulative count of applied selection actions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionCounts {
    pub eliminations: u64,
    pub boosts: u64,
    pub competitions: u64,
    pub adaptive_adjustments: u64,
}

impl SelectionCounts {
    pub fn record(&mut self, result: &SelectionResult) {
        self.eliminations += result.eliminations.len() as u64;
        self.boosts += result.boosts.len() as u64;
        self.competitions += result.competitions.len() as u64;
        self.adaptive_adjustments += result.adaptive_adjustments.len() as u64;
    }
}
