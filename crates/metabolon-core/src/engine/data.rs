use super::evolution::selection::SelectionCounts;
use super::locks::LockCategory;
use super::mutation::changes::MutationCounts;
use crate::core::models::cell::Cell;
use crate::core::models::enzyme::Enzyme;
use crate::core::models::gene::Gene;
use crate::core::models::molecule::Molecule;
use crate::core::models::reaction::{Reaction, ReactionState};
use serde::Serialize;
use std::collections::{BTreeMap, VecDeque};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReactionView {
    pub enzyme_id: String,
    pub reaction: Reaction,
    pub state: ReactionState,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ProteinStats {
    pub count: usize,
    pub total_concentration: f64,
    pub mean_concentration: f64,
    pub degradable_count: usize,
}

impl ProteinStats {
    pub fn from_enzymes<'a>(enzymes: impl IntoIterator<Item = &'a Enzyme>) -> Self {
        let mut stats = Self::default();
        for enzyme in enzymes {
            stats.count += 1;
            stats.total_concentration += enzyme.concentration;
            if enzyme.is_degradable {
                stats.degradable_count += 1;
            }
        }
        if stats.count > 0 {
            stats.mean_concentration = stats.total_concentration / stats.count as f64;
        }
        stats
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct EvolutionStats {
    pub selection: SelectionCounts,
    /// Mean total fitness at the last evaluated step.
    pub mean_fitness: Option<f64>,
    pub max_generation: u32,
    pub living_lineages: usize,
}

/// Full-state broadcast produced once per step for observers. It is a copy; editing it
/// has no effect on the simulation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationData {
    pub time: f64,
    pub molecules: BTreeMap<String, Molecule>,
    pub enzymes: BTreeMap<String, Enzyme>,
    pub reactions: Vec<ReactionView>,
    pub genes: BTreeMap<String, Gene>,
    pub cell: Cell,
    pub molecule_history: BTreeMap<String, VecDeque<f64>>,
    pub enzyme_history: BTreeMap<String, VecDeque<f64>>,
    pub time_history: VecDeque<f64>,
    pub protein_stats: ProteinStats,
    pub mutation_stats: MutationCounts,
    pub evolution_stats: EvolutionStats,
    pub locks: Vec<LockCategory>,
    pub is_paused: bool,
}
