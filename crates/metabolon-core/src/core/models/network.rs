use super::enzyme::Enzyme;
use super::gene::Gene;
use super::molecule::Molecule;
use serde::{Deserialize, Serialize};

/// A complete set of entities ready to be handed to a simulator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Network {
    pub molecules: Vec<Molecule>,
    pub enzymes: Vec<Enzyme>,
    pub genes: Vec<Gene>,
}

impl Network {
    pub fn reaction_count(&self) -> usize {
        self.enzymes.iter().map(|e| e.reactions.len()).sum()
    }

    pub fn molecule(&self, name: &str) -> Option<&Molecule> {
        self.molecules.iter().find(|m| m.name == name)
    }

    pub fn enzyme(&self, id: &str) -> Option<&Enzyme> {
        self.enzymes.iter().find(|e| e.id == id)
    }

    pub fn gene(&self, enzyme_id: &str) -> Option<&Gene> {
        self.genes.iter().find(|g| g.enzyme_id == enzyme_id)
    }
}
