use crate::core::models::Concentrations;
use crate::core::models::enzyme::Enzyme;
use crate::core::models::gene::Gene;
use crate::core::models::molecule::Molecule;
use crate::core::models::reaction::Reaction;
use std::collections::BTreeMap;

/// Immutable view of the whole network, taken once at the start of a tick.
///
/// Every calculator in a tick reads the same snapshot, so none of them can observe a
/// partial update made by another.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub time: f64,
    pub molecule_concentrations: Concentrations,
    pub enzyme_concentrations: BTreeMap<String, f64>,
    pub molecules: BTreeMap<String, Molecule>,
    pub enzymes: BTreeMap<String, Enzyme>,
    pub genes: BTreeMap<String, Gene>,
    pub reactions: Vec<Reaction>,
}

impl Snapshot {
    pub fn capture(
        time: f64,
        molecules: &BTreeMap<String, Molecule>,
        enzymes: &BTreeMap<String, Enzyme>,
        genes: &BTreeMap<String, Gene>,
    ) -> Self {
        let molecule_concentrations = molecules
            .iter()
            .map(|(name, m)| (name.clone(), m.concentration))
            .collect();
        let enzyme_concentrations = enzymes
            .iter()
            .map(|(id, e)| (id.clone(), e.concentration))
            .collect();
        let reactions = enzymes
            .values()
            .flat_map(|e| e.reactions.iter().cloned())
            .collect();

        Self {
            time,
            molecule_concentrations,
            enzyme_concentrations,
            molecules: molecules.clone(),
            enzymes: enzymes.clone(),
            genes: genes.clone(),
            reactions,
        }
    }

    pub fn molecule_concentration(&self, name: &str) -> f64 {
        self.molecule_concentrations.get(name).copied().unwrap_or(0.0)
    }

    pub fn enzyme_concentration(&self, id: &str) -> f64 {
        self.enzyme_concentrations.get(id).copied().unwrap_or(0.0)
    }

    /// Enzyme concentration scaled by its allosteric modulation factor.
    pub fn effective_enzyme_concentration(&self, enzyme: &Enzyme) -> f64 {
        self.enzyme_concentration(&enzyme.id) * enzyme.modulation_factor(&self.molecule_concentrations)
    }

    pub fn enzyme_count(&self) -> usize {
        self.enzymes.len()
    }
}
