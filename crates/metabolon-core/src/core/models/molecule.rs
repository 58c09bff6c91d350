use serde::{Deserialize, Serialize};

/// A small molecule (metabolite) tracked by name.
///
/// Concentrations are in mM. The structural code is an ordered sequence of small
/// integers that only the mutation system interprets, either to measure how related
/// two molecules are or to derive new molecules from existing ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Molecule {
    pub name: String,
    pub concentration: f64,
    pub initial_concentration: f64,
    pub is_locked: bool,
    /// Potential energy in kJ/mol. Informational only.
    pub potential_energy: f64,
    pub structural_code: Vec<u8>,
}

impl Molecule {
    pub fn new(name: &str, concentration: f64) -> Self {
        let concentration = concentration.max(0.0);
        Self {
            name: name.to_string(),
            concentration,
            initial_concentration: concentration,
            is_locked: false,
            potential_energy: 0.0,
            structural_code: Vec::new(),
        }
    }

    pub fn with_potential_energy(mut self, energy: f64) -> Self {
        self.potential_energy = energy;
        self
    }

    pub fn with_structural_code(mut self, code: Vec<u8>) -> Self {
        self.structural_code = code;
        self
    }

    pub fn with_locked(mut self, locked: bool) -> Self {
        self.is_locked = locked;
        self
    }

    pub fn set_concentration(&mut self, value: f64) {
        self.concentration = value.max(0.0);
    }

    pub fn reset(&mut self) {
        self.concentration = self.initial_concentration;
    }

    /// Similarity of the two structural codes in `[0, 1]`, where 1 means identical.
    pub fn structural_similarity(&self, other: &Molecule) -> f64 {
        crate::core::utils::structural::similarity(&self.structural_code, &other.structural_code)
    }
}
