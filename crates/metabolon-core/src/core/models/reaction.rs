use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

pub const DEFAULT_TEMPERATURE: f64 = 310.0;

/// Instantaneous kinetic and energetic state of a reaction.
///
/// These values are recomputed every tick and are never a source of truth,
/// so they are not serialized with the reaction.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ReactionState {
    pub forward_rate: f64,
    pub reverse_rate: f64,
    pub delta_g_actual: f64,
    pub keq: f64,
    pub useful_work: f64,
    pub heat_generated: f64,
}

impl ReactionState {
    #[inline]
    pub fn net_rate(&self) -> f64 {
        self.forward_rate - self.reverse_rate
    }
}

/// A stoichiometric reaction catalyzed by exactly one enzyme.
///
/// A reaction without substrates is a source, one without products is a sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reaction {
    pub id: String,
    pub name: String,
    pub substrates: BTreeMap<String, f64>,
    pub products: BTreeMap<String, f64>,
    /// mM/s per mM of enzyme.
    pub vmax: f64,
    /// mM.
    pub km: f64,
    /// Standard free energy change in kJ/mol.
    pub delta_g: f64,
    /// K.
    pub temperature: f64,
    /// Fraction of released energy captured as useful work.
    pub reaction_efficiency: f64,
    pub is_irreversible: bool,
    #[serde(skip)]
    pub state: ReactionState,
}

impl Reaction {
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            substrates: BTreeMap::new(),
            products: BTreeMap::new(),
            vmax: 1.0,
            km: 0.5,
            delta_g: 0.0,
            temperature: DEFAULT_TEMPERATURE,
            reaction_efficiency: 0.5,
            is_irreversible: false,
            state: ReactionState::default(),
        }
    }

    pub fn with_substrate(mut self, molecule: &str, coefficient: f64) -> Self {
        self.substrates.insert(molecule.to_string(), coefficient);
        self
    }

    pub fn with_product(mut self, molecule: &str, coefficient: f64) -> Self {
        self.products.insert(molecule.to_string(), coefficient);
        self
    }

    pub fn with_kinetics(mut self, vmax: f64, km: f64) -> Self {
        self.vmax = vmax;
        self.km = km;
        self
    }

    pub fn with_delta_g(mut self, delta_g: f64) -> Self {
        self.delta_g = delta_g;
        self
    }

    pub fn with_efficiency(mut self, efficiency: f64) -> Self {
        self.reaction_efficiency = efficiency.clamp(0.0, 1.0);
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn irreversible(mut self) -> Self {
        self.is_irreversible = true;
        self
    }

    #[inline]
    pub fn is_source(&self) -> bool {
        self.substrates.is_empty()
    }

    #[inline]
    pub fn is_sink(&self) -> bool {
        self.products.is_empty()
    }

    #[inline]
    pub fn net_rate(&self) -> f64 {
        self.state.net_rate()
    }

    /// Names of every substrate and product.
    pub fn molecules(&self) -> impl Iterator<Item = &str> {
        self.substrates
            .keys()
            .chain(self.products.keys())
            .map(String::as_str)
    }

    pub fn involves(&self, molecule: &str) -> bool {
        self.substrates.contains_key(molecule) || self.products.contains_key(molecule)
    }

    /// Sorted substrate and product name sets, ignoring stoichiometry.
    pub fn signature(&self) -> (BTreeSet<String>, BTreeSet<String>) {
        (
            self.substrates.keys().cloned().collect(),
            self.products.keys().cloned().collect(),
        )
    }
}
