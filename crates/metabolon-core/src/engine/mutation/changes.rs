use crate::core::models::enzyme::Enzyme;
use crate::core::models::gene::{Gene, RegulatoryElement};
use crate::core::models::molecule::Molecule;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::AddAssign;

/// Safe range of each mutable parameter.
pub mod limits {
    pub const VMAX: (f64, f64) = (0.01, 100.0);
    pub const KM: (f64, f64) = (0.001, 100.0);
    pub const EFFICIENCY: (f64, f64) = (0.01, 1.0);
    pub const HALF_LIFE: (f64, f64) = (10.0, 3600.0);
    pub const DELTA_G: (f64, f64) = (-60.0, 30.0);
    pub const KD: (f64, f64) = (0.001, 100.0);
    pub const MAX_FOLD: (f64, f64) = (1.0, 50.0);
    pub const HILL: (f64, f64) = (0.5, 4.0);
    pub const BASAL_RATE: (f64, f64) = (1e-6, 10.0);

    #[inline]
    pub fn clamp(value: f64, (low, high): (f64, f64)) -> f64 {
        value.clamp(low, high)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EnzymeParameter {
    Vmax { reaction_id: String },
    Km { reaction_id: String },
    Efficiency { reaction_id: String },
    DeltaG { reaction_id: String },
    HalfLife,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterChange {
    pub parameter: EnzymeParameter,
    pub old_value: f64,
    pub new_value: f64,
}

impl ParameterChange {
    /// Writes the new value into `enzyme`. A change aimed at a reaction the enzyme no
    /// longer owns is ignored.
    pub fn apply_to(&self, enzyme: &mut Enzyme) {
        let value = self.new_value;
        let reaction_id = match &self.parameter {
            EnzymeParameter::HalfLife => {
                enzyme.half_life = value;
                return;
            }
            EnzymeParameter::Vmax { reaction_id }
            | EnzymeParameter::Km { reaction_id }
            | EnzymeParameter::Efficiency { reaction_id }
            | EnzymeParameter::DeltaG { reaction_id } => reaction_id,
        };
        let Some(reaction) = enzyme.reactions.iter_mut().find(|r| &r.id == reaction_id) else {
            return;
        };
        match self.parameter {
            EnzymeParameter::Vmax { .. } => reaction.vmax = value,
            EnzymeParameter::Km { .. } => reaction.km = value,
            EnzymeParameter::Efficiency { .. } => reaction.reaction_efficiency = value,
            EnzymeParameter::DeltaG { .. } => reaction.delta_g = value,
            EnzymeParameter::HalfLife => {}
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GeneChange {
    BasalRate { old_value: f64, new_value: f64 },
    Activator { index: usize, element: RegulatoryElement },
    Repressor { index: usize, element: RegulatoryElement },
    AddActivator(RegulatoryElement),
    AddRepressor(RegulatoryElement),
}

impl GeneChange {
    pub fn apply_to(&self, gene: &mut Gene) {
        match self {
            GeneChange::BasalRate { new_value, .. } => gene.basal_rate = *new_value,
            GeneChange::Activator { index, element } => {
                if let Some(slot) = gene.activators.get_mut(*index) {
                    *slot = element.clone();
                }
            }
            GeneChange::Repressor { index, element } => {
                if let Some(slot) = gene.repressors.get_mut(*index) {
                    *slot = element.clone();
                }
            }
            GeneChange::AddActivator(element) => gene.activators.push(element.clone()),
            GeneChange::AddRepressor(element) => gene.repressors.push(element.clone()),
        }
    }
}

/// Cumulative count of each kind of mutation event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationCounts {
    pub point_mutations: u64,
    pub duplications: u64,
    pub novel_enzymes: u64,
    pub gene_mutations: u64,
    pub discoveries: u64,
}

impl MutationCounts {
    pub fn total(&self) -> u64 {
        self.point_mutations
            + self.duplications
            + self.novel_enzymes
            + self.gene_mutations
            + self.discoveries
    }
}

impl AddAssign for MutationCounts {
    fn add_assign(&mut self, other: Self) {
        self.point_mutations += other.point_mutations;
        self.duplications += other.duplications;
        self.novel_enzymes += other.novel_enzymes;
        self.gene_mutations += other.gene_mutations;
        self.discoveries += other.discoveries;
    }
}

/// Everything the mutation system proposes for one step. Nothing here has been applied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MutationResult {
    pub enzyme_modifications: BTreeMap<String, Vec<ParameterChange>>,
    pub gene_modifications: BTreeMap<String, Vec<GeneChange>>,
    pub new_enzymes: Vec<Enzyme>,
    pub new_genes: Vec<Gene>,
    pub new_molecules: Vec<Molecule>,
    /// Parent of each new enzyme; novel enzymes have none.
    pub parents: BTreeMap<String, Option<String>>,
    pub counts: MutationCounts,
}

impl MutationResult {
    pub fn is_empty(&self) -> bool {
        self.enzyme_modifications.is_empty()
            && self.gene_modifications.is_empty()
            && self.new_enzymes.is_empty()
            && self.new_genes.is_empty()
            && self.new_molecules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::reaction::Reaction;

    #[test]
    fn parameter_change_targets_the_named_reaction() {
        let mut enzyme = Enzyme::new("e", "E", 1.0)
            .with_reaction(Reaction::new("r1", "r1").with_substrate("A", 1.0))
            .with_reaction(Reaction::new("r2", "r2").with_substrate("B", 1.0));
        ParameterChange {
            parameter: EnzymeParameter::Km {
                reaction_id: "r2".into(),
            },
            old_value: 0.5,
            new_value: 0.7,
        }
        .apply_to(&mut enzyme);
        assert_eq!(enzyme.reactions[0].km, 0.5);
        assert_eq!(enzyme.reactions[1].km, 0.7);
    }

    #[test]
    fn stale_reaction_change_is_a_no_op() {
        let mut enzyme = Enzyme::new("e", "E", 1.0).with_reaction(Reaction::new("r1", "r1"));
        let before = enzyme.clone();
        ParameterChange {
            parameter: EnzymeParameter::Vmax {
                reaction_id: "gone".into(),
            },
            old_value: 1.0,
            new_value: 2.0,
        }
        .apply_to(&mut enzyme);
        assert_eq!(enzyme, before);
    }

    #[test]
    fn gene_changes_edit_and_extend_regulators() {
        let mut gene = Gene::new("e", 0.01).with_activator(RegulatoryElement::new("A", 1.0, 2.0, 1.0));
        GeneChange::Activator {
            index: 0,
            element: RegulatoryElement::new("A", 0.5, 3.0, 2.0),
        }
        .apply_to(&mut gene);
        GeneChange::AddRepressor(RegulatoryElement::new("B", 1.0, 4.0, 1.0)).apply_to(&mut gene);
        GeneChange::Repressor {
            index: 7,
            element: RegulatoryElement::new("C", 1.0, 4.0, 1.0),
        }
        .apply_to(&mut gene);

        assert_eq!(gene.activators[0].kd, 0.5);
        assert_eq!(gene.repressors.len(), 1);
        assert_eq!(gene.repressors[0].molecule_name, "B");
    }

    #[test]
    fn counts_accumulate() {
        let mut total = MutationCounts::default();
        total += MutationCounts {
            point_mutations: 2,
            discoveries: 1,
            ..Default::default()
        };
        total += MutationCounts {
            duplications: 1,
            ..Default::default()
        };
        assert_eq!(total.total(), 4);
    }
}
