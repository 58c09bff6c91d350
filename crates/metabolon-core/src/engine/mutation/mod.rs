//! # Mutation System
//!
//! Proposes structural variation of the network from a [`Snapshot`]: parameter drift of
//! existing enzymes, enzyme duplication, invention of novel enzymes, edits to gene
//! regulation, and the molecules that new reactions bring into existence.
//!
//! Every candidate event is an independent Bernoulli trial with probability
//! `rate · dt`. The system never touches shared state; the simulator decides what to
//! do with the returned [`MutationResult`].

pub mod changes;

use self::changes::{EnzymeParameter, GeneChange, MutationResult, ParameterChange, limits};
use crate::core::models::enzyme::{DEFAULT_HALF_LIFE, Enzyme};
use crate::core::models::gene::{Gene, RegulatoryElement};
use crate::core::models::molecule::Molecule;
use crate::core::models::reaction::{Reaction, ReactionState};
use crate::core::utils::structural::{derive_code, random_code};
use crate::engine::config::MutationConfig;
use crate::engine::snapshot::Snapshot;
use crate::engine::utils::sampling::{drift_factor, occurs, pick, uniform, weighted_choice};
use rand::Rng;
use std::collections::BTreeSet;
use tracing::{debug, instrument, trace};

/// Added to every structural similarity so unrelated molecules stay reachable.
const SUBSTITUTION_BASE_WEIGHT: f64 = 0.1;
/// Below this magnitude a free energy drifts additively, by up to `±10·drift` kJ/mol.
const DELTA_G_ADDITIVE_BELOW: f64 = 1.0;

// Ranges drawn from when inventing an enzyme from scratch.
const NOVEL_VMAX: (f64, f64) = (0.5, 5.0);
const NOVEL_KM: (f64, f64) = (0.05, 2.0);
const NOVEL_DELTA_G: (f64, f64) = (-30.0, 5.0);
const NOVEL_EFFICIENCY: (f64, f64) = (0.2, 0.8);
const NOVEL_HALF_LIFE: (f64, f64) = (120.0, 600.0);
const NOVEL_CONCENTRATION: (f64, f64) = (0.001, 0.01);

const NEW_REGULATOR_KD: (f64, f64) = (0.1, 2.0);
const NEW_REGULATOR_FOLD: (f64, f64) = (2.0, 10.0);
const NEW_REGULATOR_HILL: (f64, f64) = (1.0, 2.0);
/// Metabolite energy ratio of a discovered molecule to the substrate it derives from.
const DISCOVERY_ENERGY_RATIO: (f64, f64) = (0.7, 1.1);

#[derive(Debug, Clone, Copy)]
enum PointTarget {
    Kinetics,
    Efficiency,
    HalfLife,
    Thermodynamics,
}

#[derive(Debug, Clone, Copy)]
enum GeneEdit {
    BasalRate,
    Activator,
    Repressor,
    AddActivator,
    AddRepressor,
}

/// Hands out enzyme ids and molecule names that are unique against the snapshot and
/// against everything proposed earlier in the same step.
struct NameRegistry {
    enzyme_ids: BTreeSet<String>,
    molecule_names: BTreeSet<String>,
}

impl NameRegistry {
    fn new<'a>(snapshot: &Snapshot, retired_ids: impl IntoIterator<Item = &'a str>) -> Self {
        let mut enzyme_ids: BTreeSet<String> = snapshot.enzymes.keys().cloned().collect();
        enzyme_ids.extend(retired_ids.into_iter().map(str::to_string));
        Self {
            enzyme_ids,
            molecule_names: snapshot.molecules.keys().cloned().collect(),
        }
    }

    fn fresh(taken: &mut BTreeSet<String>, base: &str) -> String {
        let mut n = 1usize;
        loop {
            let candidate = format!("{}.{}", base, n);
            if taken.insert(candidate.clone()) {
                return candidate;
            }
            n += 1;
        }
    }

    fn enzyme_id(&mut self, base: &str) -> String {
        Self::fresh(&mut self.enzyme_ids, base)
    }

    fn molecule_name(&mut self, base: &str) -> String {
        Self::fresh(&mut self.molecule_names, base)
    }
}

#[derive(Debug, Clone)]
pub struct MutationSystem {
    config: MutationConfig,
}

impl MutationSystem {
    pub fn new(config: MutationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MutationConfig {
        &self.config
    }

    pub fn calculate(
        &self,
        snapshot: &Snapshot,
        delta_time: f64,
        rng: &mut impl Rng,
    ) -> MutationResult {
        self.calculate_reserving(snapshot, std::iter::empty(), delta_time, rng)
    }

    /// Like [`calculate`](Self::calculate), but never hands out any id in
    /// `retired_ids`, typically the ids of enzymes that lived earlier in the run.
    #[instrument(level = "trace", skip_all, name = "mutation_calculate")]
    pub fn calculate_reserving<'a>(
        &self,
        snapshot: &Snapshot,
        retired_ids: impl IntoIterator<Item = &'a str>,
        delta_time: f64,
        rng: &mut impl Rng,
    ) -> MutationResult {
        let config = &self.config;
        let mut result = MutationResult::default();
        let mut names = NameRegistry::new(snapshot, retired_ids);
        let has_room =
            |result: &MutationResult| snapshot.enzyme_count() + result.new_enzymes.len() < config.max_enzymes;

        for (id, enzyme) in &snapshot.enzymes {
            if enzyme.is_locked {
                continue;
            }

            if occurs(config.point_mutation_rate, delta_time, rng) {
                if let Some(change) = self.point_mutation(enzyme, rng) {
                    trace!(enzyme = %id, ?change, "Point mutation.");
                    result
                        .enzyme_modifications
                        .entry(id.clone())
                        .or_default()
                        .push(change);
                    result.counts.point_mutations += 1;
                }
            }

            if occurs(config.duplication_rate, delta_time, rng) && has_room(&result) {
                let (clone, gene) = self.duplicate(enzyme, snapshot, &mut names, rng);
                debug!(parent = %id, child = %clone.id, "Enzyme duplicated.");
                result.parents.insert(clone.id.clone(), Some(id.clone()));
                result.new_enzymes.push(clone);
                result.new_genes.push(gene);
                result.counts.duplications += 1;
            }
        }

        if occurs(config.novel_enzyme_rate, delta_time, rng) && has_room(&result) {
            if let Some((enzyme, gene)) = self.novel_enzyme(snapshot, &mut names, rng) {
                debug!(enzyme = %enzyme.id, "Novel enzyme created.");
                result.parents.insert(enzyme.id.clone(), None);
                result.new_enzymes.push(enzyme);
                result.new_genes.push(gene);
                result.counts.novel_enzymes += 1;
            }
        }

        for (id, gene) in &snapshot.genes {
            if occurs(config.gene_mutation_rate, delta_time, rng) {
                if let Some(change) = self.gene_mutation(gene, snapshot, rng) {
                    trace!(gene = %id, ?change, "Gene mutation.");
                    result
                        .gene_modifications
                        .entry(id.clone())
                        .or_default()
                        .push(change);
                    result.counts.gene_mutations += 1;
                }
            }
        }

        self.discover_molecules(snapshot, &mut result, rng);
        result
    }

    fn point_mutation(&self, enzyme: &Enzyme, rng: &mut impl Rng) -> Option<ParameterChange> {
        let drift = self.config.drift;
        let target = match rng.gen_range(0..4) {
            0 => PointTarget::Kinetics,
            1 => PointTarget::Efficiency,
            2 => PointTarget::HalfLife,
            _ => PointTarget::Thermodynamics,
        };

        if let PointTarget::HalfLife = target {
            if enzyme.is_degradable {
                return Some(ParameterChange {
                    parameter: EnzymeParameter::HalfLife,
                    old_value: enzyme.half_life,
                    new_value: drifted(enzyme.half_life, drift, limits::HALF_LIFE, rng),
                });
            }
        }

        let reaction = pick(&enzyme.reactions, rng)?;
        let reaction_id = reaction.id.clone();
        let change = match target {
            PointTarget::Efficiency => ParameterChange {
                parameter: EnzymeParameter::Efficiency { reaction_id },
                old_value: reaction.reaction_efficiency,
                new_value: drifted(reaction.reaction_efficiency, drift, limits::EFFICIENCY, rng),
            },
            PointTarget::Thermodynamics => ParameterChange {
                parameter: EnzymeParameter::DeltaG { reaction_id },
                old_value: reaction.delta_g,
                new_value: drifted_delta_g(reaction.delta_g, drift, rng),
            },
            // Non-degradable enzymes have no meaningful half-life and drift kinetics instead.
            PointTarget::Kinetics | PointTarget::HalfLife => {
                if rng.gen_bool(0.5) {
                    ParameterChange {
                        parameter: EnzymeParameter::Vmax { reaction_id },
                        old_value: reaction.vmax,
                        new_value: drifted(reaction.vmax, drift, limits::VMAX, rng),
                    }
                } else {
                    ParameterChange {
                        parameter: EnzymeParameter::Km { reaction_id },
                        old_value: reaction.km,
                        new_value: drifted(reaction.km, drift, limits::KM, rng),
                    }
                }
            }
        };
        Some(change)
    }

    /// Clones `parent` at reduced concentration with doubly drifted reaction
    /// parameters, occasionally swapping one participant for a related molecule.
    fn duplicate(
        &self,
        parent: &Enzyme,
        snapshot: &Snapshot,
        names: &mut NameRegistry,
        rng: &mut impl Rng,
    ) -> (Enzyme, Gene) {
        let drift = 2.0 * self.config.drift;
        let id = names.enzyme_id(&parent.id);
        let half_life = if parent.is_degradable {
            parent.half_life
        } else {
            DEFAULT_HALF_LIFE
        };

        let mut clone = Enzyme::new(
            &id,
            &format!("{}'", parent.name),
            parent.concentration * self.config.duplicate_concentration_fraction,
        )
        .with_half_life(half_life);
        clone.inhibitors = parent.inhibitors.clone();
        clone.activators = parent.activators.clone();
        clone.reactions = parent
            .reactions
            .iter()
            .enumerate()
            .map(|(i, r)| {
                let mut reaction = r.clone();
                reaction.id = format!("{}.r{}", id, i);
                reaction.vmax = drifted(r.vmax, drift, limits::VMAX, rng);
                reaction.km = drifted(r.km, drift, limits::KM, rng);
                reaction.reaction_efficiency =
                    drifted(r.reaction_efficiency, drift, limits::EFFICIENCY, rng);
                reaction.delta_g = drifted_delta_g(r.delta_g, drift, rng);
                reaction.state = ReactionState::default();
                reaction
            })
            .collect();

        if rng.gen_bool(self.config.substitution_chance) {
            match substitute_participant(&clone, snapshot, rng) {
                Some(variant) => clone = variant,
                None => trace!(enzyme = %id, "Substitution dropped."),
            }
        }

        let gene = Gene::new(&id, self.config.new_gene_basal_rate);
        (clone, gene)
    }

    fn novel_enzyme(
        &self,
        snapshot: &Snapshot,
        names: &mut NameRegistry,
        rng: &mut impl Rng,
    ) -> Option<(Enzyme, Gene)> {
        let molecules: Vec<&Molecule> = snapshot.molecules.values().collect();
        let substrate = *pick(&molecules, rng)?;

        let alternatives: Vec<&Molecule> = molecules
            .iter()
            .copied()
            .filter(|m| m.name != substrate.name)
            .collect();
        let product = if alternatives.is_empty() || rng.gen_bool(self.config.novel_product_chance)
        {
            names.molecule_name(&substrate.name)
        } else {
            pick(&alternatives, rng)?.name.clone()
        };

        let id = names.enzyme_id("novel");
        let reaction = Reaction::new(&format!("{}.r0", id), &format!("{} -> {}", substrate.name, product))
            .with_substrate(&substrate.name, 1.0)
            .with_product(&product, 1.0)
            .with_kinetics(
                uniform(NOVEL_VMAX.0, NOVEL_VMAX.1, rng),
                uniform(NOVEL_KM.0, NOVEL_KM.1, rng),
            )
            .with_delta_g(uniform(NOVEL_DELTA_G.0, NOVEL_DELTA_G.1, rng))
            .with_efficiency(uniform(NOVEL_EFFICIENCY.0, NOVEL_EFFICIENCY.1, rng));
        let enzyme = Enzyme::new(
            &id,
            &format!("Novel enzyme {}", id),
            uniform(NOVEL_CONCENTRATION.0, NOVEL_CONCENTRATION.1, rng),
        )
        .with_half_life(uniform(NOVEL_HALF_LIFE.0, NOVEL_HALF_LIFE.1, rng))
        .with_reaction(reaction);

        let mut gene = Gene::new(&id, self.config.new_gene_basal_rate);
        if rng.gen_bool(self.config.product_repression_chance) {
            gene = gene.with_repressor(random_regulator(&product, rng));
        }
        if rng.gen_bool(self.config.substrate_activation_chance) {
            gene = gene.with_activator(random_regulator(&substrate.name, rng));
        }
        Some((enzyme, gene))
    }

    fn gene_mutation(
        &self,
        gene: &Gene,
        snapshot: &Snapshot,
        rng: &mut impl Rng,
    ) -> Option<GeneChange> {
        let drift = self.config.drift;
        let mut edits = vec![GeneEdit::BasalRate];
        if !gene.activators.is_empty() {
            edits.push(GeneEdit::Activator);
        }
        if !gene.repressors.is_empty() {
            edits.push(GeneEdit::Repressor);
        }
        if gene.regulator_count() < self.config.max_regulators_per_gene
            && !snapshot.molecules.is_empty()
        {
            edits.push(GeneEdit::AddActivator);
            edits.push(GeneEdit::AddRepressor);
        }

        let change = match *pick(&edits, rng)? {
            GeneEdit::BasalRate => GeneChange::BasalRate {
                old_value: gene.basal_rate,
                new_value: drifted(gene.basal_rate, drift, limits::BASAL_RATE, rng),
            },
            GeneEdit::Activator => {
                let index = rng.gen_range(0..gene.activators.len());
                GeneChange::Activator {
                    index,
                    element: drifted_element(&gene.activators[index], drift, rng),
                }
            }
            GeneEdit::Repressor => {
                let index = rng.gen_range(0..gene.repressors.len());
                GeneChange::Repressor {
                    index,
                    element: drifted_element(&gene.repressors[index], drift, rng),
                }
            }
            GeneEdit::AddActivator => {
                GeneChange::AddActivator(regulator_on_random_molecule(snapshot, rng)?)
            }
            GeneEdit::AddRepressor => {
                GeneChange::AddRepressor(regulator_on_random_molecule(snapshot, rng)?)
            }
        };
        Some(change)
    }

    /// Every product of a newly proposed reaction that is not yet a known molecule
    /// becomes a discovered molecule at zero concentration.
    fn discover_molecules(
        &self,
        snapshot: &Snapshot,
        result: &mut MutationResult,
        rng: &mut impl Rng,
    ) {
        let mut known: BTreeSet<String> = snapshot.molecules.keys().cloned().collect();
        let mut discovered = Vec::new();

        for reaction in result.new_enzymes.iter().flat_map(|e| e.reactions.iter()) {
            for product in reaction.products.keys() {
                if !known.insert(product.clone()) {
                    continue;
                }
                let origin = reaction
                    .substrates
                    .keys()
                    .next()
                    .and_then(|name| snapshot.molecules.get(name));
                let (code, energy) = match origin {
                    Some(m) => (
                        derive_code(&m.structural_code, rng),
                        m.potential_energy
                            * uniform(DISCOVERY_ENERGY_RATIO.0, DISCOVERY_ENERGY_RATIO.1, rng),
                    ),
                    None => (random_code(rng), 0.0),
                };
                debug!(molecule = %product, "Molecule discovered.");
                discovered.push(
                    Molecule::new(product, 0.0)
                        .with_structural_code(code)
                        .with_potential_energy(energy),
                );
            }
        }

        result.counts.discoveries += discovered.len() as u64;
        result.new_molecules.extend(discovered);
    }
}

fn drifted(value: f64, drift: f64, range: (f64, f64), rng: &mut impl Rng) -> f64 {
    limits::clamp(value * drift_factor(drift, rng), range)
}

fn drifted_delta_g(value: f64, drift: f64, rng: &mut impl Rng) -> f64 {
    if value.abs() < DELTA_G_ADDITIVE_BELOW {
        let step = 10.0 * drift;
        return limits::clamp(value + uniform(-step, step, rng), limits::DELTA_G);
    }
    drifted(value, drift, limits::DELTA_G, rng)
}

fn drifted_element(element: &RegulatoryElement, drift: f64, rng: &mut impl Rng) -> RegulatoryElement {
    RegulatoryElement {
        molecule_name: element.molecule_name.clone(),
        kd: drifted(element.kd, drift, limits::KD, rng),
        max_fold_change: drifted(element.max_fold_change, drift, limits::MAX_FOLD, rng),
        hill_coefficient: drifted(element.hill_coefficient, drift, limits::HILL, rng),
    }
}

fn random_regulator(molecule_name: &str, rng: &mut impl Rng) -> RegulatoryElement {
    RegulatoryElement::new(
        molecule_name,
        uniform(NEW_REGULATOR_KD.0, NEW_REGULATOR_KD.1, rng),
        uniform(NEW_REGULATOR_FOLD.0, NEW_REGULATOR_FOLD.1, rng),
        uniform(NEW_REGULATOR_HILL.0, NEW_REGULATOR_HILL.1, rng),
    )
}

fn regulator_on_random_molecule(snapshot: &Snapshot, rng: &mut impl Rng) -> Option<RegulatoryElement> {
    let names: Vec<&String> = snapshot.molecules.keys().collect();
    let name = *pick(&names, rng)?;
    Some(random_regulator(name, rng))
}

/// Swaps one substrate or product of a random reaction for another known molecule,
/// preferring structurally similar ones. Returns `None` when no candidate exists or
/// the resulting enzyme would be invalid.
fn substitute_participant(enzyme: &Enzyme, snapshot: &Snapshot, rng: &mut impl Rng) -> Option<Enzyme> {
    let index = rng.gen_range(0..enzyme.reactions.len().max(1));
    let reaction = enzyme.reactions.get(index)?;
    let on_products = match (reaction.substrates.is_empty(), reaction.products.is_empty()) {
        (true, true) => return None,
        (true, false) => true,
        (false, true) => false,
        (false, false) => rng.gen_bool(0.5),
    };
    let side = if on_products {
        &reaction.products
    } else {
        &reaction.substrates
    };
    let participants: Vec<&String> = side.keys().collect();
    let replaced = (*pick(&participants, rng)?).clone();

    let candidates: Vec<&Molecule> = snapshot
        .molecules
        .values()
        .filter(|m| !reaction.involves(&m.name))
        .collect();
    let reference = snapshot.molecules.get(&replaced);
    let weights: Vec<f64> = candidates
        .iter()
        .map(|m| reference.map_or(0.0, |r| r.structural_similarity(m)) + SUBSTITUTION_BASE_WEIGHT)
        .collect();
    let replacement = candidates.get(weighted_choice(&weights, rng).ok()?)?;

    let mut variant = enzyme.clone();
    let target = &mut variant.reactions[index];
    let side = if on_products {
        &mut target.products
    } else {
        &mut target.substrates
    };
    let coefficient = side.remove(&replaced)?;
    side.insert(replacement.name.clone(), coefficient);

    variant.validate().valid.then_some(variant)
}
