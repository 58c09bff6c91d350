use super::config::SimulationConfig;
use super::data::{EvolutionStats, ProteinStats, ReactionView, SimulationData};
use super::error::EngineError;
use super::evolution::EvolutionSystem;
use super::evolution::selection::{SelectionCounts, SelectionResult};
use super::history::History;
use super::locks::{CategoryLocks, LockCategory, LockNotifier, LockObserver};
use super::mutation::MutationSystem;
use super::mutation::changes::{MutationCounts, MutationResult};
use super::snapshot::Snapshot;
use super::tasks::gene_synthesis::GeneSynthesis;
use super::tasks::reaction_flux::ReactionFlux;
use super::tasks::{degradation, gene_synthesis, reaction_flux};
use crate::core::models::Concentrations;
use crate::core::models::cell::Cell;
use crate::core::models::enzyme::Enzyme;
use crate::core::models::gene::Gene;
use crate::core::models::molecule::Molecule;
use crate::core::models::network::Network;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::collections::BTreeMap;
use tracing::{debug, info, instrument};

/// Entities as they were when the simulator was built, restored by [`Simulator::reset`].
#[derive(Debug, Clone)]
struct InitialState {
    molecules: BTreeMap<String, Molecule>,
    enzymes: BTreeMap<String, Enzyme>,
    genes: BTreeMap<String, Gene>,
}

/// Owns the network and advances it one step at a time.
///
/// Each step captures a [`Snapshot`], lets every calculator propose its changes against
/// that same snapshot, and only then applies the proposals in a fixed order:
/// concentrations, enzyme turnover, mutations, selection. The cell aggregate and the
/// rolling history are updated last.
pub struct Simulator {
    config: SimulationConfig,
    time: f64,
    step_count: u64,
    paused: bool,
    molecules: BTreeMap<String, Molecule>,
    enzymes: BTreeMap<String, Enzyme>,
    /// Keyed by the id of the enzyme each gene regulates.
    genes: BTreeMap<String, Gene>,
    initial: InitialState,
    cell: Cell,
    locks: CategoryLocks,
    lock_notifier: LockNotifier,
    mutation: MutationSystem,
    evolution: EvolutionSystem,
    mutation_counts: MutationCounts,
    mean_fitness: Option<f64>,
    history: History,
    rng: StdRng,
}

/// Number of fixed steps needed to cover `duration` at `time_step`.
pub fn steps_for(duration: f64, time_step: f64) -> u64 {
    if !(duration > 0.0) || !(time_step > 0.0) {
        return 0;
    }
    (duration / time_step - 1e-9).ceil().max(0.0) as u64
}

impl Simulator {
    pub fn new(
        molecules: impl IntoIterator<Item = Molecule>,
        enzymes: impl IntoIterator<Item = Enzyme>,
        genes: impl IntoIterator<Item = Gene>,
        config: SimulationConfig,
    ) -> Result<Self, EngineError> {
        config.validate()?;

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut simulator = Self {
            time: 0.0,
            step_count: 0,
            paused: false,
            molecules: BTreeMap::new(),
            enzymes: BTreeMap::new(),
            genes: BTreeMap::new(),
            initial: InitialState {
                molecules: BTreeMap::new(),
                enzymes: BTreeMap::new(),
                genes: BTreeMap::new(),
            },
            cell: Cell::new(config.cell),
            locks: CategoryLocks::none(),
            lock_notifier: LockNotifier::new(),
            mutation: MutationSystem::new(config.mutation.clone()),
            evolution: EvolutionSystem::new(config.evolution.clone()),
            mutation_counts: MutationCounts::default(),
            mean_fitness: None,
            history: History::new(config.max_history_length),
            rng,
            config,
        };

        for molecule in molecules {
            simulator.add_molecule(molecule)?;
        }
        for enzyme in enzymes {
            simulator.add_enzyme(enzyme)?;
        }
        for gene in genes {
            simulator.add_gene(gene)?;
        }
        simulator.initial = InitialState {
            molecules: simulator.molecules.clone(),
            enzymes: simulator.enzymes.clone(),
            genes: simulator.genes.clone(),
        };

        info!(
            molecules = simulator.molecules.len(),
            enzymes = simulator.enzymes.len(),
            genes = simulator.genes.len(),
            "Simulator initialized."
        );
        Ok(simulator)
    }

    pub fn from_pathway(pathway: Network, config: SimulationConfig) -> Result<Self, EngineError> {
        Self::new(pathway.molecules, pathway.enzymes, pathway.genes, config)
    }

    /// Replaces the random source, typically with a seeded one for reproducible runs.
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    pub fn add_molecule(&mut self, molecule: Molecule) -> Result<(), EngineError> {
        if self.molecules.contains_key(&molecule.name) {
            return Err(EngineError::DuplicateMolecule(molecule.name));
        }
        self.molecules.insert(molecule.name.clone(), molecule);
        Ok(())
    }

    /// Adds an enzyme after checking that its reactions do not share molecules. Ids of
    /// enzymes removed earlier in the run stay taken.
    pub fn add_enzyme(&mut self, enzyme: Enzyme) -> Result<(), EngineError> {
        if self.enzymes.contains_key(&enzyme.id) || self.evolution.lineage().contains(&enzyme.id) {
            return Err(EngineError::DuplicateEnzyme(enzyme.id));
        }
        let validation = enzyme.validate();
        if !validation.valid {
            return Err(EngineError::InvalidEnzyme {
                enzyme_id: enzyme.id,
                reason: validation.reason,
                suggestion: validation.suggestion,
            });
        }
        self.evolution.record_founder(&enzyme.id, self.time);
        self.enzymes.insert(enzyme.id.clone(), enzyme);
        Ok(())
    }

    /// Adds or replaces the gene of an existing enzyme.
    pub fn add_gene(&mut self, gene: Gene) -> Result<(), EngineError> {
        if !self.enzymes.contains_key(&gene.enzyme_id) {
            return Err(EngineError::EnzymeNotFound(gene.enzyme_id));
        }
        self.genes.insert(gene.enzyme_id.clone(), gene);
        Ok(())
    }

    /// Removes an enzyme together with its reactions and gene.
    pub fn remove_enzyme(&mut self, enzyme_id: &str) -> Result<Enzyme, EngineError> {
        let enzyme = self
            .enzymes
            .remove(enzyme_id)
            .ok_or_else(|| EngineError::EnzymeNotFound(enzyme_id.to_string()))?;
        self.genes.remove(enzyme_id);
        self.history.forget_enzyme(enzyme_id);
        self.evolution.record_death(enzyme_id, self.time, "removed");
        Ok(enzyme)
    }

    pub fn molecule(&self, name: &str) -> Option<&Molecule> {
        self.molecules.get(name)
    }

    pub fn molecule_mut(&mut self, name: &str) -> Option<&mut Molecule> {
        self.molecules.get_mut(name)
    }

    pub fn enzyme(&self, id: &str) -> Option<&Enzyme> {
        self.enzymes.get(id)
    }

    pub fn enzyme_mut(&mut self, id: &str) -> Option<&mut Enzyme> {
        self.enzymes.get_mut(id)
    }

    pub fn gene(&self, enzyme_id: &str) -> Option<&Gene> {
        self.genes.get(enzyme_id)
    }

    pub fn molecules(&self) -> &BTreeMap<String, Molecule> {
        &self.molecules
    }

    pub fn enzymes(&self) -> &BTreeMap<String, Enzyme> {
        &self.enzymes
    }

    pub fn genes(&self) -> &BTreeMap<String, Gene> {
        &self.genes
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    pub fn cell(&self) -> &Cell {
        &self.cell
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn evolution(&self) -> &EvolutionSystem {
        &self.evolution
    }

    pub fn mutation_counts(&self) -> MutationCounts {
        self.mutation_counts
    }

    pub fn selection_counts(&self) -> SelectionCounts {
        self.evolution.counts()
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn time_scale(&self) -> f64 {
        self.config.time_scale
    }

    /// Negative or non-finite scales are treated as zero.
    pub fn set_time_scale(&mut self, scale: f64) {
        self.config.time_scale = if scale.is_finite() { scale.max(0.0) } else { 0.0 };
    }

    pub fn locks(&self) -> CategoryLocks {
        self.locks
    }

    pub fn is_locked(&self, category: LockCategory) -> bool {
        self.locks.is_locked(category)
    }

    pub fn set_lock(&mut self, category: LockCategory, locked: bool) {
        if self.locks.set(category, locked) {
            debug!(%category, locked, "Lock changed.");
            self.lock_notifier.notify(category, locked);
        }
    }

    /// Locks every category except `category`.
    pub fn isolate(&mut self, category: LockCategory) {
        for other in LockCategory::ALL {
            self.set_lock(other, other != category);
        }
    }

    pub fn unlock_all(&mut self) {
        for category in LockCategory::ALL {
            self.set_lock(category, false);
        }
    }

    /// Registers the observer notified on every effective lock change.
    pub fn on_lock_change(&mut self, observer: LockObserver) {
        self.lock_notifier = LockNotifier::with_observer(observer);
    }

    /// Restores the network as it was built and clears time, history and counters.
    /// Locks, pause state and the time scale are kept.
    pub fn reset(&mut self) {
        self.molecules = self.initial.molecules.clone();
        self.enzymes = self.initial.enzymes.clone();
        self.genes = self.initial.genes.clone();
        for molecule in self.molecules.values_mut() {
            molecule.reset();
        }
        for enzyme in self.enzymes.values_mut() {
            enzyme.reset();
        }

        self.time = 0.0;
        self.step_count = 0;
        self.history.clear();
        self.mutation_counts = MutationCounts::default();
        self.mean_fitness = None;
        self.evolution.reset();
        for id in self.enzymes.keys() {
            self.evolution.record_founder(id, 0.0);
        }
        self.cell.revive();
        if let Some(seed) = self.config.seed {
            self.rng = StdRng::seed_from_u64(seed);
        }
        info!("Simulator reset.");
    }

    /// Advances by `real_delta · time_scale` simulated seconds. Does nothing while
    /// paused or once the cell has died. Returns whether a step was taken.
    pub fn tick(&mut self, real_delta: f64) -> bool {
        if self.paused || !self.cell.is_alive {
            return false;
        }
        let delta_time = real_delta * self.config.time_scale;
        if !(delta_time > 0.0) {
            return false;
        }
        self.simulate_step(delta_time);
        true
    }

    /// Runs fixed steps of the configured time step until `duration` simulated seconds
    /// have elapsed or the cell dies. Returns the number of steps taken.
    pub fn run_for(&mut self, duration: f64) -> u64 {
        let dt = self.config.time_step;
        let steps = steps_for(duration, dt);
        let mut taken = 0;
        for _ in 0..steps {
            if !self.cell.is_alive {
                break;
            }
            self.simulate_step(dt);
            taken += 1;
        }
        taken
    }

    /// One full step: snapshot, calculate, apply, then update aggregates.
    #[instrument(level = "trace", skip_all, name = "simulation_step", fields(time = self.time))]
    pub fn simulate_step(&mut self, delta_time: f64) {
        if !(delta_time > 0.0) || !self.cell.is_alive {
            return;
        }
        let snapshot = Snapshot::capture(self.time, &self.molecules, &self.enzymes, &self.genes);
        let locks = self.locks;

        let flux = reaction_flux::run(&snapshot, delta_time, locks.is_locked(LockCategory::Reactions));
        let synthesis = gene_synthesis::run(&snapshot, delta_time, locks.is_locked(LockCategory::Genes));
        let degraded = degradation::run(&snapshot, delta_time, locks.is_locked(LockCategory::Enzymes));
        let mutations = if locks.is_locked(LockCategory::Mutations) {
            MutationResult::default()
        } else {
            self.mutation.calculate_reserving(
                &snapshot,
                self.evolution.lineage().ids(),
                delta_time,
                &mut self.rng,
            )
        };
        let selection = if locks.is_locked(LockCategory::Evolution) {
            SelectionResult::default()
        } else {
            self.evolution.calculate(&snapshot, delta_time, &mut self.rng)
        };
        drop(snapshot);

        self.store_runtime_state(&flux, &synthesis);
        if !locks.is_locked(LockCategory::Molecules) {
            self.apply_concentration_deltas(&flux.concentration_deltas);
        }
        if !locks.is_locked(LockCategory::Enzymes) {
            self.apply_enzyme_turnover(&synthesis.amounts, &degraded);
        }
        self.apply_mutations(mutations);
        self.apply_selection(&selection);

        self.time += delta_time;
        self.step_count += 1;

        let concentrations: Concentrations = self
            .molecules
            .iter()
            .map(|(name, m)| (name.clone(), m.concentration))
            .collect();
        // Locked reactions only carry display rates; they release no heat or work.
        let reactions_ran = !locks.is_locked(LockCategory::Reactions);
        self.cell.update(
            self.enzymes
                .values()
                .filter(|_| reactions_ran)
                .flat_map(|e| e.reactions.iter()),
            &concentrations,
            delta_time,
        );
        self.history.record(
            self.time,
            self.molecules.iter().map(|(name, m)| (name, m.concentration)),
            self.enzymes.iter().map(|(id, e)| (id, e.concentration)),
        );
    }

    /// Caches rates and expression levels on the entities for observers.
    fn store_runtime_state(&mut self, flux: &ReactionFlux, synthesis: &GeneSynthesis) {
        for (id, enzyme) in self.enzymes.iter_mut() {
            let Some(states) = flux.states.get(id) else {
                continue;
            };
            for (reaction, state) in enzyme.reactions.iter_mut().zip(states) {
                reaction.state = *state;
            }
        }
        for (id, gene) in self.genes.iter_mut() {
            if let Some(expression) = synthesis.expression.get(id) {
                gene.fold_change = expression.fold_change;
                gene.expression_rate = expression.rate;
            }
        }
    }

    fn apply_concentration_deltas(&mut self, deltas: &Concentrations) {
        for (name, delta) in deltas {
            if let Some(molecule) = self.molecules.get_mut(name) {
                if !molecule.is_locked {
                    molecule.set_concentration(molecule.concentration + delta);
                }
            }
        }
    }

    fn apply_enzyme_turnover(
        &mut self,
        synthesized: &BTreeMap<String, f64>,
        degraded: &BTreeMap<String, f64>,
    ) {
        for (id, enzyme) in self.enzymes.iter_mut() {
            if enzyme.is_locked {
                continue;
            }
            let gain = synthesized.get(id).copied().unwrap_or(0.0);
            let loss = degraded.get(id).copied().unwrap_or(0.0);
            if gain != 0.0 || loss != 0.0 {
                enzyme.set_concentration(enzyme.concentration + gain - loss);
            }
        }
    }

    fn apply_mutations(&mut self, result: MutationResult) {
        if result.is_empty() {
            return;
        }
        for (id, changes) in &result.enzyme_modifications {
            if let Some(enzyme) = self.enzymes.get_mut(id) {
                for change in changes {
                    change.apply_to(enzyme);
                }
            }
        }
        for molecule in result.new_molecules {
            self.molecules.entry(molecule.name.clone()).or_insert(molecule);
        }
        for enzyme in result.new_enzymes {
            if self.enzymes.contains_key(&enzyme.id) {
                continue;
            }
            let parent = result.parents.get(&enzyme.id).and_then(|p| p.as_deref());
            if !self.evolution.record_birth(&enzyme.id, parent, self.time) {
                continue;
            }
            self.enzymes.insert(enzyme.id.clone(), enzyme);
        }
        for gene in result.new_genes {
            if self.enzymes.contains_key(&gene.enzyme_id) {
                self.genes.entry(gene.enzyme_id.clone()).or_insert(gene);
            }
        }
        for (id, changes) in &result.gene_modifications {
            if let Some(gene) = self.genes.get_mut(id) {
                for change in changes {
                    change.apply_to(gene);
                }
            }
        }
        self.mutation_counts += result.counts;
    }

    fn apply_selection(&mut self, result: &SelectionResult) {
        if result.fitness.is_empty() {
            return;
        }
        let evolution = self.config.evolution.clone();
        self.evolution.record_selection(result);
        self.mean_fitness = result.mean_fitness();

        for elimination in &result.eliminations {
            if self.enzymes.remove(&elimination.enzyme_id).is_none() {
                continue;
            }
            info!(
                enzyme = %elimination.enzyme_id,
                reason = %elimination.reason,
                fitness = elimination.fitness,
                "Enzyme eliminated."
            );
            self.genes.remove(&elimination.enzyme_id);
            self.history.forget_enzyme(&elimination.enzyme_id);
            self.evolution.record_death(
                &elimination.enzyme_id,
                self.time,
                &elimination.reason.to_string(),
            );
        }

        let clamp_basal =
            |rate: f64| rate.clamp(evolution.min_basal_rate, evolution.max_basal_rate);
        for boost in &result.boosts {
            if let Some(gene) = self.genes.get_mut(&boost.enzyme_id) {
                gene.basal_rate = clamp_basal(gene.basal_rate * boost.factor);
            }
        }
        for loser in &result.competition_losers {
            if let Some(gene) = self.genes.get_mut(loser) {
                gene.basal_rate = clamp_basal(gene.basal_rate * evolution.competition_loss_factor);
            }
        }
        for adjustment in &result.adaptive_adjustments {
            if let Some(gene) = self.genes.get_mut(&adjustment.enzyme_id) {
                gene.basal_rate = clamp_basal(adjustment.new_basal_rate);
            }
        }
    }

    /// Copy of the full state for observers.
    pub fn data(&self) -> SimulationData {
        let reactions = self
            .enzymes
            .values()
            .flat_map(|e| {
                e.reactions.iter().map(move |r| ReactionView {
                    enzyme_id: e.id.clone(),
                    reaction: r.clone(),
                    state: r.state,
                })
            })
            .collect();
        let lineage = self.evolution.lineage();

        SimulationData {
            time: self.time,
            molecules: self.molecules.clone(),
            enzymes: self.enzymes.clone(),
            reactions,
            genes: self.genes.clone(),
            cell: self.cell.clone(),
            molecule_history: self.history.molecules.clone(),
            enzyme_history: self.history.enzymes.clone(),
            time_history: self.history.time.clone(),
            protein_stats: ProteinStats::from_enzymes(self.enzymes.values()),
            mutation_stats: self.mutation_counts,
            evolution_stats: EvolutionStats {
                selection: self.evolution.counts(),
                mean_fitness: self.mean_fitness,
                max_generation: lineage.max_generation(),
                living_lineages: lineage.living_count(),
            },
            locks: self.locks.locked().collect(),
            is_paused: self.paused,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::cell::CellParameters;
    use crate::core::models::reaction::Reaction;
    use crate::engine::config::{EvolutionConfig, MutationConfig, SimulationConfigBuilder};
    use std::sync::{Arc, Mutex};

    fn seeded() -> SimulationConfig {
        SimulationConfigBuilder::new().seed(7).build().unwrap()
    }

    fn source(id: &str, product: &str, vmax: f64, concentration: f64) -> Enzyme {
        Enzyme::new(id, id, concentration).with_reaction(
            Reaction::new(&format!("{}.r", id), "source")
                .with_product(product, 1.0)
                .with_kinetics(vmax, 0.5)
                .with_efficiency(1.0),
        )
    }

    fn converter(id: &str, from: &str, to: &str) -> Enzyme {
        Enzyme::new(id, id, 1.0).with_reaction(
            Reaction::new(&format!("{}.r", id), "convert")
                .with_substrate(from, 1.0)
                .with_product(to, 1.0)
                .with_kinetics(100.0, 0.01)
                .with_delta_g(-30.0)
                .with_efficiency(1.0),
        )
    }

    fn quiet(sim: &mut Simulator) {
        sim.set_lock(LockCategory::Mutations, true);
        sim.set_lock(LockCategory::Evolution, true);
    }

    #[test]
    fn source_fills_its_product_at_vmax_times_enzyme() {
        let mut sim = Simulator::new(
            [Molecule::new("M", 0.0)],
            [source("src", "M", 5.0, 0.1)],
            [],
            seeded(),
        )
        .unwrap();
        quiet(&mut sim);
        let steps = sim.run_for(1.0);
        assert_eq!(steps, 10);
        let m = sim.molecule("M").unwrap().concentration;
        assert!((m - 0.5).abs() <= 0.025, "M = {}", m);
        assert!((sim.time() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn locked_enzyme_keeps_its_concentration() {
        let enzyme = converter("e", "A", "B").with_half_life(10.0).with_locked(true);
        let mut sim = Simulator::new(
            [Molecule::new("A", 1.0), Molecule::new("B", 0.0)],
            [enzyme],
            [Gene::new("e", 0.5)],
            seeded(),
        )
        .unwrap();
        quiet(&mut sim);
        for _ in 0..50 {
            sim.simulate_step(0.1);
            assert_eq!(sim.enzyme("e").unwrap().concentration, 1.0);
        }
        assert!(sim.gene("e").unwrap().expression_rate > 0.0);
    }

    #[test]
    fn concentrations_never_go_negative() {
        let mut sim = Simulator::new(
            [Molecule::new("A", 0.01), Molecule::new("B", 0.0), Molecule::new("C", 0.0)],
            [converter("e1", "A", "B"), converter("e2", "B", "C")],
            [],
            seeded(),
        )
        .unwrap();
        quiet(&mut sim);
        for _ in 0..20 {
            sim.simulate_step(1.0);
            assert!(sim.molecules().values().all(|m| m.concentration >= 0.0));
        }
    }

    #[test]
    fn locked_molecules_hold_while_enzymes_turn_over() {
        let enzyme = converter("e", "A", "B").with_half_life(10.0);
        let mut sim = Simulator::new(
            [Molecule::new("A", 1.0), Molecule::new("B", 0.0)],
            [enzyme],
            [],
            seeded(),
        )
        .unwrap();
        quiet(&mut sim);
        sim.set_lock(LockCategory::Molecules, true);
        sim.run_for(1.0);

        assert_eq!(sim.molecule("A").unwrap().concentration, 1.0);
        assert_eq!(sim.molecule("B").unwrap().concentration, 0.0);
        assert!(sim.enzyme("e").unwrap().concentration < 1.0);
        assert!(sim.enzyme("e").unwrap().reactions[0].state.forward_rate > 0.0);
    }

    #[test]
    fn individually_locked_molecule_is_untouched() {
        let mut sim = Simulator::new(
            [Molecule::new("A", 1.0).with_locked(true), Molecule::new("B", 0.0)],
            [converter("e", "A", "B")],
            [],
            seeded(),
        )
        .unwrap();
        quiet(&mut sim);
        sim.run_for(0.5);
        assert_eq!(sim.molecule("A").unwrap().concentration, 1.0);
        assert!(sim.molecule("B").unwrap().concentration > 0.0);
    }

    #[test]
    fn isolating_reactions_changes_only_molecules() {
        let enzyme = converter("e", "A", "B").with_half_life(10.0);
        let mut sim = Simulator::new(
            [Molecule::new("A", 1.0), Molecule::new("B", 0.0)],
            [enzyme],
            [Gene::new("e", 1.0)],
            seeded(),
        )
        .unwrap();
        sim.isolate(LockCategory::Molecules);
        assert!(sim.is_locked(LockCategory::Reactions));
        sim.run_for(1.0);
        // Reaction deltas are locked, so the unlocked molecule category has nothing to apply.
        assert_eq!(sim.molecule("A").unwrap().concentration, 1.0);
        assert_eq!(sim.enzyme("e").unwrap().concentration, 1.0);

        sim.unlock_all();
        quiet(&mut sim);
        sim.run_for(0.2);
        assert!(sim.molecule("A").unwrap().concentration < 1.0);
    }

    #[test]
    fn lock_observer_sees_effective_changes_only() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let mut sim = Simulator::new([], [], [], seeded()).unwrap();
        sim.on_lock_change(Box::new(move |c, l| sink.lock().unwrap().push((c, l))));
        sim.set_lock(LockCategory::Genes, true);
        sim.set_lock(LockCategory::Genes, true);
        sim.isolate(LockCategory::Genes);
        let seen = seen.lock().unwrap();
        assert_eq!(seen[0], (LockCategory::Genes, true));
        assert_eq!(seen[1], (LockCategory::Molecules, true));
        assert_eq!(seen.len(), 7);
        assert!(seen.contains(&(LockCategory::Genes, false)));
    }

    #[test]
    fn tick_respects_pause_and_time_scale() {
        let mut sim = Simulator::new([Molecule::new("M", 0.0)], [], [], seeded()).unwrap();
        sim.pause();
        assert!(!sim.tick(0.1));
        assert_eq!(sim.time(), 0.0);

        sim.resume();
        sim.set_time_scale(2.0);
        assert!(sim.tick(0.1));
        assert!((sim.time() - 0.2).abs() < 1e-12);

        sim.set_time_scale(-1.0);
        assert!(!sim.tick(0.1));
    }

    #[test]
    fn reset_restores_the_initial_network() {
        let config = SimulationConfigBuilder::new()
            .seed(11)
            .mutation(MutationConfig {
                duplication_rate: 50.0,
                ..MutationConfig::default()
            })
            .build()
            .unwrap();
        let mut sim = Simulator::new(
            [Molecule::new("A", 1.0), Molecule::new("B", 0.0)],
            [converter("e", "A", "B").with_half_life(100.0)],
            [Gene::new("e", 0.01)],
            config,
        )
        .unwrap();
        sim.set_lock(LockCategory::Evolution, true);
        sim.run_for(0.5);
        assert!(sim.enzymes().len() > 1);
        assert!(sim.mutation_counts().duplications > 0);

        sim.reset();
        assert_eq!(sim.time(), 0.0);
        assert_eq!(sim.enzymes().len(), 1);
        assert_eq!(sim.molecule("A").unwrap().concentration, 1.0);
        assert!(sim.history().is_empty());
        assert_eq!(sim.mutation_counts(), MutationCounts::default());
        assert_eq!(sim.evolution().lineage().len(), 1);
        assert!(sim.is_locked(LockCategory::Evolution));
    }

    #[test]
    fn duplicates_join_the_lineage() {
        let config = SimulationConfigBuilder::new()
            .seed(3)
            .mutation(MutationConfig {
                duplication_rate: 10.0,
                point_mutation_rate: 0.0,
                novel_enzyme_rate: 0.0,
                gene_mutation_rate: 0.0,
                ..MutationConfig::default()
            })
            .build()
            .unwrap();
        let mut sim = Simulator::new(
            [Molecule::new("A", 1.0), Molecule::new("B", 0.0)],
            [converter("e", "A", "B")],
            [],
            config,
        )
        .unwrap();
        sim.set_lock(LockCategory::Evolution, true);
        sim.simulate_step(0.1);

        assert_eq!(sim.enzymes().len(), 2);
        let child = sim.enzymes().keys().find(|id| *id != "e").unwrap().clone();
        assert!(sim.gene(&child).is_some());
        let record = sim.evolution().lineage().get(&child).unwrap();
        assert_eq!(record.parent.as_deref(), Some("e"));
        assert_eq!(record.generation, 1);
        assert_eq!(sim.data().evolution_stats.max_generation, 1);
    }

    #[test]
    fn ids_of_removed_enzymes_are_never_reused() {
        let config = SimulationConfigBuilder::new()
            .seed(3)
            .mutation(MutationConfig {
                duplication_rate: 10.0,
                point_mutation_rate: 0.0,
                novel_enzyme_rate: 0.0,
                gene_mutation_rate: 0.0,
                max_enzymes: 2,
                ..MutationConfig::default()
            })
            .build()
            .unwrap();
        let mut sim = Simulator::new(
            [Molecule::new("A", 1.0), Molecule::new("B", 0.0)],
            [converter("e", "A", "B")],
            [],
            config,
        )
        .unwrap();
        sim.set_lock(LockCategory::Evolution, true);

        sim.simulate_step(0.1);
        assert!(sim.enzyme("e.1").is_some());
        sim.remove_enzyme("e.1").unwrap();
        sim.simulate_step(0.1);

        assert!(sim.enzyme("e.1").is_none());
        assert!(sim.enzyme("e.2").is_some());
        let lineage = sim.evolution().lineage();
        assert_eq!(lineage.len(), 3);
        let dead = lineage.get("e.1").unwrap();
        assert_eq!(dead.death_cause.as_deref(), Some("removed"));
        assert!((dead.death_time.unwrap() - 0.1).abs() < 1e-12);
        assert_eq!(lineage.get("e.2").unwrap().parent.as_deref(), Some("e"));

        let revived = converter("e.1", "A", "B");
        assert!(matches!(sim.add_enzyme(revived), Err(EngineError::DuplicateEnzyme(_))));
    }

    #[test]
    fn locked_reactions_leave_the_cell_at_ambient() {
        let config = SimulationConfigBuilder::new()
            .seed(2)
            .cell(CellParameters {
                heat_capacity: 0.01,
                ..CellParameters::default()
            })
            .build()
            .unwrap();
        let mut furnace = converter("burn", "A", "B");
        furnace.reactions[0].reaction_efficiency = 0.1;
        let mut sim = Simulator::new(
            [Molecule::new("A", 100.0), Molecule::new("B", 0.0)],
            [furnace],
            [],
            config,
        )
        .unwrap();
        quiet(&mut sim);
        sim.set_lock(LockCategory::Reactions, true);
        let ambient = sim.cell().temperature;

        sim.run_for(1.0);

        assert!(sim.cell().is_alive);
        assert_eq!(sim.cell().temperature, ambient);
        assert_eq!(sim.cell().total_heat, 0.0);
        assert_eq!(sim.molecule("A").unwrap().concentration, 100.0);
        assert!(sim.enzyme("burn").unwrap().reactions[0].state.heat_generated > 0.0);
    }

    #[test]
    fn run_for_takes_as_many_steps_as_the_workflow_plans() {
        let mut sim = Simulator::new([Molecule::new("M", 1.0)], [], [], seeded()).unwrap();
        for duration in [0.0, 0.05, 0.25, 1.0] {
            let planned = steps_for(duration, sim.config().time_step);
            assert_eq!(sim.run_for(duration), planned);
        }
        assert_eq!(steps_for(0.25, 0.1), 3);
    }

    #[test]
    fn eliminated_enzymes_leave_the_network() {
        let config = SimulationConfigBuilder::new()
            .seed(5)
            .evolution(EvolutionConfig {
                selection_rate: 100.0,
                competition_rate: 0.0,
                adaptive_rate: 0.0,
                min_enzymes: 0,
                ..EvolutionConfig::default()
            })
            .build()
            .unwrap();
        let weak = Enzyme::new("weak", "weak", 0.5).with_reaction(
            Reaction::new("w", "uphill")
                .with_substrate("A", 1.0)
                .with_product("B", 1.0)
                .with_delta_g(25.0)
                .with_efficiency(0.01)
                .irreversible(),
        );
        let mut sim = Simulator::new(
            [Molecule::new("A", 1.0), Molecule::new("B", 1.0)],
            [weak],
            [Gene::new("weak", 0.01)],
            config,
        )
        .unwrap();
        sim.set_lock(LockCategory::Mutations, true);
        sim.simulate_step(0.1);

        assert!(sim.enzyme("weak").is_none());
        assert!(sim.gene("weak").is_none());
        assert!(!sim.history().enzymes.contains_key("weak"));
        let record = sim.evolution().lineage().get("weak").unwrap();
        assert_eq!(record.death_cause.as_deref(), Some("low fitness"));
        assert_eq!(sim.selection_counts().eliminations, 1);
    }

    #[test]
    fn history_is_bounded() {
        let config = SimulationConfigBuilder::new()
            .seed(1)
            .max_history_length(5)
            .build()
            .unwrap();
        let mut sim = Simulator::new([Molecule::new("M", 1.0)], [], [], config).unwrap();
        sim.run_for(2.0);
        assert_eq!(sim.history().len(), 5);
        assert_eq!(sim.history().molecules["M"].len(), 5);
    }

    #[test]
    fn overheated_cell_stops_the_clock() {
        let config = SimulationConfigBuilder::new()
            .seed(2)
            .cell(CellParameters {
                heat_capacity: 0.01,
                ..CellParameters::default()
            })
            .build()
            .unwrap();
        let mut furnace = converter("burn", "A", "B");
        furnace.reactions[0].reaction_efficiency = 0.1;
        let mut sim = Simulator::new(
            [Molecule::new("A", 100.0), Molecule::new("B", 0.0)],
            [furnace],
            [],
            config,
        )
        .unwrap();
        quiet(&mut sim);
        sim.simulate_step(0.1);
        assert!(!sim.cell().is_alive);

        let time = sim.time();
        assert!(!sim.tick(0.1));
        assert_eq!(sim.run_for(1.0), 0);
        assert_eq!(sim.time(), time);
    }

    #[test]
    fn construction_rejects_inconsistent_networks() {
        let duplicate = Simulator::new(
            [Molecule::new("A", 1.0), Molecule::new("A", 2.0)],
            [],
            [],
            seeded(),
        );
        assert!(matches!(duplicate, Err(EngineError::DuplicateMolecule(name)) if name == "A"));

        let orphan = Simulator::new([], [], [Gene::new("ghost", 0.1)], seeded());
        assert!(matches!(orphan, Err(EngineError::EnzymeNotFound(_))));

        let overlapping = Enzyme::new("e", "E", 1.0)
            .with_reaction(Reaction::new("r1", "A->B").with_substrate("A", 1.0).with_product("B", 1.0))
            .with_reaction(Reaction::new("r2", "B->C").with_substrate("B", 1.0).with_product("C", 1.0));
        let invalid = Simulator::new([], [overlapping], [], seeded());
        assert!(matches!(invalid, Err(EngineError::InvalidEnzyme { .. })));
    }

    #[test]
    fn remove_enzyme_reports_unknown_ids() {
        let mut sim = Simulator::new([], [source("s", "M", 1.0, 0.1)], [], seeded()).unwrap();
        assert!(sim.remove_enzyme("s").is_ok());
        assert!(matches!(sim.remove_enzyme("s"), Err(EngineError::EnzymeNotFound(_))));
    }

    #[test]
    fn data_reflects_current_state() {
        let mut sim = Simulator::new(
            [Molecule::new("M", 0.0)],
            [source("src", "M", 5.0, 0.1)],
            [],
            seeded(),
        )
        .unwrap();
        quiet(&mut sim);
        sim.run_for(0.3);
        let data = sim.data();
        assert_eq!(data.time_history.len(), 3);
        assert_eq!(data.reactions.len(), 1);
        assert!(data.reactions[0].state.forward_rate > 0.0);
        assert_eq!(data.protein_stats.count, 1);
        assert_eq!(
            data.locks,
            vec![LockCategory::Mutations, LockCategory::Evolution]
        );
        assert!(!data.is_paused);
    }

    #[test]
    fn same_seed_gives_same_trajectory() {
        let build = || {
            let config = SimulationConfigBuilder::new()
                .seed(99)
                .mutation(MutationConfig {
                    point_mutation_rate: 1.0,
                    duplication_rate: 0.5,
                    novel_enzyme_rate: 0.5,
                    ..MutationConfig::default()
                })
                .build()
                .unwrap();
            Simulator::new(
                [Molecule::new("A", 1.0), Molecule::new("B", 0.0), Molecule::new("C", 0.0)],
                [converter("e1", "A", "B"), converter("e2", "B", "C")],
                [Gene::new("e1", 0.01), Gene::new("e2", 0.01)],
                config,
            )
            .unwrap()
        };
        let (mut a, mut b) = (build(), build());
        a.run_for(5.0);
        b.run_for(5.0);
        assert_eq!(a.molecules(), b.molecules());
        assert_eq!(a.enzymes().len(), b.enzymes().len());
        assert_eq!(a.mutation_counts(), b.mutation_counts());
    }
}
