//! # Evolution System
//!
//! Scores every enzyme's fitness on a [`Snapshot`] and proposes selection actions:
//! eliminations, expression boosts for elite enzymes, competitive exclusion between
//! enzymes fighting over the same metabolites, and small adaptive changes to gene
//! expression.
//!
//! Calculation is pure. The state that outlives a single step (rolling fitness
//! history, lineage tree, cumulative counters) only changes through the `record_*`
//! methods, which the simulator calls while applying a result.

pub mod fitness;
pub mod lineage;
pub mod selection;

use self::fitness::FitnessScore;
use self::lineage::LineageTree;
use self::selection::{
    AdaptiveAdjustment, Boost, Competition, Elimination, EliminationReason, SelectionCounts,
    SelectionResult,
};
use crate::core::models::enzyme::Enzyme;
use crate::engine::config::EvolutionConfig;
use crate::engine::snapshot::Snapshot;
use crate::engine::utils::sampling::{occurs, uniform};
use rand::Rng;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use tracing::{debug, instrument, trace};

const MAX_ELIMINATION_THRESHOLD: f64 = 0.9;
const BOOST_RANGE: (f64, f64) = (1.2, 3.0);
const ADAPTIVE_INCREASE: (f64, f64) = (1.01, 1.1);
const ADAPTIVE_DECREASE: (f64, f64) = (0.9, 0.99);

type Signature = Vec<(BTreeSet<String>, BTreeSet<String>)>;

#[derive(Debug, Clone)]
pub struct EvolutionSystem {
    config: EvolutionConfig,
    fitness_history: BTreeMap<String, VecDeque<f64>>,
    lineage: LineageTree,
    counts: SelectionCounts,
}

impl EvolutionSystem {
    pub fn new(config: EvolutionConfig) -> Self {
        Self {
            config,
            fitness_history: BTreeMap::new(),
            lineage: LineageTree::new(),
            counts: SelectionCounts::default(),
        }
    }

    pub fn config(&self) -> &EvolutionConfig {
        &self.config
    }

    pub fn lineage(&self) -> &LineageTree {
        &self.lineage
    }

    pub fn counts(&self) -> SelectionCounts {
        self.counts
    }

    pub fn fitness_history(&self, enzyme_id: &str) -> Option<&VecDeque<f64>> {
        self.fitness_history.get(enzyme_id)
    }

    /// Mean of the recorded history together with `current`.
    pub fn rolling_average(&self, enzyme_id: &str, current: f64) -> f64 {
        match self.fitness_history.get(enzyme_id) {
            Some(history) if !history.is_empty() => {
                (history.iter().sum::<f64>() + current) / (history.len() + 1) as f64
            }
            _ => current,
        }
    }

    /// Elimination threshold for a population of `enzyme_count`. Above the cap it
    /// grows by `1 + (count - cap) / cap`, up to 0.9.
    pub fn elimination_threshold(&self, enzyme_count: usize) -> f64 {
        let base = self.config.elimination_threshold;
        let cap = self.config.enzyme_cap.max(1);
        if enzyme_count <= cap {
            return base;
        }
        let scale = 1.0 + (enzyme_count - cap) as f64 / cap as f64;
        (base * scale).min(MAX_ELIMINATION_THRESHOLD.max(base))
    }

    /// Boost factor for a fitness above the boost threshold, clamped to `[1.2, 3.0]`.
    pub fn boost_factor(&self, fitness: f64) -> f64 {
        let threshold = self.config.boost_threshold;
        let headroom = (1.0 - threshold).max(f64::EPSILON);
        (1.0 + 2.0 * (fitness - threshold) / headroom).clamp(BOOST_RANGE.0, BOOST_RANGE.1)
    }

    #[instrument(level = "trace", skip_all, name = "evolution_calculate")]
    pub fn calculate(
        &self,
        snapshot: &Snapshot,
        delta_time: f64,
        rng: &mut impl Rng,
    ) -> SelectionResult {
        let mut result = SelectionResult::default();
        for (id, enzyme) in &snapshot.enzymes {
            let score = FitnessScore::evaluate(enzyme, snapshot, &self.config.weights);
            result
                .rolling_fitness
                .insert(id.clone(), self.rolling_average(id, score.total));
            result.fitness.insert(id.clone(), score);
        }

        self.propose_eliminations(snapshot, delta_time, rng, &mut result);
        self.propose_boosts(snapshot, delta_time, rng, &mut result);
        self.propose_competitions(snapshot, delta_time, rng, &mut result);
        self.propose_adaptive_adjustments(snapshot, delta_time, rng, &mut result);
        result
    }

    fn propose_eliminations(
        &self,
        snapshot: &Snapshot,
        delta_time: f64,
        rng: &mut impl Rng,
        result: &mut SelectionResult,
    ) {
        let config = &self.config;
        let count = snapshot.enzyme_count();
        let removable = count.saturating_sub(config.min_enzymes);
        if removable == 0 {
            return;
        }
        let threshold = self.elimination_threshold(count);
        let signatures: BTreeMap<&str, Signature> = snapshot
            .enzymes
            .iter()
            .map(|(id, e)| (id.as_str(), signature(e)))
            .collect();

        let mut candidates = Vec::new();
        for (id, enzyme) in &snapshot.enzymes {
            if enzyme.is_source() || enzyme.is_sink() || enzyme.is_locked {
                continue;
            }
            let fitness = result.fitness[id].total;
            let rolling = result.rolling_fitness[id];

            let reason = if fitness < threshold && rolling < threshold {
                EliminationReason::LowFitness
            } else if enzyme.is_degradable && enzyme.concentration < config.near_zero_concentration
            {
                EliminationReason::Depleted
            } else if let Some(rival) = self.stronger_twin(id, &signatures, fitness, result) {
                EliminationReason::Redundant { rival }
            } else {
                continue;
            };
            candidates.push(Elimination {
                enzyme_id: id.clone(),
                reason,
                fitness,
            });
        }

        candidates.sort_by(|a, b| {
            a.fitness
                .partial_cmp(&b.fitness)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.enzyme_id.cmp(&b.enzyme_id))
        });
        for candidate in candidates {
            if result.eliminations.len() >= removable {
                break;
            }
            if occurs(config.selection_rate, delta_time, rng) {
                result.eliminations.push(candidate);
            }
        }
    }

    /// Another enzyme with the same chemistry whose fitness exceeds `fitness` by more
    /// than the redundancy margin.
    fn stronger_twin(
        &self,
        id: &str,
        signatures: &BTreeMap<&str, Signature>,
        fitness: f64,
        result: &SelectionResult,
    ) -> Option<String> {
        let own = signatures.get(id).filter(|s| !s.is_empty())?;
        signatures
            .iter()
            .filter(|(other, sig)| *other != &id && *sig == own)
            .find(|(other, _)| {
                result.fitness[**other].total > fitness + self.config.redundancy_margin
            })
            .map(|(other, _)| other.to_string())
    }

    fn propose_boosts(
        &self,
        snapshot: &Snapshot,
        delta_time: f64,
        rng: &mut impl Rng,
        result: &mut SelectionResult,
    ) {
        let threshold = self.config.boost_threshold;
        let mut boosts = Vec::new();
        for id in snapshot.enzymes.keys() {
            if result.is_eliminated(id) || !snapshot.genes.contains_key(id) {
                continue;
            }
            let fitness = result.fitness[id].total;
            if fitness <= threshold || result.rolling_fitness[id] <= threshold {
                continue;
            }
            if occurs(self.config.selection_rate, delta_time, rng) {
                boosts.push(Boost {
                    enzyme_id: id.clone(),
                    factor: self.boost_factor(fitness),
                });
            }
        }
        result.boosts = boosts;
    }

    fn propose_competitions(
        &self,
        snapshot: &Snapshot,
        delta_time: f64,
        rng: &mut impl Rng,
        result: &mut SelectionResult,
    ) {
        let contenders: Vec<&Enzyme> = snapshot
            .enzymes
            .values()
            .filter(|e| !result.is_eliminated(&e.id))
            .collect();

        for (i, a) in contenders.iter().enumerate() {
            for b in &contenders[i + 1..] {
                if !compete(a, b) {
                    continue;
                }
                let fa = result.fitness[&a.id].total;
                let fb = result.fitness[&b.id].total;
                if (fa - fb).abs() > self.config.competition_window {
                    continue;
                }
                if !occurs(self.config.competition_rate, delta_time, rng) {
                    continue;
                }

                let p_a = if fa + fb > 0.0 { fa / (fa + fb) } else { 0.5 };
                let (winner, loser, wf, lf) = if rng.gen_bool(p_a.clamp(0.0, 1.0)) {
                    (a, b, fa, fb)
                } else {
                    (b, a, fb, fa)
                };
                trace!(winner = %winner.id, loser = %loser.id, "Competition resolved.");
                if !result.is_eliminated(&loser.id) {
                    result.competition_losers.insert(loser.id.clone());
                }
                result.competitions.push(Competition {
                    winner: winner.id.clone(),
                    loser: loser.id.clone(),
                    winner_fitness: wf,
                    loser_fitness: lf,
                });
            }
        }
    }

    fn propose_adaptive_adjustments(
        &self,
        snapshot: &Snapshot,
        delta_time: f64,
        rng: &mut impl Rng,
        result: &mut SelectionResult,
    ) {
        let config = &self.config;
        let mut adjustments = Vec::new();
        for (id, gene) in &snapshot.genes {
            let Some(score) = result.fitness.get(id) else {
                continue;
            };
            if result.is_eliminated(id) {
                continue;
            }
            let range = if score.total > config.adaptive_high_fitness {
                ADAPTIVE_INCREASE
            } else if score.total < config.adaptive_low_fitness {
                ADAPTIVE_DECREASE
            } else {
                continue;
            };
            if !occurs(config.adaptive_rate, delta_time, rng) {
                continue;
            }
            let new_basal_rate = (gene.basal_rate * uniform(range.0, range.1, rng))
                .clamp(config.min_basal_rate, config.max_basal_rate);
            if new_basal_rate != gene.basal_rate {
                adjustments.push(AdaptiveAdjustment {
                    enzyme_id: id.clone(),
                    old_basal_rate: gene.basal_rate,
                    new_basal_rate,
                });
            }
        }
        result.adaptive_adjustments = adjustments;
    }

    /// Appends this step's scores to the rolling history and updates the counters.
    pub fn record_selection(&mut self, result: &SelectionResult) {
        let limit = self.config.fitness_history_length.max(1);
        for (id, score) in &result.fitness {
            let history = self.fitness_history.entry(id.clone()).or_default();
            history.push_back(score.total);
            while history.len() > limit {
                history.pop_front();
            }
        }
        self.counts.record(result);
    }

    pub fn record_founder(&mut self, enzyme_id: &str, time: f64) -> bool {
        self.lineage.register_founder(enzyme_id, time)
    }

    pub fn record_birth(&mut self, enzyme_id: &str, parent: Option<&str>, time: f64) -> bool {
        self.lineage.record_birth(enzyme_id, parent, time)
    }

    pub fn record_death(&mut self, enzyme_id: &str, time: f64, cause: &str) {
        debug!(enzyme = %enzyme_id, cause, "Lineage death recorded.");
        self.lineage.record_death(enzyme_id, time, cause);
        self.fitness_history.remove(enzyme_id);
    }

    /// Forgets all history, lineage and counters.
    pub fn reset(&mut self) {
        self.fitness_history.clear();
        self.lineage.clear();
        self.counts = SelectionCounts::default();
    }
}

fn signature(enzyme: &Enzyme) -> Signature {
    let mut sig: Signature = enzyme.reactions.iter().map(|r| r.signature()).collect();
    sig.sort();
    sig
}

/// Two enzymes compete when they consume a common substrate or make a common product.
fn compete(a: &Enzyme, b: &Enzyme) -> bool {
    let side = |e: &Enzyme, products: bool| -> BTreeSet<String> {
        e.reactions
            .iter()
            .flat_map(|r| if products { r.products.keys() } else { r.substrates.keys() })
            .cloned()
            .collect()
    };
    !side(a, false).is_disjoint(&side(b, false)) || !side(a, true).is_disjoint(&side(b, true))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::gene::Gene;
    use crate::core::models::molecule::Molecule;
    use crate::core::models::reaction::Reaction;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn certain_selection() -> EvolutionConfig {
        EvolutionConfig {
            selection_rate: 100.0,
            competition_rate: 0.0,
            adaptive_rate: 0.0,
            min_enzymes: 0,
            ..EvolutionConfig::default()
        }
    }

    fn poor(id: &str, substrate: &str, product: &str) -> Enzyme {
        Enzyme::new(id, id, 0.5).with_reaction(
            Reaction::new(&format!("{}.r", id), "poor")
                .with_substrate(substrate, 1.0)
                .with_product(product, 1.0)
                .with_delta_g(20.0)
                .with_efficiency(0.01)
                .irreversible(),
        )
    }

    fn strong(id: &str, substrate: &str, product: &str) -> Enzyme {
        Enzyme::new(id, id, 0.5).with_reaction(
            Reaction::new(&format!("{}.r", id), "strong")
                .with_substrate(substrate, 1.0)
                .with_product(product, 1.0)
                .with_kinetics(10.0, 0.5)
                .with_delta_g(-40.0)
                .with_efficiency(0.9),
        )
    }

    fn snapshot(enzymes: Vec<Enzyme>, genes: Vec<Gene>) -> Snapshot {
        let molecules = [("A", 10.0), ("B", 0.01), ("C", 1.0), ("D", 1.0)]
            .into_iter()
            .map(|(n, c)| (n.to_string(), Molecule::new(n, c)))
            .collect();
        let enzymes = enzymes.into_iter().map(|e| (e.id.clone(), e)).collect();
        let genes = genes.into_iter().map(|g| (g.enzyme_id.clone(), g)).collect();
        Snapshot::capture(0.0, &molecules, &enzymes, &genes)
    }

    #[test]
    fn low_fitness_enzymes_are_eliminated() {
        let system = EvolutionSystem::new(certain_selection());
        let s = snapshot(vec![poor("weak", "C", "D"), strong("fit", "A", "B")], vec![]);
        let result = system.calculate(&s, 0.1, &mut StdRng::seed_from_u64(1));
        assert_eq!(result.eliminations.len(), 1);
        assert_eq!(result.eliminations[0].enzyme_id, "weak");
        assert_eq!(result.eliminations[0].reason, EliminationReason::LowFitness);
    }

    #[test]
    fn sources_sinks_and_locked_enzymes_are_protected() {
        let source = Enzyme::new("src", "src", 0.0)
            .with_reaction(Reaction::new("in", "in").with_product("C", 1.0).with_efficiency(0.01));
        let sink = Enzyme::new("snk", "snk", 0.0)
            .with_reaction(Reaction::new("out", "out").with_substrate("D", 1.0).with_efficiency(0.01));
        let locked = poor("locked", "C", "D").with_locked(true);
        let system = EvolutionSystem::new(certain_selection());
        let s = snapshot(vec![source, sink, locked], vec![]);
        let result = system.calculate(&s, 0.1, &mut StdRng::seed_from_u64(2));
        assert!(result.eliminations.is_empty());
    }

    #[test]
    fn population_never_drops_below_minimum() {
        let config = EvolutionConfig {
            min_enzymes: 3,
            ..certain_selection()
        };
        let system = EvolutionSystem::new(config);
        let enzymes = (0..5).map(|i| poor(&format!("w{}", i), "C", "D")).collect();
        let s = snapshot(enzymes, vec![]);
        for seed in 0..20 {
            let result = system.calculate(&s, 0.1, &mut StdRng::seed_from_u64(seed));
            assert_eq!(result.eliminations.len(), 2);
        }

        let at_floor = snapshot((0..3).map(|i| poor(&format!("w{}", i), "C", "D")).collect(), vec![]);
        let result = system.calculate(&at_floor, 0.1, &mut StdRng::seed_from_u64(0));
        assert!(result.eliminations.is_empty());
    }

    #[test]
    fn threshold_scales_above_the_cap() {
        let system = EvolutionSystem::new(EvolutionConfig {
            elimination_threshold: 0.2,
            enzyme_cap: 10,
            ..EvolutionConfig::default()
        });
        assert_eq!(system.elimination_threshold(5), 0.2);
        assert_eq!(system.elimination_threshold(10), 0.2);
        assert!((system.elimination_threshold(15) - 0.3).abs() < 1e-12);
        assert_eq!(system.elimination_threshold(1000), 0.9);
    }

    #[test]
    fn depleted_degradable_enzymes_are_eliminated() {
        let mut depleted = strong("gone", "A", "B").with_half_life(60.0);
        depleted.concentration = 0.0;
        let system = EvolutionSystem::new(EvolutionConfig {
            elimination_threshold: 0.0,
            ..certain_selection()
        });
        let s = snapshot(vec![depleted], vec![]);
        let result = system.calculate(&s, 0.1, &mut StdRng::seed_from_u64(3));
        assert_eq!(result.eliminations[0].reason, EliminationReason::Depleted);
    }

    #[test]
    fn weaker_twin_is_redundant() {
        let mut twin = strong("twin", "A", "B");
        twin.reactions[0].reaction_efficiency = 0.05;
        twin.reactions[0].vmax = 0.05;
        let system = EvolutionSystem::new(EvolutionConfig {
            elimination_threshold: 0.0,
            ..certain_selection()
        });
        let s = snapshot(vec![strong("best", "A", "B"), twin], vec![]);
        let result = system.calculate(&s, 0.1, &mut StdRng::seed_from_u64(4));
        assert_eq!(result.eliminations.len(), 1);
        assert_eq!(
            result.eliminations[0].reason,
            EliminationReason::Redundant {
                rival: "best".into()
            }
        );
    }

    #[test]
    fn elite_enzymes_with_genes_are_boosted() {
        let system = EvolutionSystem::new(certain_selection());
        let s = snapshot(
            vec![strong("fit", "A", "B"), strong("orphan", "C", "D")],
            vec![Gene::new("fit", 0.01)],
        );
        let result = system.calculate(&s, 0.1, &mut StdRng::seed_from_u64(5));
        assert!(result.fitness["fit"].total > 0.7);
        assert_eq!(result.boosts.len(), 1);
        assert_eq!(result.boosts[0].enzyme_id, "fit");
        let factor = result.boosts[0].factor;
        assert!((1.2..=3.0).contains(&factor));
    }

    #[test]
    fn boost_factor_is_clamped() {
        let system = EvolutionSystem::new(EvolutionConfig::default());
        assert_eq!(system.boost_factor(0.7), 1.2);
        assert_eq!(system.boost_factor(1.0), 3.0);
        assert!((system.boost_factor(0.79) - 1.6).abs() < 1e-9);
    }

    #[test]
    fn competition_winner_frequency_follows_relative_fitness() {
        let system = EvolutionSystem::new(EvolutionConfig {
            selection_rate: 0.0,
            competition_rate: 100.0,
            adaptive_rate: 0.0,
            ..EvolutionConfig::default()
        });
        let mut rival = strong("e2", "A", "B");
        rival.reactions[0].reaction_efficiency = 0.8;
        let s = snapshot(
            vec![strong("e1", "A", "B"), rival],
            vec![Gene::new("e1", 0.01), Gene::new("e2", 0.01)],
        );

        let mut rng = StdRng::seed_from_u64(42);
        let trials = 4000;
        let mut e1_wins = 0;
        let mut expected = 0.0;
        for _ in 0..trials {
            let result = system.calculate(&s, 0.1, &mut rng);
            assert_eq!(result.competitions.len(), 1);
            let c = &result.competitions[0];
            if c.winner == "e1" {
                e1_wins += 1;
            }
            let (f1, f2) = (result.fitness["e1"].total, result.fitness["e2"].total);
            assert!((f1 - f2).abs() <= 0.15);
            expected = f1 / (f1 + f2);
            assert!(result.competition_losers.contains(&c.loser));
        }
        let observed = e1_wins as f64 / trials as f64;
        assert!(
            (observed - expected).abs() < 0.03,
            "observed {} expected {}",
            observed,
            expected
        );
    }

    #[test]
    fn unrelated_enzymes_do_not_compete() {
        let system = EvolutionSystem::new(EvolutionConfig {
            selection_rate: 0.0,
            competition_rate: 100.0,
            ..EvolutionConfig::default()
        });
        let s = snapshot(vec![strong("e1", "A", "B"), strong("e2", "C", "D")], vec![]);
        let result = system.calculate(&s, 0.1, &mut StdRng::seed_from_u64(6));
        assert!(result.competitions.is_empty());
    }

    #[test]
    fn adaptive_adjustments_follow_fitness_and_bounds() {
        let system = EvolutionSystem::new(EvolutionConfig {
            selection_rate: 0.0,
            competition_rate: 0.0,
            adaptive_rate: 100.0,
            ..EvolutionConfig::default()
        });
        let s = snapshot(
            vec![strong("fit", "A", "B"), poor("weak", "C", "D")],
            vec![Gene::new("fit", 0.01), Gene::new("weak", 0.01)],
        );
        let result = system.calculate(&s, 0.1, &mut StdRng::seed_from_u64(7));
        assert_eq!(result.adaptive_adjustments.len(), 2);
        for adj in &result.adaptive_adjustments {
            match adj.enzyme_id.as_str() {
                "fit" => assert!(adj.new_basal_rate > adj.old_basal_rate),
                _ => assert!(adj.new_basal_rate < adj.old_basal_rate),
            }
        }
    }

    #[test]
    fn calculation_is_idempotent() {
        let system = EvolutionSystem::new(EvolutionConfig {
            competition_rate: 100.0,
            ..certain_selection()
        });
        let s = snapshot(
            vec![strong("e1", "A", "B"), strong("e2", "A", "B"), poor("w", "C", "D")],
            vec![Gene::new("e1", 0.01)],
        );
        let a = system.calculate(&s, 0.1, &mut StdRng::seed_from_u64(8));
        let b = system.calculate(&s, 0.1, &mut StdRng::seed_from_u64(8));
        assert_eq!(a, b);
        assert!(system.fitness_history("e1").is_none());
    }

    #[test]
    fn recorded_history_is_bounded_and_feeds_the_rolling_average() {
        let mut system = EvolutionSystem::new(EvolutionConfig {
            fitness_history_length: 3,
            ..EvolutionConfig::default()
        });
        for total in [0.1, 0.2, 0.3, 0.4] {
            let mut result = SelectionResult::default();
            result.fitness.insert(
                "e".into(),
                FitnessScore {
                    total,
                    ..Default::default()
                },
            );
            system.record_selection(&result);
        }
        let history = system.fitness_history("e").unwrap();
        assert_eq!(history.len(), 3);
        assert!((system.rolling_average("e", 0.5) - 0.35).abs() < 1e-12);
        assert_eq!(system.rolling_average("new", 0.5), 0.5);
    }

    #[test]
    fn deaths_close_the_lineage_and_drop_history() {
        let mut system = EvolutionSystem::new(EvolutionConfig::default());
        system.record_founder("e1", 0.0);
        system.record_birth("e1.1", Some("e1"), 1.0);
        let mut result = SelectionResult::default();
        result.fitness.insert("e1.1".into(), FitnessScore::default());
        system.record_selection(&result);

        system.record_death("e1.1", 2.0, "low fitness");
        assert!(system.fitness_history("e1.1").is_none());
        assert_eq!(system.lineage().living_count(), 1);
        assert_eq!(system.lineage().max_generation(), 1);
    }
}
