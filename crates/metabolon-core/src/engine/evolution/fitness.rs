use crate::core::kinetics::energy::{EnergyPartition, NEGLIGIBLE_RATE};
use crate::core::kinetics::rates::RateCalculator;
use crate::core::models::enzyme::Enzyme;
use crate::core::regulation::occupancy_of;
use crate::engine::config::FitnessWeights;
use crate::engine::snapshot::Snapshot;
use serde::{Deserialize, Serialize};

/// ΔG° (kJ/mol) below which a reaction starts earning the efficiency bonus.
const EXERGONIC_BONUS_ONSET: f64 = -10.0;
/// Width of the ΔG° band over which the bonus grows to its maximum.
const EXERGONIC_BONUS_SPAN: f64 = 30.0;
const EXERGONIC_BONUS: f64 = 0.2;
/// Net rate (mM/s) at which the flux score saturates.
const FLUX_SATURATION: f64 = 10.0;
/// Specific activity (1/s) scale of the cost score.
const SPECIFIC_ACTIVITY_SCALE: f64 = 5.0;
const MIN_ENZYME_FOR_ACTIVITY: f64 = 1e-6;
const NEUTRAL_SCORE: f64 = 0.5;
const RESPONSIVE_OCCUPANCY: (f64, f64) = (0.1, 0.9);
const REGULATOR_REWARD: f64 = 0.1;
const REGULATOR_PENALTY: f64 = 0.1;
const MAX_UNPENALIZED_REGULATORS: usize = 3;

/// Five sub-scores in `[0, 1]` and their weighted total.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FitnessScore {
    pub efficiency: f64,
    pub flux: f64,
    pub cost: f64,
    pub thermal: f64,
    pub regulation: f64,
    pub total: f64,
}

impl FitnessScore {
    /// Scores `enzyme` against the snapshot. Rates are re-evaluated from the snapshot
    /// and never read from the reactions' cached state.
    pub fn evaluate(enzyme: &Enzyme, snapshot: &Snapshot, weights: &FitnessWeights) -> Self {
        let concentrations = &snapshot.molecule_concentrations;
        let effective = snapshot.effective_enzyme_concentration(enzyme);

        let mut net_flux = 0.0;
        let mut energy = EnergyPartition::default();
        for reaction in &enzyme.reactions {
            let state = RateCalculator::evaluate(reaction, concentrations, effective);
            net_flux += state.net_rate().abs();
            energy += EnergyPartition::new(state.useful_work, state.heat_generated);
        }

        let efficiency = efficiency_score(enzyme);
        let flux = flux_score(net_flux);
        let cost = cost_score(net_flux, snapshot.enzyme_concentration(&enzyme.id));
        let thermal = thermal_score(&energy);
        let regulation = regulation_score(enzyme, snapshot);

        let w = weights.normalized();
        let total = (w.efficiency * efficiency
            + w.flux * flux
            + w.cost * cost
            + w.thermal * thermal
            + w.regulation * regulation)
            .clamp(0.0, 1.0);

        Self {
            efficiency,
            flux,
            cost,
            thermal,
            regulation,
            total,
        }
    }
}

/// Mean reaction efficiency plus a bonus for strongly exergonic chemistry.
pub fn efficiency_score(enzyme: &Enzyme) -> f64 {
    let n = enzyme.reactions.len();
    if n == 0 {
        return 0.0;
    }
    let mean_efficiency =
        enzyme.reactions.iter().map(|r| r.reaction_efficiency).sum::<f64>() / n as f64;
    let mean_delta_g = enzyme.reactions.iter().map(|r| r.delta_g).sum::<f64>() / n as f64;
    let bonus = ((EXERGONIC_BONUS_ONSET - mean_delta_g) / EXERGONIC_BONUS_SPAN).clamp(0.0, 1.0);
    (mean_efficiency + EXERGONIC_BONUS * bonus).clamp(0.0, 1.0)
}

/// `ln(1 + |net|) / ln(1 + 10)`.
pub fn flux_score(net_flux: f64) -> f64 {
    ((1.0 + net_flux.abs()).ln() / (1.0 + FLUX_SATURATION).ln()).clamp(0.0, 1.0)
}

/// `1 - exp(-specific_activity / 5)`.
pub fn cost_score(net_flux: f64, enzyme_concentration: f64) -> f64 {
    let specific_activity = net_flux.abs() / enzyme_concentration.max(MIN_ENZYME_FOR_ACTIVITY);
    (1.0 - (-specific_activity / SPECIFIC_ACTIVITY_SCALE).exp()).clamp(0.0, 1.0)
}

pub fn thermal_score(energy: &EnergyPartition) -> f64 {
    if energy.total() <= NEGLIGIBLE_RATE {
        return NEUTRAL_SCORE;
    }
    energy.work_fraction().unwrap_or(NEUTRAL_SCORE).clamp(0.0, 1.0)
}

/// Rewards regulators that are neither saturated nor idle and penalizes crowded
/// promoters. Enzymes without a gene score neutrally.
pub fn regulation_score(enzyme: &Enzyme, snapshot: &Snapshot) -> f64 {
    let Some(gene) = snapshot.genes.get(&enzyme.id) else {
        return NEUTRAL_SCORE;
    };
    let (low, high) = RESPONSIVE_OCCUPANCY;
    let responsive = gene
        .regulators()
        .map(|r| occupancy_of(r, &snapshot.molecule_concentrations))
        .filter(|occ| (low..=high).contains(occ))
        .count();
    let crowding = gene.regulator_count().saturating_sub(MAX_UNPENALIZED_REGULATORS);
    (NEUTRAL_SCORE + REGULATOR_REWARD * responsive as f64 - REGULATOR_PENALTY * crowding as f64)
        .clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::gene::{Gene, RegulatoryElement};
    use crate::core::models::molecule::Molecule;
    use crate::core::models::reaction::Reaction;
    use std::collections::BTreeMap;

    const TOLERANCE: f64 = 1e-9;

    fn f64_approx_equal(a: f64, b: f64) -> bool {
        (a - b).abs() < TOLERANCE
    }

    fn snapshot(enzyme: Enzyme, genes: Vec<Gene>, levels: &[(&str, f64)]) -> Snapshot {
        let molecules = levels
            .iter()
            .map(|(n, c)| (n.to_string(), Molecule::new(n, *c)))
            .collect();
        let enzymes = [(enzyme.id.clone(), enzyme)].into_iter().collect();
        let genes = genes.into_iter().map(|g| (g.enzyme_id.clone(), g)).collect();
        Snapshot::capture(0.0, &molecules, &enzymes, &genes)
    }

    fn converter(delta_g: f64, efficiency: f64) -> Enzyme {
        Enzyme::new("e", "E", 0.5).with_reaction(
            Reaction::new("r", "A->B")
                .with_substrate("A", 1.0)
                .with_product("B", 1.0)
                .with_delta_g(delta_g)
                .with_efficiency(efficiency),
        )
    }

    #[test]
    fn exergonic_bonus_saturates() {
        assert!(f64_approx_equal(efficiency_score(&converter(-5.0, 0.5)), 0.5));
        assert!(f64_approx_equal(efficiency_score(&converter(-25.0, 0.5)), 0.6));
        assert!(f64_approx_equal(efficiency_score(&converter(-60.0, 0.5)), 0.7));
        assert!(f64_approx_equal(efficiency_score(&converter(-60.0, 0.95)), 1.0));
    }

    #[test]
    fn flux_score_is_logarithmic_and_bounded() {
        assert_eq!(flux_score(0.0), 0.0);
        assert!(f64_approx_equal(flux_score(10.0), 1.0));
        assert_eq!(flux_score(1e6), 1.0);
        assert!(flux_score(1.0) > 0.25 && flux_score(1.0) < 0.35);
    }

    #[test]
    fn cost_score_rewards_specific_activity() {
        assert_eq!(cost_score(0.0, 1.0), 0.0);
        assert!(cost_score(1.0, 0.1) > cost_score(1.0, 1.0));
        assert!(cost_score(1.0, 0.0) <= 1.0);
    }

    #[test]
    fn thermal_score_is_neutral_without_energy_flow() {
        assert_eq!(thermal_score(&EnergyPartition::default()), 0.5);
        assert!(f64_approx_equal(thermal_score(&EnergyPartition::new(3.0, 1.0)), 0.75));
    }

    #[test]
    fn responsive_regulators_raise_the_regulation_score() {
        let gene = Gene::new("e", 0.01)
            .with_activator(RegulatoryElement::new("A", 1.0, 5.0, 1.0))
            .with_repressor(RegulatoryElement::new("B", 1.0, 5.0, 1.0));
        let s = snapshot(converter(-10.0, 0.5), vec![gene], &[("A", 1.0), ("B", 100.0)]);
        // A sits at half occupancy; B is saturated.
        assert!(f64_approx_equal(regulation_score(&s.enzymes["e"], &s), 0.6));
    }

    #[test]
    fn crowded_promoters_are_penalized() {
        let mut gene = Gene::new("e", 0.01);
        for name in ["X1", "X2", "X3", "X4", "X5"] {
            gene = gene.with_repressor(RegulatoryElement::new(name, 1.0, 2.0, 1.0));
        }
        let s = snapshot(converter(-10.0, 0.5), vec![gene], &[("A", 1.0)]);
        assert!(f64_approx_equal(regulation_score(&s.enzymes["e"], &s), 0.3));
    }

    #[test]
    fn total_fitness_is_bounded() {
        let weights = FitnessWeights::default();
        for (dg, eff, a) in [(-50.0, 1.0, 100.0), (20.0, 0.01, 0.0), (-5.0, 0.5, 1.0)] {
            let s = snapshot(converter(dg, eff), vec![], &[("A", a), ("B", 0.1)]);
            let score = FitnessScore::evaluate(&s.enzymes["e"], &s, &weights);
            for v in [score.efficiency, score.flux, score.cost, score.thermal, score.regulation, score.total] {
                assert!((0.0..=1.0).contains(&v), "{:?}", score);
            }
        }
    }
}
