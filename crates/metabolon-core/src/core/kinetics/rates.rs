use super::energy::EnergyPartition;
use super::thermodynamics::{actual_delta_g, equilibrium_constant, rt};
use crate::core::models::Concentrations;
use crate::core::models::reaction::{Reaction, ReactionState};
use std::collections::BTreeMap;

/// Beyond this magnitude of actual ΔG (kJ/mol) the unfavorable direction is blocked.
pub const BLOCKING_DELTA_G: f64 = 10.0;

/// Floor on Keq in the Haldane relationship, so reverse Vmax stays bounded.
pub const MIN_HALDANE_KEQ: f64 = 0.01;

/// Stateless Michaelis-Menten calculator constrained by thermodynamics.
pub struct RateCalculator;

impl RateCalculator {
    /// Computes rates and energetics of `reaction` for the given molecule
    /// concentrations and effective enzyme concentration.
    pub fn evaluate(
        reaction: &Reaction,
        concentrations: &Concentrations,
        enzyme_concentration: f64,
    ) -> ReactionState {
        let keq = equilibrium_constant(reaction.delta_g, reaction.temperature);
        let delta_g_actual = actual_delta_g(reaction, concentrations);
        let forward_rate =
            Self::forward_rate(reaction, concentrations, enzyme_concentration, delta_g_actual);
        let reverse_rate = Self::reverse_rate(
            reaction,
            concentrations,
            enzyme_concentration,
            delta_g_actual,
            keq,
        );
        let energy = EnergyPartition::from_flux(
            delta_g_actual,
            forward_rate - reverse_rate,
            reaction.reaction_efficiency,
        );

        ReactionState {
            forward_rate,
            reverse_rate,
            delta_g_actual,
            keq,
            useful_work: energy.useful_work,
            heat_generated: energy.heat,
        }
    }

    /// Evaluates the reaction and stores the result in its runtime state.
    pub fn update(
        reaction: &mut Reaction,
        concentrations: &Concentrations,
        enzyme_concentration: f64,
    ) -> ReactionState {
        let state = Self::evaluate(reaction, concentrations, enzyme_concentration);
        reaction.state = state;
        state
    }

    pub fn forward_rate(
        reaction: &Reaction,
        concentrations: &Concentrations,
        enzyme_concentration: f64,
        delta_g_actual: f64,
    ) -> f64 {
        if enzyme_concentration <= 0.0 {
            return 0.0;
        }
        if reaction.is_source() {
            return reaction.vmax * enzyme_concentration;
        }
        if delta_g_actual > BLOCKING_DELTA_G {
            return 0.0;
        }

        let saturation = limiting_saturation(&reaction.substrates, concentrations, reaction.km);
        let mut rate =
            reaction.vmax * enzyme_concentration * saturation * reaction.reaction_efficiency;
        if delta_g_actual > 0.0 {
            rate *= (-delta_g_actual / rt(reaction.temperature)).exp();
        }
        rate
    }

    pub fn reverse_rate(
        reaction: &Reaction,
        concentrations: &Concentrations,
        enzyme_concentration: f64,
        delta_g_actual: f64,
        keq: f64,
    ) -> f64 {
        if reaction.is_irreversible
            || enzyme_concentration <= 0.0
            || reaction.is_source()
            || reaction.is_sink()
        {
            return 0.0;
        }
        if delta_g_actual < -BLOCKING_DELTA_G {
            return 0.0;
        }

        let saturation = limiting_saturation(&reaction.products, concentrations, reaction.km);
        let mut rate = Self::reverse_vmax(reaction.vmax, keq)
            * enzyme_concentration
            * saturation
            * reaction.reaction_efficiency;
        if delta_g_actual < 0.0 {
            rate *= (delta_g_actual / rt(reaction.temperature)).exp();
        }
        rate
    }

    /// Haldane relationship: `Vmax_rev = Vmax_fwd / max(Keq, 0.01)`.
    #[inline]
    pub fn reverse_vmax(vmax: f64, keq: f64) -> f64 {
        vmax / keq.max(MIN_HALDANE_KEQ)
    }
}

/// Minimum of `S / (Km + S)` across all participants.
///
/// The slowest participant limits the whole reaction, which approximates an ordered,
/// rate-limiting mechanism rather than independent binding.
fn limiting_saturation(
    participants: &BTreeMap<String, f64>,
    concentrations: &Concentrations,
    km: f64,
) -> f64 {
    participants
        .keys()
        .map(|name| {
            let s = concentrations.get(name).copied().unwrap_or(0.0).max(0.0);
            s / (km.max(0.0) + s).max(1e-12)
        })
        .fold(f64::INFINITY, f64::min)
        .min(1.0)
}
