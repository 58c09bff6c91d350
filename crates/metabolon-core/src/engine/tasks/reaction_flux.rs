use crate::core::kinetics::rates::RateCalculator;
use crate::core::models::Concentrations;
use crate::core::models::reaction::ReactionState;
use crate::engine::snapshot::Snapshot;
use std::collections::BTreeMap;
use tracing::{instrument, trace};

/// Reaction rates evaluated on a snapshot and the concentration changes they imply.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReactionFlux {
    /// Per enzyme, one state per owned reaction in declaration order.
    pub states: BTreeMap<String, Vec<ReactionState>>,
    /// Net change in mM over the step, keyed by molecule name.
    pub concentration_deltas: Concentrations,
}

impl ReactionFlux {
    pub fn is_empty(&self) -> bool {
        self.concentration_deltas.is_empty()
    }

    pub fn state(&self, enzyme_id: &str, index: usize) -> Option<&ReactionState> {
        self.states.get(enzyme_id).and_then(|s| s.get(index))
    }
}

#[instrument(level = "trace", skip_all, name = "reaction_flux_task")]
pub fn run(snapshot: &Snapshot, delta_time: f64, locked: bool) -> ReactionFlux {
    let mut flux = ReactionFlux::default();

    for (id, enzyme) in &snapshot.enzymes {
        let enzyme_concentration = snapshot.effective_enzyme_concentration(enzyme);
        let mut states = Vec::with_capacity(enzyme.reactions.len());

        for reaction in &enzyme.reactions {
            let state = RateCalculator::evaluate(
                reaction,
                &snapshot.molecule_concentrations,
                enzyme_concentration,
            );

            if !locked {
                let extent = state.net_rate() * delta_time;
                if extent != 0.0 {
                    for (name, coefficient) in &reaction.substrates {
                        *flux.concentration_deltas.entry(name.clone()).or_insert(0.0) -=
                            coefficient * extent;
                    }
                    for (name, coefficient) in &reaction.products {
                        *flux.concentration_deltas.entry(name.clone()).or_insert(0.0) +=
                            coefficient * extent;
                    }
                }
            }
            states.push(state);
        }
        flux.states.insert(id.clone(), states);
    }

    trace!(
        reactions = snapshot.reactions.len(),
        deltas = flux.concentration_deltas.len(),
        "Evaluated reaction flux."
    );
    flux
}
