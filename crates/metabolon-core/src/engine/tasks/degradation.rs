use crate::engine::snapshot::Snapshot;
use std::collections::BTreeMap;
use tracing::instrument;

/// First-order decay of every degradable enzyme over one step, in mM lost.
///
/// The exact solution `[E]·(1 - e^(-k·dt))` is used so a step can never remove more
/// enzyme than is present.
#[instrument(level = "trace", skip_all, name = "degradation_task")]
pub fn run(snapshot: &Snapshot, delta_time: f64, locked: bool) -> BTreeMap<String, f64> {
    if locked {
        return BTreeMap::new();
    }
    snapshot
        .enzymes
        .iter()
        .filter(|(_, e)| e.is_degradable)
        .filter_map(|(id, e)| {
            let amount = e.concentration * (1.0 - (-e.degradation_rate() * delta_time).exp());
            (amount > 0.0).then(|| (id.clone(), amount))
        })
        .collect()
}
