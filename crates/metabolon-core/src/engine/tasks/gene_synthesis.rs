use crate::core::regulation::ExpressionCalculator;
use crate::engine::snapshot::Snapshot;
use std::collections::BTreeMap;
use tracing::instrument;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Expression {
    pub fold_change: f64,
    pub rate: f64,
}

/// Expression rates of every gene and the enzyme amounts they synthesize in one step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeneSynthesis {
    /// Keyed by the regulated enzyme's id.
    pub expression: BTreeMap<String, Expression>,
    /// mM of enzyme synthesized over the step.
    pub amounts: BTreeMap<String, f64>,
}

impl GeneSynthesis {
    pub fn is_empty(&self) -> bool {
        self.amounts.is_empty()
    }
}

/// Genes whose enzyme is absent from the snapshot synthesize nothing.
#[instrument(level = "trace", skip_all, name = "gene_synthesis_task")]
pub fn run(snapshot: &Snapshot, delta_time: f64, locked: bool) -> GeneSynthesis {
    let mut synthesis = GeneSynthesis::default();
    let concentrations = &snapshot.molecule_concentrations;

    for (id, gene) in &snapshot.genes {
        let fold_change = ExpressionCalculator::fold_change(gene, concentrations);
        let rate = ExpressionCalculator::expression_rate(gene, concentrations);
        synthesis
            .expression
            .insert(id.clone(), Expression { fold_change, rate });

        if locked || rate <= 0.0 || !snapshot.enzymes.contains_key(&gene.enzyme_id) {
            continue;
        }
        *synthesis.amounts.entry(gene.enzyme_id.clone()).or_insert(0.0) += rate * delta_time;
    }
    synthesis
}
