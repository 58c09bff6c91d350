//! Gene expression from basal rate and regulator occupancy.

use crate::core::models::Concentrations;
use crate::core::models::gene::{Gene, RegulatoryElement};

pub struct ExpressionCalculator;

impl ExpressionCalculator {
    /// `1 + (max_fold - 1)·occupancy`.
    #[inline]
    pub fn activation_fold(element: &RegulatoryElement, concentrations: &Concentrations) -> f64 {
        1.0 + (element.max_fold_change - 1.0) * occupancy_of(element, concentrations)
    }

    /// `1 / (1 + (max_fold - 1)·occupancy)`.
    #[inline]
    pub fn repression_fold(element: &RegulatoryElement, concentrations: &Concentrations) -> f64 {
        1.0 / (1.0 + (element.max_fold_change - 1.0) * occupancy_of(element, concentrations))
    }

    /// Product of every activator and repressor contribution. Constitutive genes have a
    /// fold change of 1.
    pub fn fold_change(gene: &Gene, concentrations: &Concentrations) -> f64 {
        let activation: f64 = gene
            .activators
            .iter()
            .map(|a| Self::activation_fold(a, concentrations))
            .product();
        let repression: f64 = gene
            .repressors
            .iter()
            .map(|r| Self::repression_fold(r, concentrations))
            .product();
        activation * repression
    }

    /// Synthesis rate in mM/s; zero for inactive genes.
    pub fn expression_rate(gene: &Gene, concentrations: &Concentrations) -> f64 {
        if !gene.is_active {
            return 0.0;
        }
        (gene.basal_rate * Self::fold_change(gene, concentrations)).max(0.0)
    }

    /// Computes and caches the fold change and expression rate on the gene.
    pub fn update(gene: &mut Gene, concentrations: &Concentrations) -> f64 {
        gene.fold_change = Self::fold_change(gene, concentrations);
        gene.expression_rate = if gene.is_active {
            (gene.basal_rate * gene.fold_change).max(0.0)
        } else {
            0.0
        };
        gene.expression_rate
    }
}

#[inline]
pub(crate) fn occupancy_of(element: &RegulatoryElement, concentrations: &Concentrations) -> f64 {
    element.occupancy(
        concentrations
            .get(&element.molecule_name)
            .copied()
            .unwrap_or(0.0),
    )
}
