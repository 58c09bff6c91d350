use serde::{Deserialize, Serialize};

/// Binding of a transcription factor (a molecule) to a gene's promoter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegulatoryElement {
    pub molecule_name: String,
    /// Dissociation constant in mM.
    pub kd: f64,
    pub max_fold_change: f64,
    pub hill_coefficient: f64,
}

impl RegulatoryElement {
    pub fn new(molecule_name: &str, kd: f64, max_fold_change: f64, hill_coefficient: f64) -> Self {
        Self {
            molecule_name: molecule_name.to_string(),
            kd,
            max_fold_change,
            hill_coefficient,
        }
    }

    /// Fractional occupancy `[m]^n / (kd^n + [m]^n)` of the binding site.
    pub fn occupancy(&self, concentration: f64) -> f64 {
        let c = concentration.max(0.0);
        if c == 0.0 {
            return 0.0;
        }
        let n = self.hill_coefficient;
        let c_n = c.powf(n);
        let kd_n = self.kd.max(1e-12).powf(n);
        c_n / (kd_n + c_n)
    }
}

/// Regulates the synthesis of exactly one enzyme, identified by `enzyme_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gene {
    pub enzyme_id: String,
    /// Synthesis rate in mM/s with no regulation.
    pub basal_rate: f64,
    pub is_active: bool,
    pub activators: Vec<RegulatoryElement>,
    pub repressors: Vec<RegulatoryElement>,
    #[serde(skip, default = "unit_fold")]
    pub fold_change: f64,
    #[serde(skip)]
    pub expression_rate: f64,
}

fn unit_fold() -> f64 {
    1.0
}

impl Gene {
    pub fn new(enzyme_id: &str, basal_rate: f64) -> Self {
        Self {
            enzyme_id: enzyme_id.to_string(),
            basal_rate: basal_rate.max(0.0),
            is_active: true,
            activators: Vec::new(),
            repressors: Vec::new(),
            fold_change: 1.0,
            expression_rate: 0.0,
        }
    }

    pub fn with_activator(mut self, element: RegulatoryElement) -> Self {
        self.activators.push(element);
        self
    }

    pub fn with_repressor(mut self, element: RegulatoryElement) -> Self {
        self.repressors.push(element);
        self
    }

    pub fn with_active(mut self, active: bool) -> Self {
        self.is_active = active;
        self
    }

    pub fn regulator_count(&self) -> usize {
        self.activators.len() + self.repressors.len()
    }

    pub fn is_constitutive(&self) -> bool {
        self.regulator_count() == 0
    }

    /// Every molecule acting on this gene, activators first.
    pub fn regulators(&self) -> impl Iterator<Item = &RegulatoryElement> {
        self.activators.iter().chain(self.repressors.iter())
    }
}
