use crate::core::models::cell::CellParameters;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Invalid value for '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

fn invalid(name: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidParameter {
        name,
        reason: reason.into(),
    }
}

fn require_non_negative(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(invalid(name, format!("must be a finite, non-negative number, got {}", value)))
    }
}

fn require_unit_interval(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(invalid(name, format!("must lie in [0, 1], got {}", value)))
    }
}

/// Rates are per entity per simulated second. Each event is a Bernoulli trial with
/// probability `rate · dt`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MutationConfig {
    pub point_mutation_rate: f64,
    pub duplication_rate: f64,
    pub novel_enzyme_rate: f64,
    pub gene_mutation_rate: f64,
    /// Relative half-width of the uniform drift applied by point mutations.
    pub drift: f64,
    pub max_enzymes: usize,
    pub max_regulators_per_gene: usize,
    pub duplicate_concentration_fraction: f64,
    pub substitution_chance: f64,
    pub novel_product_chance: f64,
    pub new_gene_basal_rate: f64,
    pub product_repression_chance: f64,
    pub substrate_activation_chance: f64,
}

impl Default for MutationConfig {
    fn default() -> Self {
        Self {
            point_mutation_rate: 0.01,
            duplication_rate: 0.002,
            novel_enzyme_rate: 0.001,
            gene_mutation_rate: 0.005,
            drift: 0.1,
            max_enzymes: 30,
            max_regulators_per_gene: 4,
            duplicate_concentration_fraction: 0.1,
            substitution_chance: 0.3,
            novel_product_chance: 0.2,
            new_gene_basal_rate: 0.0005,
            product_repression_chance: 0.5,
            substrate_activation_chance: 0.5,
        }
    }
}

impl MutationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_non_negative("mutation.point_mutation_rate", self.point_mutation_rate)?;
        require_non_negative("mutation.duplication_rate", self.duplication_rate)?;
        require_non_negative("mutation.novel_enzyme_rate", self.novel_enzyme_rate)?;
        require_non_negative("mutation.gene_mutation_rate", self.gene_mutation_rate)?;
        require_unit_interval("mutation.drift", self.drift)?;
        require_unit_interval(
            "mutation.duplicate_concentration_fraction",
            self.duplicate_concentration_fraction,
        )?;
        require_unit_interval("mutation.substitution_chance", self.substitution_chance)?;
        require_unit_interval("mutation.novel_product_chance", self.novel_product_chance)?;
        require_non_negative("mutation.new_gene_basal_rate", self.new_gene_basal_rate)?;
        require_unit_interval(
            "mutation.product_repression_chance",
            self.product_repression_chance,
        )?;
        require_unit_interval(
            "mutation.substrate_activation_chance",
            self.substrate_activation_chance,
        )?;
        Ok(())
    }
}

/// Relative weights of the five fitness sub-scores.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitnessWeights {
    pub efficiency: f64,
    pub flux: f64,
    pub cost: f64,
    pub thermal: f64,
    pub regulation: f64,
}

impl Default for FitnessWeights {
    fn default() -> Self {
        Self {
            efficiency: 0.30,
            flux: 0.25,
            cost: 0.20,
            thermal: 0.15,
            regulation: 0.10,
        }
    }
}

impl FitnessWeights {
    pub fn sum(&self) -> f64 {
        self.efficiency + self.flux + self.cost + self.thermal + self.regulation
    }

    /// Weights rescaled to sum to 1, so the weighted fitness stays in `[0, 1]`.
    pub fn normalized(&self) -> Self {
        let sum = self.sum();
        if sum <= 0.0 {
            return Self::default();
        }
        Self {
            efficiency: self.efficiency / sum,
            flux: self.flux / sum,
            cost: self.cost / sum,
            thermal: self.thermal / sum,
            regulation: self.regulation / sum,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvolutionConfig {
    pub weights: FitnessWeights,
    pub elimination_threshold: f64,
    /// Above this population the elimination threshold scales up.
    pub enzyme_cap: usize,
    pub min_enzymes: usize,
    pub near_zero_concentration: f64,
    pub redundancy_margin: f64,
    pub boost_threshold: f64,
    pub competition_window: f64,
    pub competition_loss_factor: f64,
    pub fitness_history_length: usize,
    /// Probability per second that a candidate elimination or boost is acted upon.
    pub selection_rate: f64,
    /// Probability per second that an eligible pair competes.
    pub competition_rate: f64,
    pub adaptive_rate: f64,
    pub adaptive_high_fitness: f64,
    pub adaptive_low_fitness: f64,
    pub min_basal_rate: f64,
    pub max_basal_rate: f64,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            weights: FitnessWeights::default(),
            elimination_threshold: 0.2,
            enzyme_cap: 20,
            min_enzymes: 3,
            near_zero_concentration: 1e-6,
            redundancy_margin: 0.2,
            boost_threshold: 0.7,
            competition_window: 0.15,
            competition_loss_factor: 0.8,
            fitness_history_length: 20,
            selection_rate: 0.05,
            competition_rate: 0.05,
            adaptive_rate: 0.02,
            adaptive_high_fitness: 0.6,
            adaptive_low_fitness: 0.3,
            min_basal_rate: 1e-6,
            max_basal_rate: 10.0,
        }
    }
}

impl EvolutionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let w = &self.weights;
        for (name, value) in [
            ("evolution.weights.efficiency", w.efficiency),
            ("evolution.weights.flux", w.flux),
            ("evolution.weights.cost", w.cost),
            ("evolution.weights.thermal", w.thermal),
            ("evolution.weights.regulation", w.regulation),
        ] {
            require_non_negative(name, value)?;
        }
        if w.sum() <= 0.0 {
            return Err(invalid("evolution.weights", "at least one weight must be positive"));
        }
        require_unit_interval("evolution.elimination_threshold", self.elimination_threshold)?;
        require_unit_interval("evolution.boost_threshold", self.boost_threshold)?;
        require_unit_interval("evolution.competition_window", self.competition_window)?;
        require_unit_interval("evolution.competition_loss_factor", self.competition_loss_factor)?;
        require_unit_interval("evolution.redundancy_margin", self.redundancy_margin)?;
        require_unit_interval("evolution.adaptive_high_fitness", self.adaptive_high_fitness)?;
        require_unit_interval("evolution.adaptive_low_fitness", self.adaptive_low_fitness)?;
        require_non_negative("evolution.near_zero_concentration", self.near_zero_concentration)?;
        require_non_negative("evolution.selection_rate", self.selection_rate)?;
        require_non_negative("evolution.competition_rate", self.competition_rate)?;
        require_non_negative("evolution.adaptive_rate", self.adaptive_rate)?;
        require_non_negative("evolution.min_basal_rate", self.min_basal_rate)?;
        if self.max_basal_rate < self.min_basal_rate {
            return Err(invalid(
                "evolution.max_basal_rate",
                "must not be below evolution.min_basal_rate",
            ));
        }
        if self.fitness_history_length == 0 {
            return Err(invalid("evolution.fitness_history_length", "must be at least 1"));
        }
        if self.enzyme_cap == 0 {
            return Err(invalid("evolution.enzyme_cap", "must be at least 1"));
        }
        if self.min_enzymes > self.enzyme_cap {
            return Err(invalid(
                "evolution.min_enzymes",
                format!("must not exceed the enzyme cap ({})", self.enzyme_cap),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Simulated seconds per fixed step.
    pub time_step: f64,
    /// Multiplier applied to real elapsed time in [`crate::engine::simulator::Simulator::tick`].
    pub time_scale: f64,
    pub max_history_length: usize,
    /// Seed for the random source. `None` draws one from entropy.
    pub seed: Option<u64>,
    pub mutation: MutationConfig,
    pub evolution: EvolutionConfig,
    pub cell: CellParameters,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            time_step: 0.1,
            time_scale: 1.0,
            max_history_length: 500,
            seed: None,
            mutation: MutationConfig::default(),
            evolution: EvolutionConfig::default(),
            cell: CellParameters::default(),
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.time_step.is_finite() && self.time_step > 0.0) {
            return Err(invalid(
                "time_step",
                format!("must be positive, got {}", self.time_step),
            ));
        }
        require_non_negative("time_scale", self.time_scale)?;
        if self.max_history_length == 0 {
            return Err(invalid("max_history_length", "must be at least 1"));
        }
        if self.cell.max_temperature <= self.cell.ambient_temperature {
            return Err(invalid(
                "cell.max_temperature",
                "must exceed the ambient temperature",
            ));
        }
        require_non_negative("cell.cooling_rate", self.cell.cooling_rate)?;
        require_non_negative("cell.maintenance_cost", self.cell.maintenance_cost)?;
        if self.cell.heat_capacity <= 0.0 {
            return Err(invalid("cell.heat_capacity", "must be positive"));
        }
        self.mutation.validate()?;
        self.evolution.validate()?;
        Ok(())
    }
}

#[derive(Default)]
pub struct SimulationConfigBuilder {
    time_step: Option<f64>,
    time_scale: Option<f64>,
    max_history_length: Option<usize>,
    seed: Option<u64>,
    mutation: Option<MutationConfig>,
    evolution: Option<EvolutionConfig>,
    cell: Option<CellParameters>,
}

impl SimulationConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn time_step(mut self, seconds: f64) -> Self {
        self.time_step = Some(seconds);
        self
    }
    pub fn time_scale(mut self, scale: f64) -> Self {
        self.time_scale = Some(scale);
        self
    }
    pub fn max_history_length(mut self, length: usize) -> Self {
        self.max_history_length = Some(length);
        self
    }
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
    pub fn mutation(mut self, config: MutationConfig) -> Self {
        self.mutation = Some(config);
        self
    }
    pub fn evolution(mut self, config: EvolutionConfig) -> Self {
        self.evolution = Some(config);
        self
    }
    pub fn cell(mut self, parameters: CellParameters) -> Self {
        self.cell = Some(parameters);
        self
    }

    pub fn build(self) -> Result<SimulationConfig, ConfigError> {
        let defaults = SimulationConfig::default();
        let config = SimulationConfig {
            time_step: self.time_step.unwrap_or(defaults.time_step),
            time_scale: self.time_scale.unwrap_or(defaults.time_scale),
            max_history_length: self
                .max_history_length
                .unwrap_or(defaults.max_history_length),
            seed: self.seed.or(defaults.seed),
            mutation: self.mutation.unwrap_or(defaults.mutation),
            evolution: self.evolution.unwrap_or(defaults.evolution),
            cell: self.cell.unwrap_or(defaults.cell),
        };
        config.validate()?;
        Ok(config)
    }
}
