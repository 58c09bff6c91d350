use super::Concentrations;
use super::reaction::Reaction;
use serde::{Deserialize, Serialize};
use tracing::warn;

const MIN_ADENYLATE_POOL: f64 = 0.1;

/// Physical constants of the compartment hosting the network.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CellParameters {
    /// K.
    pub ambient_temperature: f64,
    /// Lethal temperature in K.
    pub max_temperature: f64,
    /// kJ/K. Converts generated heat into a temperature rise.
    pub heat_capacity: f64,
    /// 1/s. Newtonian relaxation toward ambient temperature.
    pub cooling_rate: f64,
    /// kJ/s drained from the energy pool.
    pub maintenance_cost: f64,
}

impl Default for CellParameters {
    fn default() -> Self {
        Self {
            ambient_temperature: 310.0,
            max_temperature: 330.0,
            heat_capacity: 100.0,
            cooling_rate: 0.1,
            maintenance_cost: 0.0,
        }
    }
}

/// Aggregate state of the cell: thermal balance, usable energy and viability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub parameters: CellParameters,
    pub is_alive: bool,
    pub death_cause: Option<String>,
    pub temperature: f64,
    pub energy_pool: f64,
    pub total_heat: f64,
    pub total_useful_work: f64,
    /// Heat released during the last update, per second.
    pub heat_rate: f64,
    /// Useful work captured during the last update, per second.
    pub work_rate: f64,
    pub energy_charge: f64,
}

impl Default for Cell {
    fn default() -> Self {
        Self::new(CellParameters::default())
    }
}

impl Cell {
    pub fn new(parameters: CellParameters) -> Self {
        Self {
            parameters,
            is_alive: true,
            death_cause: None,
            temperature: parameters.ambient_temperature,
            energy_pool: 0.0,
            total_heat: 0.0,
            total_useful_work: 0.0,
            heat_rate: 0.0,
            work_rate: 0.0,
            energy_charge: 0.0,
        }
    }

    /// Folds the current reaction energetics into the aggregate state.
    pub fn update<'a>(
        &mut self,
        reactions: impl IntoIterator<Item = &'a Reaction>,
        concentrations: &Concentrations,
        delta_time: f64,
    ) {
        let (heat_rate, work_rate) = reactions.into_iter().fold((0.0, 0.0), |(h, w), r| {
            (h + r.state.heat_generated, w + r.state.useful_work)
        });
        self.heat_rate = heat_rate;
        self.work_rate = work_rate;
        self.energy_charge = energy_charge(concentrations);

        if !self.is_alive {
            return;
        }

        let p = &self.parameters;
        let heating = heat_rate * delta_time / p.heat_capacity.max(1e-9);
        let cooling = p.cooling_rate * (self.temperature - p.ambient_temperature) * delta_time;
        self.temperature += heating - cooling;

        self.total_heat += heat_rate * delta_time;
        self.total_useful_work += work_rate * delta_time;
        self.energy_pool =
            (self.energy_pool + (work_rate - p.maintenance_cost) * delta_time).max(0.0);

        if self.temperature > p.max_temperature {
            let cause = format!(
                "Overheated: {:.1} K exceeds the lethal limit of {:.1} K",
                self.temperature, p.max_temperature
            );
            warn!(temperature = self.temperature, "{}", cause);
            self.kill(cause);
        }
    }

    pub fn kill(&mut self, cause: String) {
        self.is_alive = false;
        self.death_cause = Some(cause);
    }

    /// Returns the cell to its initial living state, keeping its parameters.
    pub fn revive(&mut self) {
        *self = Cell::new(self.parameters);
    }
}

/// Adenylate energy charge `(ATP + 0.5 ADP) / (ATP + ADP + AMP)`.
pub fn energy_charge(concentrations: &Concentrations) -> f64 {
    let level = |name: &str| concentrations.get(name).copied().unwrap_or(0.0).max(0.0);
    let (atp, adp, amp) = (level("ATP"), level("ADP"), level("AMP"));
    (atp + 0.5 * adp) / (atp + adp + amp).max(MIN_ADENYLATE_POOL)
}
