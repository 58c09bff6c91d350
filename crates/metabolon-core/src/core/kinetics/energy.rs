use std::ops::{Add, AddAssign};

/// Rates below this magnitude release no energy.
pub const NEGLIGIBLE_RATE: f64 = 1e-12;

/// Split of the free energy released by a reaction into captured work and heat.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EnergyPartition {
    pub useful_work: f64,
    pub heat: f64,
}

impl EnergyPartition {
    pub fn new(useful_work: f64, heat: f64) -> Self {
        Self { useful_work, heat }
    }

    /// `total = |ΔG|·|net|`, `work = total·efficiency`, `heat = total·(1 - efficiency)`.
    pub fn from_flux(delta_g_actual: f64, net_rate: f64, efficiency: f64) -> Self {
        if net_rate.abs() < NEGLIGIBLE_RATE {
            return Self::default();
        }
        let efficiency = efficiency.clamp(0.0, 1.0);
        let total = delta_g_actual.abs() * net_rate.abs();
        Self {
            useful_work: total * efficiency,
            heat: total * (1.0 - efficiency),
        }
    }

    #[inline]
    pub fn total(&self) -> f64 {
        self.useful_work + self.heat
    }

    /// Share of the total captured as work, or `None` when nothing flows.
    pub fn work_fraction(&self) -> Option<f64> {
        let total = self.total();
        (total > NEGLIGIBLE_RATE).then(|| self.useful_work / total)
    }
}

impl Add for EnergyPartition {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            useful_work: self.useful_work + rhs.useful_work,
            heat: self.heat + rhs.heat,
        }
    }
}

impl AddAssign for EnergyPartition {
    fn add_assign(&mut self, rhs: Self) {
        self.useful_work += rhs.useful_work;
        self.heat += rhs.heat;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-9;

    #[test]
    fn partition_splits_by_efficiency() {
        let p = EnergyPartition::from_flux(-20.0, 0.5, 0.4);
        assert!((p.total() - 10.0).abs() < TOLERANCE);
        assert!((p.useful_work - 4.0).abs() < TOLERANCE);
        assert!((p.heat - 6.0).abs() < TOLERANCE);
    }

    #[test]
    fn partition_uses_magnitude_of_reverse_flux() {
        let p = EnergyPartition::from_flux(5.0, -2.0, 0.5);
        assert!((p.total() - 10.0).abs() < TOLERANCE);
    }

    #[test]
    fn negligible_flux_releases_nothing() {
        let p = EnergyPartition::from_flux(-30.0, 1e-13, 0.5);
        assert_eq!(p, EnergyPartition::default());
        assert!(p.work_fraction().is_none());
    }

    #[test]
    fn add_assign_accumulates_each_field() {
        let mut a = EnergyPartition::new(1.0, 2.0);
        a += EnergyPartition::new(3.0, 4.0);
        assert_eq!(a, EnergyPartition::new(4.0, 6.0));
        assert_eq!(a + EnergyPartition::default(), a);
    }
}
