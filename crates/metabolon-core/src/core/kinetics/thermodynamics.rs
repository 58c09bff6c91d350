use crate::core::models::Concentrations;
use crate::core::models::reaction::Reaction;
use std::collections::BTreeMap;

pub const GAS_CONSTANT: f64 = 8.314e-3; // In kJ/(mol·K)

/// Concentration floor used inside the reaction quotient to keep `ln(Q)` finite.
pub const MIN_QUOTIENT_CONCENTRATION: f64 = 1e-9;

#[inline]
pub fn rt(temperature: f64) -> f64 {
    GAS_CONSTANT * temperature.max(1e-9)
}

/// `Keq = exp(-ΔG° / RT)`.
#[inline]
pub fn equilibrium_constant(delta_g0: f64, temperature: f64) -> f64 {
    (-delta_g0 / rt(temperature)).exp()
}

#[inline]
fn ln_activity(coefficients: &BTreeMap<String, f64>, concentrations: &Concentrations) -> f64 {
    coefficients
        .iter()
        .map(|(name, stoich)| {
            let c = concentrations
                .get(name)
                .copied()
                .unwrap_or(0.0)
                .max(MIN_QUOTIENT_CONCENTRATION);
            stoich * c.ln()
        })
        .sum()
}

/// `ln(Q)` with `Q = Π[product]^ν / Π[substrate]^ν`, computed as a sum of logarithms.
pub fn ln_reaction_quotient(reaction: &Reaction, concentrations: &Concentrations) -> f64 {
    ln_activity(&reaction.products, concentrations) - ln_activity(&reaction.substrates, concentrations)
}

pub fn reaction_quotient(reaction: &Reaction, concentrations: &Concentrations) -> f64 {
    ln_reaction_quotient(reaction, concentrations).exp()
}

/// `ΔG = ΔG° + RT·ln(Q)`. Sources and sinks report `ΔG°` unconditionally.
pub fn actual_delta_g(reaction: &Reaction, concentrations: &Concentrations) -> f64 {
    if reaction.is_source() || reaction.is_sink() {
        return reaction.delta_g;
    }
    reaction.delta_g + rt(reaction.temperature) * ln_reaction_quotient(reaction, concentrations)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-9;

    fn f64_approx_equal(a: f64, b: f64) -> bool {
        (a - b).abs() < TOLERANCE
    }

    fn conc(pairs: &[(&str, f64)]) -> Concentrations {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn equilibrium_constant_is_one_at_zero_free_energy() {
        assert!(f64_approx_equal(equilibrium_constant(0.0, 310.0), 1.0));
    }

    #[test]
    fn negative_free_energy_favors_products() {
        assert!(equilibrium_constant(-10.0, 310.0) > 1.0);
        assert!(equilibrium_constant(10.0, 310.0) < 1.0);
    }

    #[test]
    fn equilibrium_constant_matches_closed_form() {
        let expected = (-(-5.0) / (GAS_CONSTANT * 298.0)).exp();
        assert!(f64_approx_equal(equilibrium_constant(-5.0, 298.0), expected));
    }

    #[test]
    fn reaction_quotient_respects_stoichiometry() {
        let r = Reaction::new("r", "r")
            .with_substrate("A", 2.0)
            .with_product("B", 1.0);
        let q = reaction_quotient(&r, &conc(&[("A", 2.0), ("B", 8.0)]));
        assert!(f64_approx_equal(q, 2.0));
    }

    #[test]
    fn actual_delta_g_equals_standard_at_unit_quotient() {
        let r = Reaction::new("r", "r")
            .with_substrate("A", 1.0)
            .with_product("B", 1.0)
            .with_delta_g(-7.0);
        let dg = actual_delta_g(&r, &conc(&[("A", 3.0), ("B", 3.0)]));
        assert!(f64_approx_equal(dg, -7.0));
    }

    #[test]
    fn product_accumulation_raises_actual_delta_g() {
        let r = Reaction::new("r", "r")
            .with_substrate("A", 1.0)
            .with_product("B", 1.0)
            .with_delta_g(-7.0);
        let low = actual_delta_g(&r, &conc(&[("A", 1.0), ("B", 0.1)]));
        let high = actual_delta_g(&r, &conc(&[("A", 1.0), ("B", 10.0)]));
        assert!(high > low);
    }

    #[test]
    fn missing_molecules_stay_finite() {
        let r = Reaction::new("r", "r")
            .with_substrate("A", 1.0)
            .with_product("B", 1.0);
        let dg = actual_delta_g(&r, &Concentrations::new());
        assert!(dg.is_finite());
    }

    #[test]
    fn sources_and_sinks_report_standard_free_energy() {
        let source = Reaction::new("s", "s").with_product("A", 1.0).with_delta_g(-3.0);
        let sink = Reaction::new("k", "k").with_substrate("A", 1.0).with_delta_g(4.0);
        let c = conc(&[("A", 100.0)]);
        assert_eq!(actual_delta_g(&source, &c), -3.0);
        assert_eq!(actual_delta_g(&sink, &c), 4.0);
    }
}
