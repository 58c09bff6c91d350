use phf::{Map, phf_map};

/// Standard potential energies (kJ/mol) of common metabolites used to name and seed
/// generated pathways.
pub static METABOLITE_ARCHETYPES: Map<&'static str, f64> = phf_map! {
    "glucose" => 2870.0,
    "glucose-6-phosphate" => 2860.0,
    "fructose-6-phosphate" => 2858.0,
    "fructose-1,6-bisphosphate" => 2845.0,
    "glyceraldehyde-3-phosphate" => 1430.0,
    "1,3-bisphosphoglycerate" => 1390.0,
    "3-phosphoglycerate" => 1370.0,
    "2-phosphoglycerate" => 1368.0,
    "phosphoenolpyruvate" => 1340.0,
    "pyruvate" => 1160.0,
    "acetyl-coa" => 870.0,
    "citrate" => 2000.0,
    "isocitrate" => 1995.0,
    "alpha-ketoglutarate" => 1800.0,
    "succinate" => 1490.0,
    "fumarate" => 1330.0,
    "malate" => 1320.0,
    "oxaloacetate" => 1250.0,
    "lactate" => 1360.0,
    "ethanol" => 1370.0,
};

/// Canonical ordering of the archetypes along a catabolic route.
pub const ARCHETYPE_ORDER: [&str; 20] = [
    "glucose",
    "glucose-6-phosphate",
    "fructose-6-phosphate",
    "fructose-1,6-bisphosphate",
    "glyceraldehyde-3-phosphate",
    "1,3-bisphosphoglycerate",
    "3-phosphoglycerate",
    "2-phosphoglycerate",
    "phosphoenolpyruvate",
    "pyruvate",
    "acetyl-coa",
    "citrate",
    "isocitrate",
    "alpha-ketoglutarate",
    "succinate",
    "fumarate",
    "malate",
    "oxaloacetate",
    "lactate",
    "ethanol",
];

const GENERIC_POTENTIAL_ENERGY: f64 = 500.0;

pub fn standard_potential_energy(name: &str) -> Option<f64> {
    METABOLITE_ARCHETYPES.get(name.trim()).copied()
}

/// Name for the `index`-th molecule of a generated pathway: an archetype while they
/// last, then `M{index}`.
pub fn molecule_name(index: usize) -> String {
    ARCHETYPE_ORDER
        .get(index)
        .map(|s| s.to_string())
        .unwrap_or_else(|| format!("M{}", index))
}

/// Potential energy for a generated molecule, falling back to a generic value that
/// decreases along the pathway.
pub fn potential_energy_for(name: &str, index: usize) -> f64 {
    standard_potential_energy(name)
        .unwrap_or_else(|| (GENERIC_POTENTIAL_ENERGY - 10.0 * index as f64).max(50.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_ordered_archetype_has_an_energy() {
        for name in ARCHETYPE_ORDER {
            assert!(standard_potential_energy(name).is_some(), "missing {}", name);
        }
        assert_eq!(ARCHETYPE_ORDER.len(), METABOLITE_ARCHETYPES.len());
    }

    #[test]
    fn molecule_names_fall_back_to_generic() {
        assert_eq!(molecule_name(0), "glucose");
        assert_eq!(molecule_name(25), "M25");
    }

    #[test]
    fn generic_energy_is_positive() {
        assert_eq!(potential_energy_for("glucose", 0), 2870.0);
        assert!(potential_energy_for("M100", 100) >= 50.0);
    }
}
