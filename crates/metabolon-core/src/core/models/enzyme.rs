use super::Concentrations;
use super::reaction::Reaction;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::f64::consts::LN_2;

pub const DEFAULT_HALF_LIFE: f64 = 300.0;

const MIN_MODULATION: f64 = 0.1;
const MAX_MODULATION: f64 = 1.5;

/// An allosteric effector acting on an enzyme's catalytic capacity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Modulator {
    pub molecule_name: String,
    /// Ki for inhibitors, Ka for activators (mM).
    pub constant: f64,
    /// Maximum additional activity for activators. Ignored for inhibitors.
    pub strength: f64,
}

impl Modulator {
    pub fn new(molecule_name: &str, constant: f64, strength: f64) -> Self {
        Self {
            molecule_name: molecule_name.to_string(),
            constant,
            strength,
        }
    }
}

/// Outcome of checking that an enzyme's reactions do not overlap on any molecule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    pub valid: bool,
    pub reason: String,
    pub suggestion: String,
}

impl ValidationResult {
    pub fn ok() -> Self {
        Self {
            valid: true,
            reason: String::new(),
            suggestion: String::new(),
        }
    }

    pub fn rejected(reason: String, suggestion: String) -> Self {
        Self {
            valid: false,
            reason,
            suggestion,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enzyme {
    pub id: String,
    pub name: String,
    pub concentration: f64,
    pub initial_concentration: f64,
    pub is_locked: bool,
    pub is_degradable: bool,
    /// Seconds. Only meaningful when `is_degradable` is set.
    pub half_life: f64,
    pub reactions: Vec<Reaction>,
    #[serde(default)]
    pub inhibitors: Vec<Modulator>,
    #[serde(default)]
    pub activators: Vec<Modulator>,
}

impl Enzyme {
    pub fn new(id: &str, name: &str, concentration: f64) -> Self {
        let concentration = concentration.max(0.0);
        Self {
            id: id.to_string(),
            name: name.to_string(),
            concentration,
            initial_concentration: concentration,
            is_locked: false,
            is_degradable: false,
            half_life: DEFAULT_HALF_LIFE,
            reactions: Vec::new(),
            inhibitors: Vec::new(),
            activators: Vec::new(),
        }
    }

    pub fn with_half_life(mut self, half_life: f64) -> Self {
        self.is_degradable = true;
        self.half_life = half_life;
        self
    }

    pub fn with_locked(mut self, locked: bool) -> Self {
        self.is_locked = locked;
        self
    }

    /// Appends a reaction without validation. Use [`Enzyme::try_add_reaction`] to
    /// respect the molecule-disjointness rule.
    pub fn with_reaction(mut self, reaction: Reaction) -> Self {
        self.reactions.push(reaction);
        self
    }

    pub fn with_inhibitor(mut self, modulator: Modulator) -> Self {
        self.inhibitors.push(modulator);
        self
    }

    pub fn with_activator(mut self, modulator: Modulator) -> Self {
        self.activators.push(modulator);
        self
    }

    /// First-order degradation constant in 1/s, `ln 2 / half_life`.
    pub fn degradation_rate(&self) -> f64 {
        if !self.is_degradable {
            return 0.0;
        }
        LN_2 / self.half_life.max(f64::EPSILON)
    }

    pub fn set_concentration(&mut self, value: f64) {
        self.concentration = value.max(0.0);
    }

    pub fn reset(&mut self) {
        self.concentration = self.initial_concentration;
    }

    pub fn is_source(&self) -> bool {
        self.reactions.iter().any(Reaction::is_source)
    }

    pub fn is_sink(&self) -> bool {
        self.reactions.iter().any(Reaction::is_sink)
    }

    pub fn molecules(&self) -> BTreeSet<&str> {
        self.reactions.iter().flat_map(Reaction::molecules).collect()
    }

    pub fn shares_molecule_with(&self, other: &Enzyme) -> bool {
        let mine = self.molecules();
        other.molecules().iter().any(|m| mine.contains(m))
    }

    /// Combined allosteric factor applied to the enzyme concentration.
    ///
    /// Inhibitor and activator factors are multiplied together and the product is
    /// clamped to `[0.1, 1.5]`. An enzyme without modulators has a factor of exactly 1.
    pub fn modulation_factor(&self, concentrations: &Concentrations) -> f64 {
        if self.inhibitors.is_empty() && self.activators.is_empty() {
            return 1.0;
        }
        let level = |name: &str| concentrations.get(name).copied().unwrap_or(0.0).max(0.0);

        let inhibition: f64 = self
            .inhibitors
            .iter()
            .map(|m| 1.0 / (1.0 + level(&m.molecule_name) / m.constant.max(1e-9)))
            .product();
        let activation: f64 = self
            .activators
            .iter()
            .map(|m| {
                let a = level(&m.molecule_name);
                1.0 + m.strength * a / (m.constant.max(1e-9) + a)
            })
            .product();

        (inhibition * activation).clamp(MIN_MODULATION, MAX_MODULATION)
    }

    /// Checks whether `reaction` could join this enzyme without sharing a molecule
    /// with any reaction it already owns.
    pub fn validate_reaction(&self, reaction: &Reaction) -> ValidationResult {
        self.check_disjoint(&self.reactions, reaction)
    }

    /// Validates every pair of owned reactions.
    pub fn validate(&self) -> ValidationResult {
        for (i, reaction) in self.reactions.iter().enumerate() {
            let result = self.check_disjoint(&self.reactions[..i], reaction);
            if !result.valid {
                return result;
            }
        }
        ValidationResult::ok()
    }

    /// Adds the reaction only when it passes validation. The result is returned either way.
    pub fn try_add_reaction(&mut self, reaction: Reaction) -> ValidationResult {
        let result = self.validate_reaction(&reaction);
        if result.valid {
            self.reactions.push(reaction);
        }
        result
    }

    fn check_disjoint(&self, existing: &[Reaction], reaction: &Reaction) -> ValidationResult {
        for other in existing {
            let shared: Vec<&str> = reaction.molecules().filter(|m| other.involves(m)).collect();
            if !shared.is_empty() {
                return ValidationResult::rejected(
                    format!(
                        "Reaction '{}' shares molecule(s) {} with reaction '{}' of enzyme '{}'",
                        reaction.id,
                        shared.join(", "),
                        other.id,
                        self.id
                    ),
                    format!(
                        "Split '{}' into a separate enzyme, or merge it with '{}' into a single reaction",
                        reaction.id, other.id
                    ),
                );
            }
        }
        ValidationResult::ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-9;

    fn conversion(id: &str, s: &str, p: &str) -> Reaction {
        Reaction::new(id, id).with_substrate(s, 1.0).with_product(p, 1.0)
    }

    #[test]
    fn degradation_rate_follows_half_life() {
        let e = Enzyme::new("e1", "E1", 1.0).with_half_life(100.0);
        assert!((e.degradation_rate() - LN_2 / 100.0).abs() < TOLERANCE);
    }

    #[test]
    fn non_degradable_enzyme_has_zero_degradation_rate() {
        let e = Enzyme::new("e1", "E1", 1.0);
        assert_eq!(e.degradation_rate(), 0.0);
    }

    #[test]
    fn disjoint_reactions_are_accepted() {
        let mut e = Enzyme::new("e1", "E1", 1.0);
        assert!(e.try_add_reaction(conversion("r1", "A", "B")).valid);
        assert!(e.try_add_reaction(conversion("r2", "C", "D")).valid);
        assert_eq!(e.reactions.len(), 2);
        assert!(e.validate().valid);
    }

    #[test]
    fn overlapping_reaction_is_rejected_with_reason_and_suggestion() {
        let mut e = Enzyme::new("e1", "E1", 1.0);
        e.try_add_reaction(conversion("r1", "A", "B"));
        let result = e.try_add_reaction(conversion("r2", "B", "C"));
        assert!(!result.valid);
        assert!(result.reason.contains("B"));
        assert!(result.suggestion.contains("r2"));
        assert_eq!(e.reactions.len(), 1);
    }

    #[test]
    fn validate_detects_overlap_added_without_checks() {
        let e = Enzyme::new("e1", "E1", 1.0)
            .with_reaction(conversion("r1", "A", "B"))
            .with_reaction(conversion("r2", "C", "A"));
        assert!(!e.validate().valid);
    }

    #[test]
    fn enzyme_without_modulators_has_unit_factor() {
        let e = Enzyme::new("e1", "E1", 1.0);
        assert_eq!(e.modulation_factor(&Concentrations::new()), 1.0);
    }

    #[test]
    fn inhibitor_reduces_modulation_factor() {
        let e = Enzyme::new("e1", "E1", 1.0).with_inhibitor(Modulator::new("I", 1.0, 0.0));
        let mut conc = Concentrations::new();
        conc.insert("I".to_string(), 1.0);
        assert!((e.modulation_factor(&conc) - 0.5).abs() < TOLERANCE);
    }

    #[test]
    fn modulation_factor_is_clamped() {
        let e = Enzyme::new("e1", "E1", 1.0)
            .with_activator(Modulator::new("A", 0.1, 5.0))
            .with_inhibitor(Modulator::new("I", 0.001, 0.0));
        let mut conc = Concentrations::new();
        conc.insert("A".to_string(), 100.0);
        assert!((e.modulation_factor(&conc) - MAX_MODULATION).abs() < TOLERANCE);
        conc.insert("I".to_string(), 100.0);
        assert!((e.modulation_factor(&conc) - MIN_MODULATION).abs() < TOLERANCE);
    }

    #[test]
    fn shares_molecule_detects_common_participants() {
        let a = Enzyme::new("a", "A", 1.0).with_reaction(conversion("r1", "X", "Y"));
        let b = Enzyme::new("b", "B", 1.0).with_reaction(conversion("r2", "Y", "Z"));
        let c = Enzyme::new("c", "C", 1.0).with_reaction(conversion("r3", "P", "Q"));
        assert!(a.shares_molecule_with(&b));
        assert!(!a.shares_molecule_with(&c));
    }
}
