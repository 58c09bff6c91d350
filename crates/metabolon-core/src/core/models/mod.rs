//! # Core Models Module
//!
//! Passive records describing a biochemical network: molecules, the enzymes that
//! catalyze reactions between them, the genes that control enzyme synthesis, and the
//! aggregate state of the cell hosting them.
//!
//! ## Key Components
//!
//! - [`molecule`] - Metabolites keyed by name, with concentration and structural code
//! - [`reaction`] - Stoichiometric reactions with kinetic and thermodynamic parameters
//! - [`enzyme`] - Catalysts owning their reactions, plus construction-time validation
//! - [`gene`] - Expression control through activator and repressor binding
//! - [`cell`] - Thermal balance, energy pool and viability of the compartment
//! - [`network`] - A bundle of entities used to seed a simulation
//!
//! These types carry no behavior that depends on other components. Calculators in
//! [`crate::core::kinetics`] and [`crate::core::regulation`] read them; only the
//! simulator in [`crate::engine`] mutates them.

use std::collections::BTreeMap;

pub mod cell;
pub mod enzyme;
pub mod gene;
pub mod molecule;
pub mod network;
pub mod reaction;

/// Molecule concentrations (mM) keyed by molecule name.
pub type Concentrations = BTreeMap<String, f64>;
