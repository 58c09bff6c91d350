//! # Core Module
//!
//! Stateless building blocks of the simulation: the entity data model and the pure
//! calculators that read it.
//!
//! - **Entities** ([`models`]) - Molecules, reactions, enzymes, genes and the cell
//! - **Kinetics** ([`kinetics`]) - Michaelis-Menten rates under thermodynamic constraints
//! - **Regulation** ([`regulation`]) - Gene expression from regulator occupancy
//! - **Utilities** ([`utils`]) - Structural codes and metabolite archetypes
//!
//! Nothing in this module owns simulation state across ticks; that is the job of
//! [`crate::engine`].

pub mod kinetics;
pub mod models;
pub mod regulation;
pub mod utils;
