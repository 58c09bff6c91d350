//! # Kinetics Module
//!
//! Pure calculation of reaction rates and energetics from the current concentrations.
//!
//! - [`thermodynamics`] - Equilibrium constants, reaction quotients and actual ΔG
//! - [`rates`] - Michaelis-Menten forward/reverse rates gated by thermodynamics, with
//!   the reverse Vmax tied to the forward one through the Haldane relationship
//! - [`energy`] - Partition of the released free energy into useful work and heat
//!
//! Nothing here mutates shared state. [`rates::RateCalculator::update`] writes only the
//! runtime state of the reaction it is given.

pub mod energy;
pub mod rates;
pub mod thermodynamics;
