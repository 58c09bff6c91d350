//! # Metabolon Core Library
//!
//! A deterministic, seedable simulation engine for biochemical networks: metabolites
//! converted by enzymes under Michaelis-Menten kinetics and thermodynamic constraints,
//! enzymes synthesized from regulated genes, and a population of enzymes that mutates
//! and is subject to fitness-based selection.
//!
//! ## Architectural Philosophy
//!
//! The library follows a three-layer architecture.
//!
//! - **[`core`]: The Foundation.** Passive entity records (`Molecule`, `Reaction`,
//!   `Enzyme`, `Gene`, `Cell`) and the pure calculators that read them: reaction rates,
//!   free energy, energy partitioning and gene expression.
//!
//! - **[`engine`]: The Logic Core.** The stateful `Simulator` and the systems it
//!   orchestrates. Every step captures an immutable snapshot, lets the calculators and
//!   the mutation and evolution systems propose changes against it, then applies those
//!   proposals in a fixed order while honoring category locks.
//!
//! - **[`workflows`]: The Public API.** Procedures built on the engine, such as
//!   generating a random pathway and running a simulation headless with progress
//!   reporting.

pub mod core;
pub mod engine;
pub mod workflows;
