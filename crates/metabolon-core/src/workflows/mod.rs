//! # Workflows Module
//!
//! High-level entry points that combine the engine with network construction.
//!
//! - **Pathway Generation** ([`pathway`]) - Builds a random but consistent network of
//!   molecules, enzymes and genes from a [`pathway::GenerationConfig`]
//! - **Headless Run** ([`run`]) - Advances a simulator for a fixed duration, reporting
//!   progress and summarizing what happened

pub mod pathway;
pub mod run;
