//! Small helpers shared by the models and the engine.
//!
//! - [`structural`] - Similarity and derivation of molecule structural codes
//! - [`archetypes`] - Static table of common metabolites used to seed generated pathways

pub mod archetypes;
pub mod structural;
