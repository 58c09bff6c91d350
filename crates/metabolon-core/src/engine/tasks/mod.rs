//! Per-tick calculation tasks.
//!
//! Each task reads the tick's [`Snapshot`](crate::engine::snapshot::Snapshot) and returns
//! a plain delta record without touching shared state. The simulator applies the deltas
//! afterwards, in a fixed order. A task whose category is locked still evaluates the
//! rates it reports for display, but returns no deltas.

pub mod degradation;
pub mod gene_synthesis;
pub mod reaction_flux;
