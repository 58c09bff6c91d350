//! Utility functions for the engine module.
//!
//! Centralizes every random draw made by the mutation and evolution systems so that a
//! single seeded generator makes their outcomes reproducible.

pub mod sampling;
