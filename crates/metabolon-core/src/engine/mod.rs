//! # Engine Module
//!
//! The stateful layer of the simulator. It owns a network of entities and advances it
//! in discrete steps, each split into a pure calculation phase over an immutable
//! [`snapshot::Snapshot`] and an apply phase that commits every proposed change in a
//! fixed order.
//!
//! ## Architecture
//!
//! - **Simulator** ([`simulator`]) - Owns the entities and drives the step loop
//! - **Configuration** ([`config`]) - Step size, history bounds, mutation and evolution rates
//! - **Locks** ([`locks`]) - Per-category switches that freeze parts of the step
//! - **Mutation** ([`mutation`]) - Random variation of enzymes and genes
//! - **Evolution** ([`evolution`]) - Fitness scoring, selection and lineage tracking
//! - **History** ([`history`]) - Bounded time series of concentrations
//! - **Observation** ([`data`]) - Serializable copy of the full simulator state
//! - **Progress Monitoring** ([`progress`]) - Callback-based reporting for long runs
//! - **Error Handling** ([`error`]) - Engine-specific error types
//!
//! Calculators never mutate the network. Only [`simulator::Simulator`] writes to it, so
//! every calculator within a step observes exactly the same state.

pub mod config;
pub mod data;
pub mod error;
pub mod evolution;
pub mod history;
pub mod locks;
pub mod mutation;
pub mod progress;
pub mod simulator;
pub mod snapshot;
pub(crate) mod tasks;
pub(crate) mod utils;
