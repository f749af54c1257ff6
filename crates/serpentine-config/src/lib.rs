//! Shared runtime configuration for the Serpentine stack.
//!
//! Hosts the environment-driven determinism switches consumed by every RNG
//! user in the workspace, plus the tracing subscriber bootstrap.

pub mod determinism;
pub mod tracing;

pub use determinism::{config, configure, rng_from_label, rng_from_optional, DeterminismConfig};
