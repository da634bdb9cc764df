// src/exec/mod.rs

//! Verifier abstraction and task execution.
//!
//! - [`verifier`] defines the `Verifier` seam the scheduler depends on.
//! - [`process`] is the production implementation (external tool processes).
//! - [`executor`] wraps one invocation with timeout enforcement and outcome
//!   classification.

pub mod executor;
pub mod process;
pub mod verifier;

pub use executor::{run_check, ScheduledCheck, TIMEOUT_GRACE};
pub use process::ProcessVerifier;
pub use verifier::{Verifier, VerifierReport};
