//! `ali`: a command-line alias runner.
//!
//! Aliases are declared in a layered configuration and resolved at invocation time
//! into shell command lines, which are then executed sequentially or in parallel.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;

/// Shared interrupt flag. Tripped by the signal listener, observed by the execution engine.
pub type CancellationToken = Arc<AtomicBool>;

/// Command-line surface: argument parsing and dispatch to handlers.
pub mod cli;
/// Shared names and defaults.
pub mod constants;
/// Configuration, alias resolution and command materialization.
pub mod core;
/// Configuration and runtime data types.
pub mod models;
pub mod system;
