// src/core/mod.rs

/// Splits the command line into global options and the alias invocation.
pub mod arg_parser;
/// Color names and output labels.
pub mod color;
/// Small helpers shared across the core.
pub mod commons;
pub mod config_loader;
/// `{{var}}` substitution.
pub mod interpolator;
/// File logger setup.
pub mod logger;
pub mod materializer;
/// Home, config and working directory resolution.
pub mod paths;
pub mod registry;
/// Runs aliases and parallel groups.
pub mod task_executor;
