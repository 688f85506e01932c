// src/cli/handlers/mod.rs

/// Helpers shared by the handlers.
pub mod commons;
/// `-p/--parallel <group>`.
pub mod group;
/// `-l/--list`.
pub mod list;
/// Resolves and runs an alias.
pub mod run;
