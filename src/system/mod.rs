//! # System Interaction Layer
//!
//! Boundary between the alias logic and the operating system.
//!
//! ## Modules
//!
//! - **`shell`**: binds a command line to the host shell (`sh -c` or `cmd /C`) and builds
//!   the tokio command for it.
//! - **`executor`**: runs children, one at a time attached to the terminal or all at once
//!   with labeled, line-buffered output.
//! - **`signals`**: the interrupt listener that trips the shared cancellation token.

/// Runs children sequentially or in parallel.
pub mod executor;
/// Host shell binding.
pub mod shell;
/// Interrupt listener.
pub mod signals;
