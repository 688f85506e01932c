// src/constants.rs

/// The name of the per-user directory holding the global configuration and the log (`~/.ali`).
pub const ALI_DIR: &str = ".ali";

/// The file stem of the global configuration file inside `~/.ali`.
pub const GLOBAL_CONFIG_STEM: &str = "config";

/// Extensions tried, in order, when looking for the global configuration file.
pub const GLOBAL_CONFIG_EXTENSIONS: &[&str] = &["yaml", "yml", "toml", "json"];

/// The name of the local configuration file looked up in the current directory.
/// Also the file name used when an `include` entry points at a directory.
pub const LOCAL_CONFIG_FILENAME: &str = ".ali";

/// The name of the debug log file (inside `~/.ali`).
pub const LOG_FILENAME: &str = "ali.log";

/// Flag key (dashes stripped) that only controls local echo and is never forwarded.
pub const PRINT_FLAG: &str = "print";

/// Marker that redirects a CLI flag into the variable table.
pub const VARIABLE_OVERRIDE_MARKER: &str = "V_";

/// Description shown for aliases that do not define one.
pub const NO_DESCRIPTION: &str = "no desc";
