// src/core/materializer.rs

//! # Command Materializer
//!
//! Turns one command template plus the invocation context into a shell-ready line and
//! binds it to the host shell as a [`ProcessSpec`].
//!
//! Per template, in order:
//! 1. positional arguments containing whitespace are quoted (once per invocation);
//! 2. flags are substituted into `<flag>` placeholders or appended;
//! 3. positional arguments are appended;
//! 4. `{{var}}` placeholders are substituted;
//! 5. in print mode the final line is echoed.

use crate::{
    constants::{PRINT_FLAG, VARIABLE_OVERRIDE_MARKER},
    core::{commons::wrap_value, interpolator, paths},
    models::{AliasEntry, EnvironmentOverlay, FlagMap, ProcessSpec, VariableTable},
    system::shell::{self, ShellError},
};
use colored::Colorize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use thiserror::Error;

/// A template that cannot become a process.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MaterializeError {
    /// The assembled line is blank.
    #[error("alias not found")]
    EmptyCommand,
    /// No host shell is known for this platform.
    #[error(transparent)]
    UnsupportedPlatform(#[from] ShellError),
}

/// Everything a single invocation contributes to its command lines.
/// Built once, before any child is spawned, and shared by every command of the alias.
#[derive(Debug, Clone, Default)]
pub struct InvocationContext {
    /// Positional arguments, already quoted.
    pub positional: Vec<String>,
    /// Foreign flags, in command-line order.
    pub flags: FlagMap,
    /// The variable table with `V_` overrides applied, or `None` if `vars` failed to load.
    pub variables: Option<VariableTable>,
    /// Echo each final line before running it.
    pub print: bool,
}

impl InvocationContext {
    /// Quotes `positional` and derives the variable table from `V_` flags.
    pub fn new(
        positional: &[String],
        flags: FlagMap,
        variables: Option<&VariableTable>,
        print: bool,
    ) -> Self {
        let positional = positional.iter().map(|arg| quote_argument(arg)).collect();
        let variables = variables.map(|base| derive_variables(base, &flags));
        Self {
            positional,
            flags,
            variables,
            print,
        }
    }
}

/// Quotes an argument that contains whitespace so it stays one shell token.
pub fn quote_argument(arg: &str) -> String {
    if arg.chars().any(char::is_whitespace) {
        log::debug!("Argument contains whitespace, quoting it: {}", arg);
        wrap_value(arg)
    } else {
        arg.to_string()
    }
}

/// Returns a copy of `base` with every `V_` flag applied as a variable override.
///
/// `--V_name=value` sets `name`: the first `V_` is removed, then leading dashes.
pub fn derive_variables(base: &VariableTable, flags: &FlagMap) -> VariableTable {
    let mut derived = base.clone();
    for (key, value) in flags.iter() {
        if let Some(name) = override_name(key) {
            log::debug!("Flag '{}' overrides variable '{}'.", key, name);
            derived.insert(&name, value);
        }
    }
    derived
}

fn override_name(key: &str) -> Option<String> {
    if !key.contains(VARIABLE_OVERRIDE_MARKER) {
        return None;
    }
    let name = key
        .replacen(VARIABLE_OVERRIDE_MARKER, "", 1)
        .trim_start_matches('-')
        .to_string();
    Some(name)
}

/// Substitutes flags into `command`.
///
/// - the `print` flag is skipped;
/// - `V_` flags are skipped (they are variable overrides);
/// - `--some-key=value` replaces every `<somekey>` placeholder, or is appended verbatim
///   when the template has no such placeholder.
pub fn apply_flags(command: &str, flags: &FlagMap) -> String {
    let mut command = command.to_string();
    for (key, value) in flags.iter() {
        if key.trim_start_matches('-') == PRINT_FLAG {
            continue;
        }
        if key.contains(VARIABLE_OVERRIDE_MARKER) {
            continue;
        }

        let placeholder = format!("<{}>", key.replace('-', ""));
        if command.contains(&placeholder) {
            log::trace!("Substituting {} with '{}'", placeholder, value);
            command = command.replace(&placeholder, value);
        } else if value.is_empty() {
            command.push(' ');
            command.push_str(key);
        } else {
            command.push_str(&format!(" {}={}", key, value));
        }
    }
    command
}

/// Materializes templates of one alias (or one parallel group job).
#[derive(Debug)]
pub struct Materializer<'a> {
    context: &'a InvocationContext,
    environment: EnvironmentOverlay,
    working_dir: Option<PathBuf>,
}

impl<'a> Materializer<'a> {
    /// A materializer with an explicit environment and working directory.
    pub fn new(
        context: &'a InvocationContext,
        environment: EnvironmentOverlay,
        working_dir: Option<PathBuf>,
    ) -> Self {
        Self {
            context,
            environment,
            working_dir,
        }
    }

    /// A materializer bound to an alias: its directory and its environment merged over
    /// the global one.
    pub fn for_alias(
        context: &'a InvocationContext,
        entry: &AliasEntry,
        global_env: &BTreeMap<String, String>,
    ) -> Self {
        Self::new(
            context,
            EnvironmentOverlay::merged(global_env, &entry.environment),
            paths::resolve_working_dir(entry.working_directory.as_deref()),
        )
    }

    /// Assembles the final command line for `template` (steps 2 to 4).
    pub fn render_line(&self, template: &str) -> Result<String, MaterializeError> {
        let command = apply_flags(template, &self.context.flags);

        let assembled = if self.context.positional.is_empty() {
            command
        } else {
            format!("{} {}", command, self.context.positional.join(" "))
        };
        log::debug!("Assembled command line: {}", assembled);

        if assembled.trim().is_empty() {
            log::debug!("Command line is empty after assembly.");
            return Err(MaterializeError::EmptyCommand);
        }

        let line = match &self.context.variables {
            Some(variables) => interpolator::substitute(&assembled, variables).into_owned(),
            None => assembled,
        };
        log::debug!("Result command to execute: {}", line);
        Ok(line)
    }

    /// Renders `template` and binds it to the host shell.
    pub fn materialize(&self, template: &str) -> Result<ProcessSpec, MaterializeError> {
        let line = self.render_line(template)?;
        if self.context.print {
            println!("{}", print_echo(&line));
        }
        Ok(shell::bind(
            line,
            self.working_dir.clone(),
            self.environment.injected(),
        )?)
    }
}

/// The line shown for `--print`: `command: <line>`.
fn print_echo(line: &str) -> String {
    format!("{} {}", "command:".blue(), line)
}

// MARK: --- UNIT TESTS ---

#[cfg(test)]
mod tests {
    use super::*;

    fn flags(pairs: &[(&str, &str)]) -> FlagMap {
        pairs.iter().map(|(k, v)| (*k, *v)).collect()
    }

    fn render(template: &str, args: &[&str], flag_pairs: &[(&str, &str)]) -> String {
        let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        let context = InvocationContext::new(&args, flags(flag_pairs), None, false);
        Materializer::new(&context, EnvironmentOverlay::default(), None)
            .render_line(template)
            .unwrap()
    }

    // --- Flag substitution ---

    #[test]
    fn test_print_echo_shows_the_final_line() {
        let echoed = print_echo("echo hello world");
        assert!(echoed.contains("command:"));
        assert!(echoed.ends_with(" echo hello world"));
        assert!(!echoed.contains('→'));
    }

    #[test]
    fn test_flag_fills_placeholder() {
        assert_eq!(render("deploy <env>", &[], &[("--env", "prod")]), "deploy prod");
    }

    #[test]
    fn test_unmatched_flag_is_appended() {
        assert_eq!(
            render("deploy <env>", &[], &[("--verbose", "")]),
            "deploy <env> --verbose"
        );
        assert_eq!(render("ls", &[], &[("--color", "auto")]), "ls --color=auto");
    }

    #[test]
    fn test_matched_and_unmatched_flags_together() {
        assert_eq!(
            render("deploy <env>", &[], &[("--env", "prod"), ("--verbose", "")]),
            "deploy prod --verbose"
        );
    }

    #[test]
    fn test_every_placeholder_occurrence_is_replaced() {
        assert_eq!(
            render("echo <user> && id <user>", &[], &[("-user", "bob")]),
            "echo bob && id bob"
        );
    }

    #[test]
    fn test_placeholder_drops_all_dashes_of_the_key() {
        assert_eq!(render("make <dryrun>", &[], &[("--dry-run", "yes")]), "make yes");
    }

    #[test]
    fn test_print_flag_is_never_forwarded() {
        assert_eq!(render("echo <print>", &[], &[("--print", "")]), "echo <print>");
        assert_eq!(render("ls", &[], &[("-print", "x")]), "ls");
    }

    #[test]
    fn test_override_flag_does_not_touch_command() {
        assert_eq!(render("echo <V_name>", &[], &[("--V_name", "x")]), "echo <V_name>");
    }

    // --- Positional arguments ---

    #[test]
    fn test_spaced_argument_is_quoted() {
        assert_eq!(
            render("echo", &["hello world", "plain"], &[]),
            "echo \"hello world\" plain"
        );
    }

    #[test]
    fn test_no_trailing_space_without_arguments() {
        assert_eq!(render("git status", &[], &[]), "git status");
    }

    #[test]
    fn test_positionals_follow_appended_flags() {
        assert_eq!(render("git log", &["main"], &[("-n", "5")]), "git log -n=5 main");
    }

    #[test]
    fn test_empty_line_is_alias_not_found() {
        let context = InvocationContext::default();
        let materializer = Materializer::new(&context, EnvironmentOverlay::default(), None);
        assert_eq!(
            materializer.render_line("   "),
            Err(MaterializeError::EmptyCommand)
        );
        assert_eq!(MaterializeError::EmptyCommand.to_string(), "alias not found");
    }

    #[test]
    fn test_argument_alone_is_a_valid_line() {
        assert_eq!(render("", &["ls"], &[]), " ls");
    }

    // --- Variables ---

    #[test]
    fn test_variables_are_substituted_after_assembly() {
        let base: VariableTable = [("name", "world"), ("who", "me")].into_iter().collect();
        let args = vec!["{{who}}".to_string()];
        let context = InvocationContext::new(&args, FlagMap::new(), Some(&base), false);
        let line = Materializer::new(&context, EnvironmentOverlay::default(), None)
            .render_line("echo hello {{name}}")
            .unwrap();
        assert_eq!(line, "echo hello world me");
    }

    #[test]
    fn test_override_flag_derives_a_new_table() {
        let base: VariableTable = [("name", "world")].into_iter().collect();
        let context = InvocationContext::new(
            &[],
            flags(&[("--V_NAME", "rust")]),
            Some(&base),
            false,
        );
        let line = Materializer::new(&context, EnvironmentOverlay::default(), None)
            .render_line("echo hello {{name}}")
            .unwrap();
        assert_eq!(line, "echo hello rust");
        // The loaded table is untouched.
        assert_eq!(base.get("name"), Some("world"));
    }

    #[test]
    fn test_missing_table_skips_substitution() {
        assert_eq!(render("echo {{name}}", &[], &[]), "echo {{name}}");
    }

    // --- Shell binding ---

    #[cfg(unix)]
    #[test]
    fn test_materialize_binds_dir_and_upper_cased_env() {
        let entry = AliasEntry {
            name: "srv".to_string(),
            commands: vec!["serve".to_string()],
            environment: BTreeMap::from([("port".to_string(), "9000".to_string())]),
            working_directory: Some("/tmp".to_string()),
            ..AliasEntry::default()
        };
        let global = BTreeMap::from([
            ("port".to_string(), "8000".to_string()),
            ("host".to_string(), "localhost".to_string()),
        ]);
        let context = InvocationContext::default();
        let spec = Materializer::for_alias(&context, &entry, &global)
            .materialize("serve")
            .unwrap();

        assert_eq!(spec.program, "sh");
        assert_eq!(spec.args, vec!["-c".to_string(), "serve".to_string()]);
        assert_eq!(spec.working_dir, Some(PathBuf::from("/tmp")));
        assert_eq!(spec.env.get("PORT").map(String::as_str), Some("9000"));
        assert_eq!(spec.env.get("HOST").map(String::as_str), Some("localhost"));
    }

    #[test]
    fn test_dot_directory_inherits() {
        let entry = AliasEntry {
            working_directory: Some(".".to_string()),
            ..AliasEntry::default()
        };
        let context = InvocationContext::default();
        let spec = Materializer::for_alias(&context, &entry, &BTreeMap::new())
            .materialize("true")
            .unwrap();
        assert_eq!(spec.working_dir, None);
    }

    #[test]
    fn test_end_to_end_greet_line() {
        let vars: VariableTable = [("name", "world")].into_iter().collect();
        let context = InvocationContext::new(&[], FlagMap::new(), Some(&vars), false);
        let entry = AliasEntry {
            name: "greet".to_string(),
            commands: vec!["echo hello {{name}}".to_string()],
            ..AliasEntry::default()
        };
        let spec = Materializer::for_alias(&context, &entry, &BTreeMap::new())
            .materialize("echo hello {{name}}")
            .unwrap();
        assert_eq!(spec.line, "echo hello world");
    }
}
