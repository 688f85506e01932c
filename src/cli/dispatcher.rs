use crate::{
    CancellationToken,
    cli::handlers::{self, list::ListView},
    core::{
        arg_parser::{GlobalOptions, Invocation},
        config_loader::{ConfigSnapshot, ConfigSources},
    },
};
use anyhow::Result;
use colored::*;
use thiserror::Error;

/// Routing failures reported to the user.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// No alias or synonym has this name.
    #[error("alias not found")]
    AliasNotFound(String),
    /// The `parallel` section has no such group.
    #[error("Parallel group '{0}' not found.")]
    GroupNotFound(String),
}

/// Routes an invocation to its handler.
///
/// - `-l/--list [search]` lists the aliases, or the variables and environment with
///   `--vars`/`--envs`;
/// - `-p/--parallel <group>` runs a group of the `parallel` section;
/// - otherwise the first positional token is resolved as an alias and run.
pub async fn dispatch(
    options: &GlobalOptions,
    invocation: Invocation,
    cancellation_token: &CancellationToken,
) -> Result<()> {
    log::debug!("Dispatching {:?} with {:?}", invocation, options);

    let sources = ConfigSources::standard(options.local_env);
    let snapshot = ConfigSnapshot::load(&sources)?;

    if options.list {
        let view = ListView::select(options, &invocation.flags);
        return handlers::list::handle(&snapshot, view, invocation.name.as_deref());
    }

    let Some(name) = invocation.name.clone() else {
        print_usage_hint();
        return Ok(());
    };

    if options.parallel {
        return handlers::group::handle(&snapshot, &name, options, cancellation_token).await;
    }
    handlers::run::handle(&snapshot, &name, invocation, options, cancellation_token).await
}

fn print_usage_hint() {
    println!(
        "{} {}",
        "Usage:".yellow().bold(),
        "ali [FLAGS] <alias> [ARGS]...".cyan()
    );
    println!(
        "Run {} to see the available aliases, or {} for every flag.",
        "ali --list".cyan(),
        "ali --help".cyan()
    );
}
