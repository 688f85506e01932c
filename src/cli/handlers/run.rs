use crate::{
    CancellationToken,
    cli::{dispatcher::DispatchError, handlers::commons},
    core::{
        arg_parser::{GlobalOptions, Invocation},
        config_loader::ConfigSnapshot,
        materializer::InvocationContext,
        registry::AliasRegistry,
        task_executor,
    },
};
use anyhow::Result;
use colored::*;

///
/// Entry point for running an alias.
/// Resolves `name` (primary names first, then synonyms) and runs its commands.
///
pub async fn handle(
    snapshot: &ConfigSnapshot,
    name: &str,
    invocation: Invocation,
    options: &GlobalOptions,
    cancellation_token: &CancellationToken,
) -> Result<()> {
    // 1. Build the registry for this invocation.
    let registry = AliasRegistry::load(snapshot.aliases())?;
    log::debug!("Loaded {} alias(es).", registry.len());

    // 2. Resolve the alias. Nothing is spawned when it is unknown.
    let entry = registry
        .resolve(name)
        .ok_or_else(|| DispatchError::AliasNotFound(name.to_string()))?;
    log::debug!("Resolved '{}' to alias '{}'.", name, entry.name);

    if entry.commands.is_empty() {
        println!("{}", "Alias has no commands. Nothing to execute.".yellow());
        return Ok(());
    }

    // 3. Everything the invocation contributes is computed once, before any spawn.
    let variables = commons::load_variables(snapshot);
    let global_env = snapshot.global_env()?;
    let context = InvocationContext::new(
        &invocation.positional,
        invocation.flags,
        variables.as_ref(),
        options.print,
    );

    // 4. Execute.
    task_executor::execute_alias(
        entry,
        &context,
        &global_env,
        &commons::output_options(options),
        cancellation_token,
    )
    .await?;

    Ok(())
}
