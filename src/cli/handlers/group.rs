use crate::{
    CancellationToken,
    cli::{dispatcher::DispatchError, handlers::commons},
    core::{arg_parser::GlobalOptions, config_loader::ConfigSnapshot, task_executor},
};
use anyhow::Result;
use colored::*;

/// Entry point for `-p/--parallel <group>`.
pub async fn handle(
    snapshot: &ConfigSnapshot,
    group_name: &str,
    options: &GlobalOptions,
    cancellation_token: &CancellationToken,
) -> Result<()> {
    let commands = snapshot
        .parallel_group(group_name)?
        .ok_or_else(|| DispatchError::GroupNotFound(group_name.to_string()))?;

    if commands.is_empty() {
        println!(
            "{}",
            format!("Parallel group '{}' has no commands.", group_name).yellow()
        );
        return Ok(());
    }

    let variables = commons::load_variables(snapshot);
    task_executor::execute_group(
        group_name,
        &commands,
        variables.as_ref(),
        &commons::output_options(options),
        cancellation_token,
    )
    .await?;
    Ok(())
}
