// src/core/task_executor.rs

use crate::{
    CancellationToken,
    core::{
        color, interpolator,
        materializer::{InvocationContext, MaterializeError, Materializer},
        paths,
    },
    models::{AliasEntry, ParallelCommand, VariableTable},
    system::{
        executor::{self, ExecutionError, OutputOptions, ParallelJob, ParallelReport},
        shell,
    },
};
use colored::*;
use std::collections::BTreeMap;

// --- Main Public Functions ---

/// Runs every command of an alias, as a sequence or as concurrent jobs.
pub async fn execute_alias(
    entry: &AliasEntry,
    context: &InvocationContext,
    global_env: &BTreeMap<String, String>,
    output: &OutputOptions,
    cancellation_token: &CancellationToken,
) -> Result<(), ExecutionError> {
    let materializer = Materializer::for_alias(context, entry, global_env);
    if entry.parallel {
        execute_parallel_alias(entry, &materializer, context.print, output, cancellation_token)
            .await
    } else {
        execute_sequence(entry, &materializer, cancellation_token).await
    }
}

/// Runs a group of the `parallel` section. The header with the configured commands is
/// always printed; `{{var}}` placeholders are substituted and `path` is the working dir.
pub async fn execute_group(
    group_name: &str,
    commands: &[ParallelCommand],
    variables: Option<&VariableTable>,
    output: &OutputOptions,
    cancellation_token: &CancellationToken,
) -> Result<(), ExecutionError> {
    print_configured_commands(
        commands
            .iter()
            .map(|c| (c.label.color(color::parse_color_name(&c.color)), c.command.as_str())),
    );

    let mut jobs = Vec::with_capacity(commands.len());
    let mut prep_failures = 0;
    for (index, command) in commands.iter().enumerate() {
        match prepare_group_job(group_name, index, command, variables) {
            Ok(job) => jobs.push(job),
            Err(e) => {
                prep_failures += 1;
                report_prep_failure(&command.command, &e);
            }
        }
    }

    let report = executor::run_parallel(jobs, output, cancellation_token).await?;
    finish_parallel(&report, prep_failures)
}

// --- Internal Executors ---

/// Materializes and runs each step in order, stopping at the first failure.
async fn execute_sequence(
    entry: &AliasEntry,
    materializer: &Materializer<'_>,
    cancellation_token: &CancellationToken,
) -> Result<(), ExecutionError> {
    let total = entry.commands.len();
    for (step, template) in entry.commands.iter().enumerate() {
        log::debug!("[{}] step {}/{}: {}", entry.name, step + 1, total, template);
        let spec = materializer.materialize(template)?;
        executor::execute_command(&spec, cancellation_token).await?;
    }
    Ok(())
}

/// Materializes every command first, then fans them out.
async fn execute_parallel_alias(
    entry: &AliasEntry,
    materializer: &Materializer<'_>,
    print: bool,
    output: &OutputOptions,
    cancellation_token: &CancellationToken,
) -> Result<(), ExecutionError> {
    if print {
        print_configured_commands(
            entry
                .commands
                .iter()
                .map(|cmd| (entry.name.blue(), cmd.as_str())),
        );
    }

    let mut jobs = Vec::with_capacity(entry.commands.len());
    let mut prep_failures = 0;
    for (index, template) in entry.commands.iter().enumerate() {
        match materializer.materialize(template) {
            Ok(spec) => jobs.push(ParallelJob {
                label: format!("{}:{}", entry.name, index + 1),
                color: color::palette_color(index),
                spec,
            }),
            Err(e) => {
                prep_failures += 1;
                report_prep_failure(template, &e);
            }
        }
    }

    let report = executor::run_parallel(jobs, output, cancellation_token).await?;
    finish_parallel(&report, prep_failures)
}

// --- Helpers ---

fn prepare_group_job(
    group_name: &str,
    index: usize,
    command: &ParallelCommand,
    variables: Option<&VariableTable>,
) -> Result<ParallelJob, MaterializeError> {
    let line = match variables {
        Some(table) => interpolator::substitute(&command.command, table).into_owned(),
        None => command.command.clone(),
    };
    if line.trim().is_empty() {
        return Err(MaterializeError::EmptyCommand);
    }

    let label = if command.label.is_empty() {
        format!("{}:{}", group_name, index + 1)
    } else {
        command.label.clone()
    };
    let color = if command.color.trim().is_empty() {
        color::palette_color(index)
    } else {
        color::parse_color_name(&command.color)
    };
    let spec = shell::bind(
        line,
        paths::resolve_working_dir(Some(&command.path)),
        BTreeMap::new(),
    )?;
    Ok(ParallelJob { label, color, spec })
}

fn print_configured_commands<'a, I>(entries: I)
where
    I: IntoIterator<Item = (ColoredString, &'a str)>,
{
    println!("Configured commands:");
    for (label, command) in entries {
        println!("[{}] -> {}", label, command);
    }
    println!("{}", "=".repeat(30));
    println!();
}

fn report_prep_failure(command: &str, error: &MaterializeError) {
    log::error!("Failed to prepare command '{}': {}", command, error);
    eprintln!("{} [{}]: {}", "failed to prepare command".red(), command, error);
}

fn finish_parallel(report: &ParallelReport, prep_failures: usize) -> Result<(), ExecutionError> {
    let failed = report.failed() + prep_failures;
    let total = report.total() + prep_failures;
    if failed > 0 {
        for job in report.jobs.iter().filter(|job| !job.succeeded()) {
            log::trace!("Parallel job '{}' ended in state {:?}", job.label, job.state);
        }
        return Err(ExecutionError::ParallelFailures { failed, total });
    }
    Ok(())
}

// MARK: --- UNIT TESTS ---
