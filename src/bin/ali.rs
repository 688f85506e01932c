// src/bin/ali.rs

use ali::{
    CancellationToken,
    cli::{
        Cli,
        dispatcher::{self, DispatchError},
    },
    core::{
        arg_parser::{GlobalOptions, Invocation},
        logger,
    },
    system::{executor::ExecutionError, signals},
};
use anyhow::Result;
use clap::Parser;
use colored::*;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

/// The main entry point of the `ali` application.
/// It sets up logging, parses arguments, runs the invocation on a tokio runtime,
/// and performs centralized error handling.
fn main() {
    let cli = Cli::parse();
    let (options, invocation) = cli.resolve();

    // `~/.ali` is created here if missing; the log lives inside it.
    let log_path = logger::init(options.debug);
    log::debug!("CLI args parsed: {:?}", cli);

    let cancellation_token: CancellationToken = Arc::new(AtomicBool::new(false));

    if let Err(e) = run_cli(options, invocation, cancellation_token) {
        // --- Centralized Error Handling ---
        if let Some(exec_err) = e.downcast_ref::<ExecutionError>()
            && matches!(exec_err, ExecutionError::Interrupted)
        {
            // Children have already been joined; leave quietly.
            log::debug!("Run interrupted by the user.");
            std::process::exit(1);
        }

        if let Some(DispatchError::AliasNotFound(name)) = e.downcast_ref::<DispatchError>() {
            log::warn!("Alias '{}' not found.", name);
            println!("alias not found");
            std::process::exit(1);
        }

        log::error!("{:#}", e);
        eprintln!("\n{}: {}", "Error".red().bold(), e);
        if let Some(path) = log_path {
            eprintln!("{} {}", "Details in".dimmed(), path.display());
        }
        std::process::exit(1);
    }
}

/// Builds the runtime, installs the interrupt listener and dispatches the invocation.
fn run_cli(
    options: GlobalOptions,
    invocation: Invocation,
    cancellation_token: CancellationToken,
) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        signals::spawn_interrupt_listener(cancellation_token.clone());
        dispatcher::dispatch(&options, invocation, &cancellation_token).await
    })
}
