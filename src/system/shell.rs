// src/system/shell.rs

use crate::models::ProcessSpec;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::Stdio;
use thiserror::Error;
use tokio::process::Command;

/// No shell can run a command line on this host.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShellError {
    /// The target OS is neither Unix nor Windows.
    #[error("Unsupported platform '{0}': no known command shell.")]
    UnsupportedPlatform(&'static str),
}

/// The command shell of the host and the switch that makes it run one command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostShell {
    /// `sh` or `cmd`.
    pub program: &'static str,
    /// `-c` or `/C`.
    pub command_switch: &'static str,
}

/// Detects the shell for the current target (`sh -c` on Unix, `cmd /C` on Windows).
pub fn host_shell() -> Result<HostShell, ShellError> {
    if cfg!(target_os = "windows") {
        Ok(HostShell {
            program: "cmd",
            command_switch: "/C",
        })
    } else if cfg!(unix) {
        Ok(HostShell {
            program: "sh",
            command_switch: "-c",
        })
    } else {
        Err(ShellError::UnsupportedPlatform(std::env::consts::OS))
    }
}

/// Binds a final command line to the host shell.
pub fn bind(
    line: String,
    working_dir: Option<PathBuf>,
    env: BTreeMap<String, String>,
) -> Result<ProcessSpec, ShellError> {
    let shell = host_shell()?;
    Ok(ProcessSpec {
        program: shell.program.to_string(),
        args: vec![shell.command_switch.to_string(), line.clone()],
        working_dir,
        env,
        line,
    })
}

/// Builds the tokio command for a spec. The process environment is inherited and the
/// spec's variables are added on top. Stdio is left to the caller.
pub fn build_command(spec: &ProcessSpec) -> Command {
    let mut command = Command::new(&spec.program);
    command.args(&spec.args).envs(&spec.env);
    if let Some(dir) = &spec.working_dir {
        command.current_dir(dir);
    }
    command
}

/// Builds a command wired straight to the invoking terminal.
pub fn build_interactive_command(spec: &ProcessSpec) -> Command {
    let mut command = build_command(spec);
    command
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit());
    command
}

/// Builds a command whose output streams are piped back to the engine.
pub fn build_captured_command(spec: &ProcessSpec) -> Command {
    let mut command = build_command(spec);
    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    command
}
