// src/system/executor.rs

use crate::{
    CancellationToken,
    core::{color, commons, materializer::MaterializeError},
    models::ProcessSpec,
    system::shell,
};
use colored::{Color, Colorize};
use std::process::ExitStatus;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::task::JoinSet;

/// Lines read from a child are first collected into a buffer of this capacity.
const LINE_BUFFER_CAPACITY: usize = 256;

/// Everything that can stop an alias run.
#[derive(Error, Debug)]
pub enum ExecutionError {
    /// A template could not be turned into a process.
    #[error(transparent)]
    Materialize(#[from] MaterializeError),
    /// The shell could not be spawned.
    #[error("Command '{0}' could not be executed: {1}")]
    SpawnFailed(String, #[source] std::io::Error),
    /// The child was spawned but its exit status could not be collected.
    #[error("Failed to wait for command '{0}': {1}")]
    WaitFailed(String, #[source] std::io::Error),
    /// A sequential step exited unsuccessfully.
    #[error("Command '{command}' failed with {status}.")]
    NonZeroExit {
        /// The final command line.
        command: String,
        /// Its exit status.
        status: ExitStatus,
    },
    /// At least one parallel job failed. Reported once every job is done.
    #[error("{failed} of {total} parallel command(s) failed.")]
    ParallelFailures {
        /// Jobs that failed to prepare, to start or exited unsuccessfully.
        failed: usize,
        /// Every job of the run.
        total: usize,
    },
    /// The interrupt listener tripped the token.
    #[error("Operation was interrupted by the user.")]
    Interrupted,
}

/// Runs one child attached to the terminal and waits for it.
///
/// An interrupt does not kill the child: it is awaited, and only then is the
/// interruption reported so that no further step is started.
pub async fn execute_command(
    spec: &ProcessSpec,
    cancellation_token: &CancellationToken,
) -> Result<(), ExecutionError> {
    if commons::is_cancelled(cancellation_token) {
        return Err(ExecutionError::Interrupted);
    }

    log::debug!(
        "Spawning '{} {:?}' (cwd: {:?})",
        spec.program,
        spec.args,
        spec.working_dir
    );
    let mut child = shell::build_interactive_command(spec)
        .spawn()
        .map_err(|e| ExecutionError::SpawnFailed(spec.line.clone(), e))?;

    let status = child
        .wait()
        .await
        .map_err(|e| ExecutionError::WaitFailed(spec.line.clone(), e))?;
    log::debug!("Command '{}' finished with {}", spec.line, status);

    if commons::is_cancelled(cancellation_token) {
        return Err(ExecutionError::Interrupted);
    }
    if !status.success() {
        return Err(ExecutionError::NonZeroExit {
            command: spec.line.clone(),
            status,
        });
    }
    Ok(())
}

// --- Parallel execution ---

/// One concurrent job: a materialized process and the label its output is tagged with.
#[derive(Debug, Clone)]
pub struct ParallelJob {
    /// Shown as `[label]` in front of every output line.
    pub label: String,
    /// Color of the label.
    pub color: Color,
    /// The process to run.
    pub spec: ProcessSpec,
}

/// How parallel output is echoed.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputOptions {
    /// Drain the streams without echoing them.
    pub suppress: bool,
    /// Recolor every echoed line. Without it children get `FORCE_COLOR=1`.
    pub line_color: Option<Color>,
}

/// Lifecycle of a parallel job: `Pending → Running → {Completed, FailedToStart}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobState {
    /// Not spawned yet.
    Pending,
    /// Spawned, exit not collected yet.
    Running,
    /// The child exited. `code` is `None` when it was killed by a signal.
    Completed {
        /// Exit code, if any.
        code: Option<i32>,
        /// Whether the exit status was a success.
        success: bool,
    },
    /// The child could not be spawned.
    FailedToStart(String),
}

/// Outcome of one parallel job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobReport {
    /// The job label.
    pub label: String,
    /// Final state of the job.
    pub state: JobState,
    /// Lines read from stdout.
    pub stdout_lines: usize,
    /// Lines read from stderr.
    pub stderr_lines: usize,
}

impl JobReport {
    fn pending(label: &str) -> Self {
        Self {
            label: label.to_string(),
            state: JobState::Pending,
            stdout_lines: 0,
            stderr_lines: 0,
        }
    }

    /// `true` only for a completed job with a successful exit status.
    pub fn succeeded(&self) -> bool {
        matches!(self.state, JobState::Completed { success: true, .. })
    }
}

/// Final state of every job of a parallel run, in job order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParallelReport {
    /// One report per job.
    pub jobs: Vec<JobReport>,
}

impl ParallelReport {
    /// Number of jobs that did not succeed.
    pub fn failed(&self) -> usize {
        self.jobs.iter().filter(|job| !job.succeeded()).count()
    }

    /// Number of jobs in the run.
    pub fn total(&self) -> usize {
        self.jobs.len()
    }
}

#[derive(Debug, Clone, Copy)]
enum StreamKind {
    Stdout,
    Stderr,
}

#[derive(Debug)]
enum TaskOutcome {
    Exited(Result<ExitStatus, String>),
    Drained { stream: StreamKind, lines: usize },
}

/// Launches every job concurrently and returns once all of them are done.
///
/// Each spawned child owns exactly three tasks in one `JoinSet`: its wait and the
/// line-by-line drain of stdout and stderr. The set is the barrier: nothing returns
/// before every child exited and every stream reached EOF. A job that cannot be
/// spawned is reported and its siblings keep running.
pub async fn run_parallel(
    jobs: Vec<ParallelJob>,
    options: &OutputOptions,
    cancellation_token: &CancellationToken,
) -> Result<ParallelReport, ExecutionError> {
    let mut report = ParallelReport::default();
    let mut tasks: JoinSet<(usize, TaskOutcome)> = JoinSet::new();

    for (index, job) in jobs.into_iter().enumerate() {
        let mut job_report = JobReport::pending(&job.label);
        let prefix = color::label_prefix(&job.label, job.color).to_string();

        if commons::is_cancelled(cancellation_token) {
            log::debug!("Interrupted before '{}' was started.", job.label);
            job_report.state = JobState::FailedToStart("interrupted".to_string());
            report.jobs.push(job_report);
            continue;
        }

        let mut command = shell::build_captured_command(&job.spec);
        if options.line_color.is_none() {
            command.env("FORCE_COLOR", "1");
        }

        println!("{} {}", "Running command:".dimmed(), job.label);
        log::debug!("Starting parallel job '{}': {}", job.label, job.spec.line);
        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(e) => {
                log::error!("Parallel job '{}' failed to start: {}", job.label, e);
                eprintln!("{} {} {}", prefix, "failed to start:".red(), e);
                job_report.state = JobState::FailedToStart(e.to_string());
                report.jobs.push(job_report);
                continue;
            }
        };
        job_report.state = JobState::Running;
        report.jobs.push(job_report);

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let options = *options;

        let out_prefix = prefix.clone();
        tasks.spawn(async move {
            let lines = drain_lines(stdout, &out_prefix, StreamKind::Stdout, options).await;
            (index, TaskOutcome::Drained { stream: StreamKind::Stdout, lines })
        });
        let err_prefix = prefix.clone();
        tasks.spawn(async move {
            let lines = drain_lines(stderr, &err_prefix, StreamKind::Stderr, options).await;
            (index, TaskOutcome::Drained { stream: StreamKind::Stderr, lines })
        });
        tasks.spawn(async move {
            let status = child.wait().await.map_err(|e| e.to_string());
            println!("{} {}", prefix, "exited.".dimmed());
            (index, TaskOutcome::Exited(status))
        });
    }

    while let Some(joined) = tasks.join_next().await {
        let (index, outcome) = match joined {
            Ok(result) => result,
            Err(e) => {
                log::error!("A parallel task did not complete: {}", e);
                continue;
            }
        };
        let Some(job) = report.jobs.get_mut(index) else {
            continue;
        };
        match outcome {
            TaskOutcome::Exited(Ok(status)) => {
                log::debug!("Parallel job '{}' finished with {}", job.label, status);
                job.state = JobState::Completed {
                    code: status.code(),
                    success: status.success(),
                };
            }
            TaskOutcome::Exited(Err(e)) => {
                log::error!("Failed to wait for parallel job '{}': {}", job.label, e);
                job.state = JobState::Completed {
                    code: None,
                    success: false,
                };
            }
            TaskOutcome::Drained { stream, lines } => match stream {
                StreamKind::Stdout => job.stdout_lines = lines,
                StreamKind::Stderr => job.stderr_lines = lines,
            },
        }
    }

    if commons::is_cancelled(cancellation_token) {
        return Err(ExecutionError::Interrupted);
    }
    Ok(report)
}

/// Reads a child stream to EOF, echoing each line behind its label.
///
/// Lines are split on `\n` as raw bytes and decoded lossily, so output that is not
/// valid UTF-8 is still drained. The stream is only released at EOF, or when reading
/// fails, in which case the rest is discarded so the child never blocks on a full pipe.
async fn drain_lines<R>(
    reader: Option<R>,
    prefix: &str,
    stream: StreamKind,
    options: OutputOptions,
) -> usize
where
    R: AsyncRead + Unpin,
{
    let Some(reader) = reader else {
        return 0;
    };
    let mut reader = BufReader::new(reader);
    let mut buffer = Vec::with_capacity(LINE_BUFFER_CAPACITY);
    let mut count = 0;
    loop {
        buffer.clear();
        match reader.read_until(b'\n', &mut buffer).await {
            Ok(0) => break,
            Ok(_) => {
                count += 1;
                if !options.suppress {
                    echo_line(prefix, stream, options, &buffer);
                }
            }
            Err(e) => {
                log::warn!("Stopped reading {:?} of {}: {}", stream, prefix, e);
                discard_rest(&mut reader).await;
                break;
            }
        }
    }
    count
}

/// Drops the line terminator and replaces invalid UTF-8 sequences.
fn decode_line(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw)
        .trim_end_matches(['\n', '\r'])
        .to_string()
}

fn echo_line(prefix: &str, stream: StreamKind, options: OutputOptions, raw: &[u8]) {
    let text = decode_line(raw);
    let line = match options.line_color {
        Some(color) => text.color(color).to_string(),
        None => text,
    };
    match stream {
        StreamKind::Stdout => println!("{} {}", prefix, line),
        StreamKind::Stderr => eprintln!("{} {}", prefix, line),
    }
}

/// Keeps consuming a stream that can no longer be read line by line.
async fn discard_rest<R>(reader: &mut BufReader<R>)
where
    R: AsyncRead + Unpin,
{
    let mut sink = tokio::io::sink();
    if let Err(e) = tokio::io::copy_buf(reader, &mut sink).await {
        log::warn!("Could not discard the rest of a child stream: {}", e);
    }
}

// MARK: --- UNIT TESTS ---
