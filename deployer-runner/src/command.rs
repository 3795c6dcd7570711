//! External deploy command seam.
//!
//! The working directory travels with the [`CommandSpec`] and is applied to
//! the child process only; the parent's current directory is never touched.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use deployer_core::DeploySettings;

/// Lines of stderr kept on a failed attempt.
const STDERR_TAIL_LINES: usize = 20;

/// A fully-resolved invocation of the deploy tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub working_dir: PathBuf,
}

impl CommandSpec {
    /// `<program> <args…> [<flag> <bundle_config>]`, run inside `working_dir`.
    pub fn for_bundle(settings: &DeploySettings, working_dir: &Path, bundle_config: &Path) -> Self {
        let mut args = settings.args.clone();
        if let Some(flag) = settings.bundle_config_flag.as_deref() {
            args.push(flag.to_string());
            args.push(bundle_config.display().to_string());
        }
        Self {
            program: settings.program.clone(),
            args,
            working_dir: working_dir.to_path_buf(),
        }
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Result of one finished run of the command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutcome {
    pub success: bool,
    /// `None` when the child was killed by a signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutcome {
    /// Last few stderr lines, for error reports.
    pub fn stderr_tail(&self) -> String {
        let lines: Vec<&str> = self.stderr.lines().collect();
        let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
        lines[start..].join("\n")
    }
}

impl From<Output> for CommandOutcome {
    fn from(output: Output) -> Self {
        Self {
            success: output.status.success(),
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }
}

/// Runs a [`CommandSpec`] to completion.
///
/// `Err` means the process could not be started at all; a started process
/// that exits non-zero is an `Ok` outcome with `success == false`.
pub trait CommandRunner {
    fn run(&self, spec: &CommandSpec) -> io::Result<CommandOutcome>;
}

impl<T: CommandRunner + ?Sized> CommandRunner for &T {
    fn run(&self, spec: &CommandSpec) -> io::Result<CommandOutcome> {
        (**self).run(spec)
    }
}

/// How [`ProcessRunner`] wires the child's output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Child writes straight to this process's stdout/stderr.
    #[default]
    Inherit,
    /// Output is captured, logged, and kept for error reports.
    Capture,
}

/// [`CommandRunner`] backed by `std::process::Command`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner {
    mode: OutputMode,
}

impl ProcessRunner {
    pub fn new(mode: OutputMode) -> Self {
        Self { mode }
    }
}

impl CommandRunner for ProcessRunner {
    fn run(&self, spec: &CommandSpec) -> io::Result<CommandOutcome> {
        let mut command = Command::new(&spec.program);
        command
            .args(&spec.args)
            .current_dir(&spec.working_dir)
            .stdin(Stdio::null());

        match self.mode {
            OutputMode::Inherit => {
                let status = command.status()?;
                Ok(CommandOutcome {
                    success: status.success(),
                    exit_code: status.code(),
                    ..CommandOutcome::default()
                })
            }
            OutputMode::Capture => {
                let outcome = CommandOutcome::from(command.output()?);
                if !outcome.stdout.is_empty() {
                    tracing::debug!(
                        program = %spec.program,
                        "stdout:\n{}",
                        outcome.stdout.trim_end()
                    );
                }
                Ok(outcome)
            }
        }
    }
}
