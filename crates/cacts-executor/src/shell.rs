//! Shell command execution.
//!
//! Commands run through `sh -c`, so they may use pipes, redirections and
//! `&&` chains. An optional env setup string runs right before the command
//! in the same shell, which lets machine setup (module loads, exports) apply
//! to it.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use cacts_core::{Error, Result};
use tracing::debug;

/// Captured result of a shell command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit status. `-1` if the process was terminated by a signal.
    pub status: i32,
    /// Trimmed standard output.
    pub stdout: String,
    /// Trimmed standard error.
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status == 0
    }

    /// Stderr if there is any, stdout otherwise.
    pub fn error_text(&self) -> &str {
        if self.stderr.is_empty() {
            &self.stdout
        } else {
            &self.stderr
        }
    }
}

/// Builder for a single shell command invocation.
#[derive(Debug, Clone)]
pub struct ShellCommand {
    command: String,
    working_dir: Option<PathBuf>,
    env_setup: Option<String>,
    dry_run: bool,
}

impl ShellCommand {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            working_dir: None,
            env_setup: None,
            dry_run: false,
        }
    }

    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Setup commands chained in front of the command with `&&`.
    pub fn env_setup(mut self, setup: impl Into<String>) -> Self {
        let setup = setup.into();
        self.env_setup = if setup.trim().is_empty() {
            None
        } else {
            Some(setup)
        };
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// The full command line handed to the shell.
    pub fn command_line(&self) -> String {
        match &self.env_setup {
            Some(setup) => format!("{} && {}", setup, self.command),
            None => self.command.clone(),
        }
    }

    /// Run the command and capture its output.
    ///
    /// A non-zero exit status is not an error here; see [`ShellCommand::run_or_fail`].
    pub fn run(&self) -> Result<CommandOutput> {
        let command_line = self.command_line();
        debug!(
            command = %command_line,
            from_dir = %self.display_dir(),
            dry_run = self.dry_run,
            "Running shell command"
        );

        if self.dry_run {
            return Ok(CommandOutput {
                status: 0,
                stdout: String::new(),
                stderr: String::new(),
            });
        }

        let mut cmd = Command::new("sh");
        cmd.arg("-c")
            .arg(&command_line)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }

        let output = cmd.output()?;
        let status = output.status.code().unwrap_or(-1);
        let result = CommandOutput {
            status,
            stdout: String::from_utf8_lossy(&output.stdout).trim().to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        };

        debug!(command = %command_line, status, "Shell command finished");
        Ok(result)
    }

    /// Run the command and return its stdout, failing on non-zero exit.
    pub fn run_or_fail(&self) -> Result<String> {
        let output = self.run()?;
        if !output.success() {
            return Err(Error::CommandFailed {
                command: self.command.clone(),
                status: output.status,
                message: output.error_text().to_string(),
                working_dir: self.display_dir(),
            });
        }
        Ok(output.stdout)
    }

    fn display_dir(&self) -> String {
        match &self.working_dir {
            Some(dir) => dir.display().to_string(),
            None => std::env::current_dir()
                .map(|d| d.display().to_string())
                .unwrap_or_else(|_| ".".to_string()),
        }
    }
}

/// Run `command` in a shell and capture status, stdout and stderr.
pub fn run_command(
    command: &str,
    working_dir: Option<&Path>,
    env_setup: Option<&str>,
    dry_run: bool,
) -> Result<CommandOutput> {
    build(command, working_dir, env_setup, dry_run).run()
}

/// Run `command` in a shell, returning stdout or failing on non-zero exit.
pub fn run_command_or_fail(
    command: &str,
    working_dir: Option<&Path>,
    env_setup: Option<&str>,
    dry_run: bool,
) -> Result<String> {
    build(command, working_dir, env_setup, dry_run).run_or_fail()
}

fn build(
    command: &str,
    working_dir: Option<&Path>,
    env_setup: Option<&str>,
    dry_run: bool,
) -> ShellCommand {
    let mut cmd = ShellCommand::new(command).dry_run(dry_run);
    if let Some(dir) = working_dir {
        cmd = cmd.working_dir(dir);
    }
    if let Some(setup) = env_setup {
        cmd = cmd.env_setup(setup);
    }
    cmd
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_command() {
        let output = run_command("echo Hello, World!", None, None, false).unwrap();
        assert_eq!(output.status, 0);
        assert_eq!(output.stdout, "Hello, World!");
        assert_eq!(output.stderr, "");
    }

    #[test]
    fn test_run_command_captures_failure() {
        let output = run_command("echo oops 1>&2; exit 3", None, None, false).unwrap();
        assert_eq!(output.status, 3);
        assert_eq!(output.stderr, "oops");
        assert!(!output.success());
    }

    #[test]
    fn test_missing_file_is_non_zero() {
        let output = run_command("ls file_i_hope_doesnt_exist", None, None, false).unwrap();
        assert_ne!(output.status, 0);
    }

    #[test]
    fn test_env_setup_runs_first() {
        let output = run_command("echo $GREETING", None, Some("export GREETING=hi"), false).unwrap();
        assert_eq!(output.stdout, "hi");
    }

    #[test]
    fn test_failing_env_setup_skips_command() {
        let output = run_command("echo unreachable", None, Some("false"), false).unwrap();
        assert_ne!(output.status, 0);
        assert_eq!(output.stdout, "");
    }

    #[test]
    fn test_dry_run_spawns_nothing() {
        let _lock = crate::test_support::file_mode_lock();
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("marker");
        let cmd = format!("touch {}", marker.display());

        let output = run_command(&cmd, None, None, true).unwrap();
        assert_eq!(
            output,
            CommandOutput {
                status: 0,
                stdout: String::new(),
                stderr: String::new(),
            }
        );
        assert!(!marker.exists());
    }

    #[test]
    fn test_working_dir() {
        let _lock = crate::test_support::file_mode_lock();
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("here.txt"), "x").unwrap();

        let output = run_command("ls", Some(dir.path()), None, false).unwrap();
        assert_eq!(output.stdout, "here.txt");
    }

    #[test]
    fn test_output_is_trimmed() {
        let output = run_command("printf '  padded  \\n\\n'", None, None, false).unwrap();
        assert_eq!(output.stdout, "padded");
    }

    #[test]
    fn test_run_command_or_fail() {
        let output = run_command_or_fail("echo Hello, World!", None, None, false).unwrap();
        assert_eq!(output, "Hello, World!");
    }

    #[test]
    fn test_run_command_or_fail_reports_stderr() {
        let err = run_command_or_fail("echo broken 1>&2; false", None, None, false).unwrap_err();
        match err {
            Error::CommandFailed {
                command,
                status,
                message,
                ..
            } => {
                assert_eq!(command, "echo broken 1>&2; false");
                assert_eq!(status, 1);
                assert_eq!(message, "broken");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_run_command_or_fail_falls_back_to_stdout() {
        let err = run_command_or_fail("echo only-stdout; exit 2", None, None, false).unwrap_err();
        assert!(err.to_string().contains("only-stdout"));
    }

    #[test]
    fn test_command_line() {
        let cmd = ShellCommand::new("make").env_setup("source env.sh");
        assert_eq!(cmd.command_line(), "source env.sh && make");

        let cmd = ShellCommand::new("make").env_setup("   ");
        assert_eq!(cmd.command_line(), "make");
    }
}
