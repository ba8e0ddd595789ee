//! Blocking invocation of external tools with captured output.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

use crate::errors::{HarnessError, HarnessResult};

/// Captured result of a finished tool.
#[derive(Debug)]
pub struct ToolOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.status.success()
    }
}

/// A single external command line.
#[derive(Debug, Clone)]
pub struct ToolCommand {
    program: PathBuf,
    args: Vec<OsString>,
    cwd: Option<PathBuf>,
    envs: Vec<(OsString, OsString)>,
}

impl ToolCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            envs: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args.extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.cwd = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn env(mut self, key: impl AsRef<OsStr>, value: impl AsRef<OsStr>) -> Self {
        self.envs
            .push((key.as_ref().to_os_string(), value.as_ref().to_os_string()));
        self
    }

    /// Short tool name for messages, e.g. `clang`.
    pub fn tool_name(&self) -> String {
        self.program
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.program.display().to_string())
    }

    /// Shell-like rendering that can be pasted to re-run the command.
    pub fn display_line(&self) -> String {
        let mut line = String::new();
        for (key, value) in &self.envs {
            line.push_str(&format!("{}={} \\\n", key.to_string_lossy(), value.to_string_lossy()));
        }
        line.push_str(&self.program.display().to_string());
        for arg in &self.args {
            line.push(' ');
            line.push_str(&arg.to_string_lossy());
        }
        line
    }

    /// Runs to completion, whatever the exit status.
    pub fn output(&self) -> HarnessResult<ToolOutput> {
        tracing::debug!("{} command:\n {}", self.tool_name(), self.display_line());

        let mut command = Command::new(&self.program);
        command.args(&self.args);
        if let Some(dir) = &self.cwd {
            command.current_dir(dir);
        }
        for (key, value) in &self.envs {
            command.env(key, value);
        }

        let output = command.output().map_err(|source| HarnessError::ToolSpawn {
            tool: self.tool_name(),
            source,
        })?;
        let output = ToolOutput {
            status: output.status,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        tracing::debug!("stdout:\n{}", output.stdout);
        tracing::debug!("stderr:\n{}", output.stderr);
        Ok(output)
    }

    /// Runs to completion and turns a non-zero exit into `ToolInvocation`.
    pub fn run(&self) -> HarnessResult<ToolOutput> {
        let output = self.output()?;
        if !output.success() {
            return Err(HarnessError::ToolInvocation {
                tool: self.tool_name(),
                status: output.status,
                stderr: output.stderr,
            });
        }
        Ok(output)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn non_zero_exit_carries_stderr() {
        let err = ToolCommand::new("sh")
            .args(["-c", "echo broken >&2; exit 3"])
            .run()
            .unwrap_err();
        match err {
            HarnessError::ToolInvocation { tool, stderr, status } => {
                assert_eq!(tool, "sh");
                assert_eq!(stderr, "broken\n");
                assert_eq!(status.code(), Some(3));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn runs_in_requested_directory_with_env() {
        let dir = tempfile::tempdir().unwrap();
        let out = ToolCommand::new("sh")
            .args(["-c", "pwd; echo $HARNESS_PROBE"])
            .current_dir(dir.path())
            .env("HARNESS_PROBE", "yes")
            .run()
            .unwrap();
        let canonical = dir.path().canonicalize().unwrap();
        assert!(out.stdout.starts_with(canonical.to_str().unwrap()));
        assert!(out.stdout.ends_with("yes\n"));
    }

    #[test]
    fn missing_program_is_a_spawn_failure() {
        let err = ToolCommand::new("/nonexistent/tool").output().unwrap_err();
        assert!(matches!(err, HarnessError::ToolSpawn { .. }));
    }

    #[test]
    fn display_line_is_rerunnable() {
        let cmd = ToolCommand::new("/usr/bin/ar")
            .env("RUST_BACKTRACE", "1")
            .args(["-rv", "libtest.a"]);
        assert_eq!(cmd.display_line(), "RUST_BACKTRACE=1 \\\n/usr/bin/ar -rv libtest.a");
    }
}
