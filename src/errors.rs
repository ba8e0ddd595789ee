//! Harness Error Handling
//!
//! Every failure the harness can observe is a [`HarnessError`]. The variants fall into
//! three families that drive how far a failure propagates:
//!
//! - **Tool invocation** failures (`ToolInvocation`, `ToolSpawn`) are recorded as an
//!   outcome by the orchestrator. Whether they end the whole directory or only the
//!   current unit depends on the stage that failed.
//! - **Discovery** failures (`MissingSourceDirectory`, `Io`) end the affected directory.
//! - **Precondition** failures end the run before any directory executes.

use std::path::PathBuf;
use std::process::ExitStatus;

use miette::Diagnostic;
use thiserror::Error;

// ============================================================================
// ERROR TYPE
// ============================================================================

#[derive(Error, Diagnostic, Debug)]
pub enum HarnessError {
    #[error("{tool} exited with {status}")]
    #[diagnostic(code(harness::tool::failed))]
    ToolInvocation {
        tool: String,
        status: ExitStatus,
        /// Captured standard error, echoed verbatim to the operator.
        stderr: String,
    },

    #[error("failed to start {tool}")]
    #[diagnostic(code(harness::tool::spawn))]
    ToolSpawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("test directory has no `src` directory: {}", path.display())]
    #[diagnostic(
        code(harness::discovery::missing_src),
        help("every test directory needs a `src` subdirectory holding its C and Rust fixtures")
    )]
    MissingSourceDirectory { path: PathBuf },

    #[error("I/O error on {}", path.display())]
    #[diagnostic(code(harness::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} not found")]
    #[diagnostic(code(harness::precondition::missing_tool))]
    MissingTool {
        tool: String,
        #[help]
        hint: Option<String>,
    },

    #[error("directory:{} {reason}", path.display())]
    #[diagnostic(code(harness::precondition::directory))]
    InvalidDirectory { path: PathBuf, reason: String },

    #[error("nothing to test")]
    #[diagnostic(
        code(harness::precondition::nothing_to_test),
        help("check --only-directories and --test-longdoubles")
    )]
    NothingToTest,

    #[error("invalid regular expression `{pattern}`")]
    #[diagnostic(code(harness::precondition::pattern))]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

impl HarnessError {
    /// Wraps an I/O error with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        HarnessError::Io {
            path: path.into(),
            source,
        }
    }

    /// True for failures that abort the run before any directory executes.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            HarnessError::MissingTool { .. }
                | HarnessError::InvalidDirectory { .. }
                | HarnessError::NothingToTest
                | HarnessError::InvalidPattern { .. }
        )
    }

    /// Diagnostic text to echo to the operator at the point of failure.
    ///
    /// For a failed tool this is its captured standard error, untouched.
    pub fn diagnostic_text(&self) -> String {
        match self {
            HarnessError::ToolInvocation { stderr, .. } => stderr.clone(),
            HarnessError::ToolSpawn { tool, source } => format!("{tool}: {source}\n"),
            other => format!("{other}\n"),
        }
    }
}

pub type HarnessResult<T> = Result<T, HarnessError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precondition_classification() {
        assert!(HarnessError::NothingToTest.is_precondition());
        assert!(HarnessError::MissingTool {
            tool: "clang".into(),
            hint: None
        }
        .is_precondition());
        assert!(!HarnessError::MissingSourceDirectory {
            path: PathBuf::from("/tmp/x")
        }
        .is_precondition());
    }

    #[test]
    fn spawn_failure_text_names_the_tool() {
        let err = HarnessError::ToolSpawn {
            tool: "ar".into(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        };
        assert_eq!(err.diagnostic_text(), "ar: no such file\n");
    }
}
