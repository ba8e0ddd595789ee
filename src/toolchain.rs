//! External tools the harness drives.
//!
//! Tools are resolved once at startup and handed to the orchestrator as a plain
//! value, so tests can point every entry at a stand-in script.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::errors::{HarnessError, HarnessResult};

/// Cargo profile used for the generated test crate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BuildProfile {
    #[default]
    Debug,
    Release,
}

/// Resolved tool binaries and build settings.
#[derive(Debug, Clone)]
pub struct Toolchain {
    /// Native C compiler.
    pub cc: PathBuf,
    /// Static archiver.
    pub ar: PathBuf,
    /// Rust build/run tool for the generated crate.
    pub cargo: PathBuf,
    /// Rust compiler, used for library-only compiles of `xfail` files.
    pub rustc: PathBuf,
    /// The C-to-Rust translator under test.
    pub translator: PathBuf,
    pub profile: BuildProfile,
    /// Prepended to `LD_LIBRARY_PATH` when running the translator.
    pub rust_lib_dir: Option<PathBuf>,
}

impl Toolchain {
    /// Resolves each tool name through `PATH`, or checks it directly when it is a path.
    pub fn resolve(
        cc: &Path,
        ar: &Path,
        cargo: &Path,
        rustc: &Path,
        translator: &Path,
    ) -> HarnessResult<Self> {
        Ok(Self {
            cc: resolve_tool(cc, None)?,
            ar: resolve_tool(ar, None)?,
            cargo: resolve_tool(cargo, None)?,
            rustc: resolve_tool(rustc, None)?,
            translator: resolve_tool(
                translator,
                Some("build the translator first (cargo build --release)"),
            )?,
            profile: BuildProfile::Debug,
            rust_lib_dir: None,
        })
    }

    pub fn with_profile(mut self, profile: BuildProfile) -> Self {
        self.profile = profile;
        self
    }

    pub fn with_rust_lib_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.rust_lib_dir = dir;
        self
    }

    pub fn is_release(&self) -> bool {
        self.profile == BuildProfile::Release
    }

    /// `LD_LIBRARY_PATH` value for the translator process.
    pub fn translator_library_path(&self) -> Option<OsString> {
        let existing = std::env::var_os("LD_LIBRARY_PATH").filter(|value| !value.is_empty());
        match (&self.rust_lib_dir, existing) {
            (Some(dir), Some(existing)) => {
                let mut value = dir.as_os_str().to_os_string();
                value.push(":");
                value.push(existing);
                Some(value)
            }
            (Some(dir), None) => Some(dir.as_os_str().to_os_string()),
            (None, existing) => existing,
        }
    }
}

fn resolve_tool(tool: &Path, hint: Option<&str>) -> HarnessResult<PathBuf> {
    let missing = || HarnessError::MissingTool {
        tool: tool.display().to_string(),
        hint: hint.map(str::to_string),
    };
    if tool.components().count() > 1 || tool.is_absolute() {
        return if tool.is_file() {
            Ok(tool.to_path_buf())
        } else {
            Err(missing())
        };
    }
    which::which(tool).map_err(|_| missing())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_path_tool_is_a_precondition_failure() {
        let err = resolve_tool(Path::new("/definitely/not/here/c2rust"), Some("build it")).unwrap_err();
        assert!(err.is_precondition());
        assert!(matches!(err, HarnessError::MissingTool { hint: Some(_), .. }));
    }

    #[test]
    fn existing_path_tool_resolves_to_itself() {
        let dir = tempfile::tempdir().unwrap();
        let tool = dir.path().join("translator");
        std::fs::write(&tool, "").unwrap();
        assert_eq!(resolve_tool(&tool, None).unwrap(), tool);
    }
}
