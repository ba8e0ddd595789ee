//! Test directory orchestration.
//!
//! A test directory looks like
//!
//! ```text
//! ptr/
//!   Cargo.toml
//!   src/
//!     ptr.c           C source, compiled into libtest.a and translated to ptr.rs
//!     test_ptr.rs     hand-written tests calling into the translated code
//! ```
//!
//! [`TestDirectory::run`] drives it through
//! `Discovered → LibraryBuilt → Translated → Assembled → Compiled → Dispatched → Reported`
//! and returns one [`TestOutcome`] per attempted unit. Generated files are removed by
//! [`TestDirectory::cleanup`], which also runs when the directory is dropped.

use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;
use termcolor::WriteColor;
use walkdir::WalkDir;

use crate::artifacts::{ArtifactKind, GeneratedFiles, KeepSet};
use crate::assembly::{dispatched_functions, TestCrateBuilder};
use crate::builder::{build_static_library, translate};
use crate::errors::{HarnessError, HarnessResult};
use crate::fixture::{file_name, file_stem, is_native_source, is_test_file, NativeSource, TestFile, TestFunction};
use crate::interrupt;
use crate::invoke::ToolCommand;
use crate::logging::LogLevel;
use crate::outcome::TestOutcome;
use crate::report::{StatusReporter, StatusTier};
use crate::toolchain::Toolchain;

/// Extra arguments handed to the translator's clang front end.
const TRANSLATOR_EXTRA_ARGS: [&str; 1] = ["-march=native"];

/// Extra `rustc` arguments for library-only compiles.
const RUSTC_EXTRA_ARGS: [&str; 2] = ["-C", "target-cpu=native"];

/// Name suffix of directories that need extended-precision support.
const LONGDOUBLE_SUFFIX: &str = "longdouble";

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Settings shared by every directory of a run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub toolchain: Toolchain,
    /// Searched within the stem of each `test_*.rs` file.
    pub files: Regex,
    pub keep: KeepSet,
    pub log_level: LogLevel,
}

/// Which immediate subdirectories of the input directory take part in a run.
#[derive(Debug, Clone)]
pub struct DirectoryFilter {
    /// Must match the whole directory name.
    pub only_directories: Regex,
    pub include_longdoubles: bool,
}

impl DirectoryFilter {
    pub fn new(only_directories: &str, include_longdoubles: bool) -> HarnessResult<Self> {
        let anchored = format!("^(?:{only_directories})$");
        let only_directories = Regex::new(&anchored).map_err(|source| HarnessError::InvalidPattern {
            pattern: only_directories.to_string(),
            source,
        })?;
        Ok(Self {
            only_directories,
            include_longdoubles,
        })
    }

    pub fn accepts(&self, name: &str) -> bool {
        if name.ends_with(LONGDOUBLE_SUFFIX) && !self.include_longdoubles {
            return false;
        }
        self.only_directories.is_match(name)
    }
}

/// Lists the test directories under `root` that pass `filter`, in name order.
pub fn select_test_directories(root: &Path, filter: &DirectoryFilter) -> HarnessResult<Vec<PathBuf>> {
    let mut selected = Vec::new();
    for entry in WalkDir::new(root).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(root).to_path_buf();
            HarnessError::io(path, e.into())
        })?;
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if filter.accepts(&name) {
            selected.push(path.to_path_buf());
        } else {
            tracing::debug!("not selected: {name}");
        }
    }
    Ok(selected)
}

// ============================================================================
// TEST DIRECTORY
// ============================================================================

/// Pipeline position of a test directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Discovered,
    LibraryBuilt,
    Translated,
    Assembled,
    Compiled,
    Dispatched,
    Reported,
}

pub struct TestDirectory<'cfg> {
    pub name: String,
    pub path: PathBuf,
    pub src_path: PathBuf,
    pub native_sources: Vec<NativeSource>,
    pub test_files: Vec<TestFile>,
    generated: GeneratedFiles,
    stage: Stage,
    cleaned: bool,
    config: &'cfg RunConfig,
}

impl<'cfg> TestDirectory<'cfg> {
    /// Reads the fixtures under `<path>/src`.
    ///
    /// C files annotated `skip_translation` are left out, as are test files whose
    /// stem does not match the file filter.
    pub fn discover(path: &Path, config: &'cfg RunConfig) -> HarnessResult<Self> {
        let path = fs::canonicalize(path).map_err(|e| HarnessError::io(path, e))?;
        let src_path = path.join("src");
        if !src_path.is_dir() {
            return Err(HarnessError::MissingSourceDirectory { path });
        }

        let mut native_sources = Vec::new();
        let mut test_files = Vec::new();
        for entry in WalkDir::new(&src_path).min_depth(1).max_depth(1).sort_by_file_name() {
            let entry = entry.map_err(|e| HarnessError::io(&src_path, e.into()))?;
            let file = entry.path();
            if !file.is_file() {
                continue;
            }
            if is_native_source(file) {
                if let Some(source) = NativeSource::read(file, config.log_level)? {
                    native_sources.push(source);
                }
            } else if is_test_file(file) && config.files.is_match(&file_stem(file)) {
                test_files.push(TestFile::read(file)?);
            }
        }

        Ok(Self {
            name: file_name(&path),
            path,
            src_path,
            native_sources,
            test_files,
            generated: GeneratedFiles::new(),
            stage: Stage::Discovered,
            cleaned: false,
            config,
        })
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn generated(&self) -> &GeneratedFiles {
        &self.generated
    }

    /// True when any test file declares at least one test function.
    pub fn has_tests(&self) -> bool {
        self.test_files.iter().any(|file| !file.test_functions.is_empty())
    }

    /// Runs the whole pipeline and returns the outcomes it produced.
    ///
    /// A directory without test functions or without C sources is skipped and
    /// yields no outcomes.
    pub fn run<W: WriteColor>(&mut self, reporter: &mut StatusReporter<W>) -> Vec<TestOutcome> {
        let mut outcomes = Vec::new();

        if !self.has_tests() {
            tracing::debug!("{}: [ SKIPPED ] No tests were found...", self.name);
            return outcomes;
        }
        if self.native_sources.is_empty() {
            tracing::debug!("{}: [ SKIPPED ] No c files were found...", self.name);
            return outcomes;
        }

        reporter.header(&self.name);
        if self.run_stages(reporter, &mut outcomes).is_none() {
            return outcomes;
        }
        if outcomes.is_empty() {
            reporter.status(
                StatusTier::Info,
                "N/A",
                &format!(
                    "   No rust file(s) matching {} within this folder\n",
                    self.config.files.as_str()
                ),
            );
        }
        self.stage = Stage::Reported;
        outcomes
    }

    /// Returns `None` when a stage halted the directory.
    fn run_stages<W: WriteColor>(
        &mut self,
        reporter: &mut StatusReporter<W>,
        outcomes: &mut Vec<TestOutcome>,
    ) -> Option<()> {
        let config = self.config;
        let toolchain = &config.toolchain;

        // .c -> .a
        reporter.status(
            StatusTier::Running,
            "RUNNING",
            "libtest.a: creating a static C library...",
        );
        match build_static_library(&self.native_sources, &self.path, toolchain, &mut self.generated) {
            Ok(Some(library)) => tracing::debug!(
                "{}: built {} (-l{}, {} objects)",
                self.name,
                library.path.display(),
                library.link_name,
                library.object_files.len()
            ),
            Ok(None) => {}
            Err(e) => {
                reporter.status_line(StatusTier::Fail, "FAILED", "create libtest.a");
                reporter.diagnostics(&e.diagnostic_text());
                outcomes.push(TestOutcome::UnexpectedFailure);
                return None;
            }
        }
        self.stage = Stage::LibraryBuilt;
        stop_if_interrupted()?;

        // .c -> .rs
        let mut crate_builder = TestCrateBuilder::new();
        for source in &self.native_sources {
            let file_name = source.file_name();
            reporter.status(
                StatusTier::Running,
                "RUNNING",
                &format!("{file_name}: translating the C file into Rust..."),
            );
            match translate(source, toolchain, &TRANSLATOR_EXTRA_ARGS, &mut self.generated) {
                Ok(translated) => crate_builder.add_module(&translated.module_name()),
                Err(e) => {
                    reporter.status_line(StatusTier::Fail, "FAILED", &format!("translate {file_name}"));
                    reporter.diagnostics(&e.diagnostic_text());
                    outcomes.push(TestOutcome::UnexpectedFailure);
                }
            }
            stop_if_interrupted()?;
        }
        self.stage = Stage::Translated;

        // one crate calling every test
        for test_file in &self.test_files {
            crate_builder.add_test_file(test_file);
            if !test_file.pass_expected {
                outcomes.push(compile_expected_failure(test_file, toolchain, reporter));
                stop_if_interrupted()?;
            } else {
                for skipped in test_file.test_functions.iter().filter(|f| !f.pass_expected) {
                    tracing::debug!(
                        "{}: {} is marked xfail and is not dispatched",
                        test_file.file_name(),
                        skipped.name
                    );
                }
            }
        }

        let main_path = self.src_path.join("main.rs");
        let written = crate_builder.write(&main_path);
        self.generated.push(ArtifactKind::RustSource, main_path.clone());
        if let Err(e) = written {
            reporter.status_line(StatusTier::Fail, "FAILED", "write main.rs");
            reporter.diagnostics(&e.diagnostic_text());
            outcomes.push(TestOutcome::UnexpectedFailure);
            return None;
        }
        self.stage = Stage::Assembled;

        // build the test binary
        if let Err(e) = cargo_command(toolchain, "build", &self.path).run() {
            reporter.status_line(StatusTier::Fail, "FAILED", "compile main.rs");
            reporter.diagnostics(&e.diagnostic_text());
            outcomes.push(TestOutcome::UnexpectedFailure);
            return None;
        }
        self.stage = Stage::Compiled;
        stop_if_interrupted()?;

        for test_file in self.test_files.iter().filter(|file| file.pass_expected) {
            for function in dispatched_functions(test_file) {
                let outcome = run_test_function(test_file, function, toolchain, &self.path, reporter);
                outcomes.push(outcome);
                stop_if_interrupted()?;
            }
        }
        self.stage = Stage::Dispatched;
        Some(())
    }

    /// Removes generated files, except the categories the operator keeps.
    pub fn cleanup(&mut self) {
        if self.cleaned {
            return;
        }
        self.generated.remove_unkept(&self.config.keep);
        self.cleaned = true;
    }
}

impl Drop for TestDirectory<'_> {
    fn drop(&mut self) {
        self.cleanup();
    }
}

// ============================================================================
// STAGE HELPERS
// ============================================================================

fn stop_if_interrupted() -> Option<()> {
    if interrupt::interrupted() {
        tracing::warn!("interrupted");
        return None;
    }
    Some(())
}

/// `cargo <subcommand> [--release]` inside the test directory.
fn cargo_command(toolchain: &Toolchain, subcommand: &str, dir: &Path) -> ToolCommand {
    let mut command = ToolCommand::new(&toolchain.cargo).arg(subcommand);
    if toolchain.is_release() {
        command = command.arg("--release");
    }
    command.current_dir(dir)
}

/// Runs one test function through the built binary and classifies the result.
fn run_test_function<W: WriteColor>(
    test_file: &TestFile,
    function: &TestFunction,
    toolchain: &Toolchain,
    dir: &Path,
    reporter: &mut StatusReporter<W>,
) -> TestOutcome {
    let key = test_file.dispatch_key(function);
    let result = cargo_command(toolchain, "run", dir).arg("--").arg(&key).output();
    let test_str = format!("{} - {}", test_file.file_name(), function.name);

    let (succeeded, stderr) = match result {
        Ok(output) => (output.success(), output.stderr),
        Err(e) => (false, e.diagnostic_text()),
    };
    let outcome = TestOutcome::classify(succeeded, function.pass_expected);
    match outcome {
        TestOutcome::Success => {
            reporter.status_line(StatusTier::Ok, "OK", &format!("    test {test_str}"));
        }
        TestOutcome::UnexpectedSuccess => {
            reporter.status_line(StatusTier::Fail, "FAILED", &format!("test {test_str}"));
        }
        TestOutcome::UnexpectedFailure => {
            reporter.status_line(StatusTier::Fail, "FAILED", &format!("test {test_str}"));
            reporter.diagnostics(&stderr);
        }
        TestOutcome::Failure => {
            reporter.status_line(StatusTier::Info, "FAILED", &format!("test {test_str}"));
        }
    }
    outcome
}

/// Library-only compile of a whole-file `xfail` test file.
fn compile_expected_failure<W: WriteColor>(
    test_file: &TestFile,
    toolchain: &Toolchain,
    reporter: &mut StatusReporter<W>,
) -> TestOutcome {
    let file_name = test_file.file_name();
    let compiled = tempfile::tempdir()
        .map_err(|e| HarnessError::io(std::env::temp_dir(), e))
        .and_then(|scratch| {
            ToolCommand::new(&toolchain.rustc)
                .arg("--crate-type=lib")
                .args(RUSTC_EXTRA_ARGS)
                .arg("--out-dir")
                .arg(scratch.path())
                .arg(&test_file.path)
                .run()
        });

    match compiled {
        Ok(_) => {
            reporter.status_line(
                StatusTier::Fail,
                "OK",
                &format!("Unexpected success {file_name}"),
            );
            TestOutcome::UnexpectedSuccess
        }
        Err(e @ HarnessError::ToolInvocation { .. }) => {
            reporter.status_line(
                StatusTier::Info,
                "FAILED",
                &format!("Expected failure {file_name}"),
            );
            tracing::error!("stderr:{}", e.diagnostic_text());
            TestOutcome::Failure
        }
        Err(e) => {
            reporter.status_line(StatusTier::Fail, "FAILED", &format!("compile {file_name}"));
            reporter.diagnostics(&e.diagnostic_text());
            TestOutcome::UnexpectedFailure
        }
    }
}
