//! Command-line arguments of the translator test runner.
//!
//! This module uses the `clap` crate with its "derive" feature to create a
//! declarative and type-safe argument parsing structure.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::artifacts::{ArtifactKind, KeepSet};
use crate::logging::LogLevel;

/// Values accepted by `--keep`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KeepChoice {
    #[value(name = "cc_db")]
    CompileCommands,
    #[value(name = "c_obj")]
    ObjectFile,
    #[value(name = "c_lib")]
    StaticLibrary,
    #[value(name = "rust_src")]
    RustSource,
    All,
}

/// The main CLI argument structure.
#[derive(Debug, Parser)]
#[command(
    name = "test_translator",
    version,
    about = "run regression / unit / feature tests."
)]
pub struct HarnessArgs {
    /// Directory whose subdirectories are test directories.
    pub directory: PathBuf,

    /// Regular expression to filter which tests to run
    #[arg(long = "only-files", value_name = "REGEX", default_value = ".*")]
    pub only_files: String,

    /// Regular expression to filter which tests to run
    #[arg(long = "only-directories", value_name = "REGEX", default_value = ".*")]
    pub only_directories: String,

    /// Set the logging level
    #[arg(long = "log", value_enum, default_value_t = LogLevel::Critical)]
    pub log_level: LogLevel,

    /// Which intermediate files to not clear
    #[arg(long, value_enum)]
    pub keep: Vec<KeepChoice>,

    /// Enables testing of long double translation which requires gcc headers
    #[arg(long)]
    pub test_longdoubles: bool,

    /// Build and run the generated test crates in release mode
    #[arg(long)]
    pub release: bool,

    /// C compiler used for the native static library
    #[arg(long, value_name = "PATH", default_value = "clang")]
    pub cc: PathBuf,

    /// Archiver used for the native static library
    #[arg(long, value_name = "PATH", default_value = "ar")]
    pub ar: PathBuf,

    /// Build tool for the generated test crates
    #[arg(long, value_name = "PATH", default_value = "cargo")]
    pub cargo: PathBuf,

    /// Rust compiler used for library-only compiles of xfail files
    #[arg(long, value_name = "PATH", default_value = "rustc")]
    pub rustc: PathBuf,

    /// The translator binary under test
    #[arg(long, value_name = "PATH", default_value = "c2rust-transpile")]
    pub translator: PathBuf,

    /// Rust toolchain library directory the translator links against
    #[arg(long, value_name = "PATH")]
    pub rust_libdir: Option<PathBuf>,
}

impl HarnessArgs {
    pub fn keep_set(&self) -> KeepSet {
        let mut keep = KeepSet::default();
        for choice in &self.keep {
            match choice {
                KeepChoice::All => return KeepSet::all(),
                KeepChoice::CompileCommands => keep.insert(ArtifactKind::CompileCommands),
                KeepChoice::ObjectFile => keep.insert(ArtifactKind::ObjectFile),
                KeepChoice::StaticLibrary => keep.insert(ArtifactKind::StaticLibrary),
                KeepChoice::RustSource => keep.insert(ArtifactKind::RustSource),
            }
        }
        keep
    }
}
