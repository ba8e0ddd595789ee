//! The test runner command-line interface.
//!
//! Parses arguments, checks preconditions, then runs every selected test
//! directory one after another and prints the outcome summary.

use std::fs;
use std::path::Path;
use std::process;

use clap::Parser;
use regex::Regex;
use termcolor::WriteColor;

use crate::directory::{select_test_directories, DirectoryFilter, RunConfig, TestDirectory};
use crate::errors::{HarnessError, HarnessResult};
use crate::interrupt::{self, INTERRUPTED_EXIT_CODE};
use crate::logging::init_logging;
use crate::outcome::{OutcomeTally, TestOutcome};
use crate::report::{StatusReporter, StatusTier};
use crate::toolchain::{BuildProfile, Toolchain};

pub mod args;

pub use args::HarnessArgs;

/// Exit status for precondition failures.
pub const PRECONDITION_EXIT_CODE: i32 = 2;

// ============================================================================
// MAIN ENTRY POINT
// ============================================================================

/// Entry point of the `test_translator` binary.
pub fn run() {
    let args = HarnessArgs::parse();
    init_logging(args.log_level);
    tracing::debug!("args: {}", std::env::args().collect::<Vec<_>>().join(" "));
    interrupt::install_handler();

    let mut reporter = StatusReporter::stdout();
    match run_with_args(&args, &mut reporter) {
        Ok(tally) => {
            if interrupt::interrupted() {
                process::exit(INTERRUPTED_EXIT_CODE);
            }
            process::exit(tally.exit_code());
        }
        Err(e) => {
            eprintln!("{:?}", miette::Report::new(e));
            process::exit(PRECONDITION_EXIT_CODE);
        }
    }
}

/// Runs the selected directories and prints the summary.
///
/// Errors are precondition failures; everything after the preconditions is
/// folded into the returned tally.
pub fn run_with_args<W: WriteColor>(
    args: &HarnessArgs,
    reporter: &mut StatusReporter<W>,
) -> HarnessResult<OutcomeTally> {
    readable_directory(&args.directory)?;
    let files = Regex::new(&args.only_files).map_err(|source| HarnessError::InvalidPattern {
        pattern: args.only_files.clone(),
        source,
    })?;
    let filter = DirectoryFilter::new(&args.only_directories, args.test_longdoubles)?;

    let profile = if args.release {
        BuildProfile::Release
    } else {
        BuildProfile::Debug
    };
    let toolchain = Toolchain::resolve(&args.cc, &args.ar, &args.cargo, &args.rustc, &args.translator)?
        .with_profile(profile)
        .with_rust_lib_dir(args.rust_libdir.clone());

    let directories = select_test_directories(&args.directory, &filter)?;
    if directories.is_empty() {
        return Err(HarnessError::NothingToTest);
    }

    let config = RunConfig {
        toolchain,
        files,
        keep: args.keep_set(),
        log_level: args.log_level,
    };

    let mut tally = OutcomeTally::new();
    for path in &directories {
        if interrupt::interrupted() {
            break;
        }
        tally.extend(run_directory(path, &config, reporter));
    }

    reporter.summary(&tally);
    Ok(tally)
}

/// Runs one directory; its generated files are removed before returning.
fn run_directory<W: WriteColor>(
    path: &Path,
    config: &RunConfig,
    reporter: &mut StatusReporter<W>,
) -> Vec<TestOutcome> {
    let mut directory = match TestDirectory::discover(path, config) {
        Ok(directory) => directory,
        Err(e) => {
            let name = crate::fixture::file_name(path);
            reporter.header(&name);
            reporter.status_line(StatusTier::Fail, "FAILED", &format!("discover {name}"));
            reporter.diagnostics(&e.diagnostic_text());
            return vec![TestOutcome::UnexpectedFailure];
        }
    };
    let outcomes = directory.run(reporter);
    directory.cleanup();
    outcomes
}

/// Checks that `directory` exists and can be listed.
fn readable_directory(directory: &Path) -> HarnessResult<()> {
    if !directory.is_dir() {
        return Err(HarnessError::InvalidDirectory {
            path: directory.to_path_buf(),
            reason: "is not a valid path".to_string(),
        });
    }
    fs::read_dir(directory).map_err(|_| HarnessError::InvalidDirectory {
        path: directory.to_path_buf(),
        reason: "cannot be read".to_string(),
    })?;
    Ok(())
}
