//! Fixture file models.
//!
//! A test directory holds two kinds of fixtures under `src/`:
//! C sources that are compiled natively and translated, and Rust test files
//! (`test_*.rs`) whose `pub fn test_*()` functions exercise the translated code.

use std::fs;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::annotation::{parse_annotation, Flags, TranslationOptions};
use crate::errors::{HarnessError, HarnessResult};
use crate::logging::LogLevel;

/// File-name prefix shared by test files and test functions.
pub const TEST_PREFIX: &str = "test_";

const XFAIL: &str = "xfail";
const EXTERN_CRATE_PREFIX: &str = "extern_crate_";
const FEATURE_PREFIX: &str = "feature_";

/// A `pub fn test_*()` definition, optionally preceded by a `// flags` comment line.
static TEST_FUNCTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?://(.*))?\n\s*pub fn (test_\w+)\(\)").expect("test function pattern is valid")
});

// ============================================================================
// C SOURCES
// ============================================================================

/// A C source file destined for the static library and the translator.
#[derive(Debug, Clone, PartialEq)]
pub struct NativeSource {
    pub path: PathBuf,
    pub options: TranslationOptions,
    pub log_level: LogLevel,
}

impl NativeSource {
    pub fn new(path: impl Into<PathBuf>, flags: &Flags, log_level: LogLevel) -> Self {
        Self {
            path: path.into(),
            options: TranslationOptions::from_flags(flags),
            log_level,
        }
    }

    /// Reads a C file. Returns `None` when it is annotated `skip_translation`.
    pub fn read(path: &Path, log_level: LogLevel) -> HarnessResult<Option<Self>> {
        let text = fs::read_to_string(path).map_err(|e| HarnessError::io(path, e))?;
        let source = Self::new(path, &parse_annotation(&text), log_level);
        if source.options.skip_translation {
            tracing::debug!("skipping translation of {}", path.display());
            return Ok(None);
        }
        Ok(Some(source))
    }

    /// File stem, e.g. `arith` for `src/arith.c`.
    pub fn stem(&self) -> String {
        file_stem(&self.path)
    }

    pub fn file_name(&self) -> String {
        file_name(&self.path)
    }

    /// Path of the Rust file the translator writes for this source.
    pub fn translated_path(&self) -> PathBuf {
        self.path.with_extension("rs")
    }
}

// ============================================================================
// RUST TEST FILES
// ============================================================================

/// A single test entry point inside a test file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestFunction {
    pub name: String,
    pub pass_expected: bool,
}

impl TestFunction {
    pub fn new(name: impl Into<String>, flags: &Flags) -> Self {
        Self {
            name: name.into(),
            pass_expected: !flags.contains(XFAIL),
        }
    }
}

/// A hand-written Rust test file (`src/test_*.rs`).
#[derive(Debug, Clone, PartialEq)]
pub struct TestFile {
    pub path: PathBuf,
    pub flags: Flags,
    /// `extern_crate_<name>` tokens, marker stripped.
    pub extern_crates: Vec<String>,
    /// `feature_<name>` tokens, marker stripped.
    pub features: Vec<String>,
    /// False when the file as a whole is annotated `xfail`.
    pub pass_expected: bool,
    pub test_functions: Vec<TestFunction>,
}

impl TestFile {
    pub fn new(path: impl Into<PathBuf>, flags: Flags, test_functions: Vec<TestFunction>) -> Self {
        Self {
            path: path.into(),
            extern_crates: flags.with_prefix(EXTERN_CRATE_PREFIX).map(str::to_string).collect(),
            features: flags.with_prefix(FEATURE_PREFIX).map(str::to_string).collect(),
            pass_expected: !flags.contains(XFAIL),
            flags,
            test_functions,
        }
    }

    pub fn read(path: &Path) -> HarnessResult<Self> {
        let text = fs::read_to_string(path).map_err(|e| HarnessError::io(path, e))?;
        Ok(Self::parse(path, &text))
    }

    /// Builds the model from file contents.
    pub fn parse(path: &Path, text: &str) -> Self {
        Self::new(path, parse_annotation(text), find_test_functions(text))
    }

    /// Module name of the file inside the generated crate.
    pub fn module_name(&self) -> String {
        file_stem(&self.path)
    }

    pub fn file_name(&self) -> String {
        file_name(&self.path)
    }

    /// Dispatch key selecting `function` in the test binary.
    pub fn dispatch_key(&self, function: &TestFunction) -> String {
        format!("{}::{}", self.module_name(), function.name)
    }
}

/// Finds every `pub fn test_*()` in `text`, with the flags of the comment on the line above.
pub fn find_test_functions(text: &str) -> Vec<TestFunction> {
    TEST_FUNCTION
        .captures_iter(text)
        .map(|caps| {
            let flags = caps
                .get(1)
                .map(|config| Flags::from_list(config.as_str()))
                .unwrap_or_default();
            TestFunction::new(&caps[2], &flags)
        })
        .collect()
}

/// True when `path` names a Rust test file: `test_` prefix and `.rs` extension.
pub fn is_test_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "rs") && file_stem(path).starts_with(TEST_PREFIX)
}

/// True when `path` names a C source.
pub fn is_native_source(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "c")
}

pub(crate) fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

pub(crate) fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}
