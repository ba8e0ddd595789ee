//! Native build and translation of a directory's C sources.
//!
//! Two steps run in order for each test directory:
//! 1. **Static library**: all C files are compiled in one compiler call and archived
//!    into `libtest.a`. Failure here invalidates the whole directory.
//! 2. **Translation**: each C file gets its own compilation database and translator
//!    run. Failure here only affects that file.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use serde::Serialize;

use crate::artifacts::{Artifact, ArtifactKind, GeneratedFiles};
use crate::errors::{HarnessError, HarnessResult};
use crate::fixture::NativeSource;
use crate::invoke::ToolCommand;
use crate::toolchain::Toolchain;

/// Name of the archive built in every test directory.
pub const STATIC_LIBRARY_NAME: &str = "libtest.a";

/// Files the translator writes next to the sources when asked for build files.
const TRANSLATOR_BUILD_FILES: [&str; 4] = ["Cargo.toml", "build.rs", "c2rust-lib.rs", "rust-toolchain"];

// ============================================================================
// WORKING DIRECTORY SCOPE
// ============================================================================

static CWD_LOCK: Mutex<()> = Mutex::new(());

/// Changes the process working directory for its lifetime.
///
/// The previous directory is restored on drop, including on early returns and
/// unwinding. A process-wide lock keeps two scopes from interleaving.
pub struct WorkingDirScope {
    previous: PathBuf,
    _lock: MutexGuard<'static, ()>,
}

impl WorkingDirScope {
    pub fn enter(dir: &Path) -> HarnessResult<Self> {
        let lock = CWD_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let previous = env::current_dir().map_err(|e| HarnessError::io(".", e))?;
        env::set_current_dir(dir).map_err(|e| HarnessError::io(dir, e))?;
        Ok(Self {
            previous,
            _lock: lock,
        })
    }
}

impl Drop for WorkingDirScope {
    fn drop(&mut self) {
        if let Err(e) = env::set_current_dir(&self.previous) {
            tracing::error!(
                "failed to restore working directory {}: {e}",
                self.previous.display()
            );
        }
    }
}

// ============================================================================
// STATIC LIBRARY
// ============================================================================

/// The archive of all native objects of a directory.
#[derive(Debug, Clone, PartialEq)]
pub struct StaticLibrary {
    pub path: PathBuf,
    /// Name passed to the linker, `test` for `libtest.a`.
    pub link_name: String,
    pub object_files: Vec<PathBuf>,
}

impl Artifact for StaticLibrary {
    fn path(&self) -> &Path {
        &self.path
    }
}

/// Compiles `sources` into objects inside `output_dir` and archives them.
///
/// Returns `Ok(None)` when there is nothing to build. Objects are registered in
/// `generated` as soon as they exist, and so is the archive, even when the archiver
/// fails after creating it.
pub fn build_static_library(
    sources: &[NativeSource],
    output_dir: &Path,
    toolchain: &Toolchain,
    generated: &mut GeneratedFiles,
) -> HarnessResult<Option<StaticLibrary>> {
    if sources.is_empty() {
        return Ok(None);
    }

    let _scope = WorkingDirScope::enter(output_dir)?;

    let object_files: Vec<PathBuf> = sources
        .iter()
        .map(|source| output_dir.join(format!("{}.o", source.stem())))
        .collect();

    let compiled = ToolCommand::new(&toolchain.cc)
        .args(["-c", "-fPIC", "-march=native"])
        .args(sources.iter().map(|source| &source.path))
        .current_dir(output_dir)
        .run();
    generated.extend(
        ArtifactKind::ObjectFile,
        object_files.iter().filter(|path| path.exists()).map(PathBuf::as_path),
    );
    compiled?;

    let library_path = output_dir.join(STATIC_LIBRARY_NAME);
    let archived = ToolCommand::new(&toolchain.ar)
        .args(["-rv", STATIC_LIBRARY_NAME])
        .args(&object_files)
        .current_dir(output_dir)
        .run();
    if library_path.exists() {
        generated.push(ArtifactKind::StaticLibrary, library_path.clone());
    }
    archived?;

    Ok(Some(StaticLibrary {
        path: library_path,
        link_name: "test".to_string(),
        object_files,
    }))
}

// ============================================================================
// COMPILATION DATABASE
// ============================================================================

#[derive(Debug, Serialize)]
struct CompileCommand {
    arguments: Vec<String>,
    directory: String,
    file: String,
}

/// Path of the compilation database written for `source`.
pub fn compile_commands_path(source: &NativeSource) -> PathBuf {
    let dir = source.path.parent().unwrap_or_else(|| Path::new("."));
    dir.join(format!("compile_commands_{}.json", source.stem()))
}

/// Renders the single-entry compilation database for `source`.
pub fn render_compile_commands(source: &NativeSource) -> HarnessResult<String> {
    let directory = source
        .path
        .parent()
        .map(|dir| dir.display().to_string())
        .unwrap_or_default();
    let file = source.file_name();
    let entries = [CompileCommand {
        arguments: vec![
            "cc".to_string(),
            "-D_FORTIFY_SOURCE=0".to_string(),
            "-c".to_string(),
            file.clone(),
        ],
        directory,
        file,
    }];
    serde_json::to_string_pretty(&entries)
        .map_err(|e| HarnessError::io(&source.path, std::io::Error::other(e)))
}

/// Writes the compilation database for `source` and registers it.
pub fn write_compile_commands(
    source: &NativeSource,
    generated: &mut GeneratedFiles,
) -> HarnessResult<PathBuf> {
    let path = compile_commands_path(source);
    let contents = render_compile_commands(source)?;
    fs::write(&path, contents).map_err(|e| HarnessError::io(&path, e))?;
    generated.push(ArtifactKind::CompileCommands, path.clone());
    Ok(path)
}

// ============================================================================
// TRANSLATION
// ============================================================================

/// A Rust file produced by the translator.
#[derive(Debug, Clone, PartialEq)]
pub struct TranslatedFile {
    pub path: PathBuf,
}

impl TranslatedFile {
    pub fn module_name(&self) -> String {
        crate::fixture::file_stem(&self.path)
    }
}

impl Artifact for TranslatedFile {
    fn path(&self) -> &Path {
        &self.path
    }
}

/// Translator command line for `source` against the database at `cc_db`.
pub fn translator_command(
    source: &NativeSource,
    cc_db: &Path,
    toolchain: &Toolchain,
    extra_args: &[&str],
) -> ToolCommand {
    let mut command = ToolCommand::new(&toolchain.translator)
        .arg(cc_db)
        .args(["--prefix-function-names", "rust_", "--overwrite-existing"])
        .args(source.options.translator_args());
    if source.log_level.is_debug() {
        command = command.arg("--log-level=debug");
    }
    command = command.arg("--").args(extra_args).env("RUST_BACKTRACE", "1");
    if let Some(library_path) = toolchain.translator_library_path() {
        command = command.env("LD_LIBRARY_PATH", library_path);
    }
    command
}

/// Translates one C file. Registers its database and, on success, its Rust output.
pub fn translate(
    source: &NativeSource,
    toolchain: &Toolchain,
    extra_args: &[&str],
    generated: &mut GeneratedFiles,
) -> HarnessResult<TranslatedFile> {
    let cc_db = write_compile_commands(source, generated)?;
    translator_command(source, &cc_db, toolchain, extra_args).run()?;

    let translated = TranslatedFile {
        path: source.translated_path(),
    };
    generated.push(ArtifactKind::RustSource, translated.path.clone());
    if source.options.emit_build_files {
        if let Some(src_dir) = source.path.parent() {
            generated.extend(
                ArtifactKind::RustSource,
                TRANSLATOR_BUILD_FILES.iter().map(|name| src_dir.join(name)),
            );
        }
    }
    Ok(translated)
}
