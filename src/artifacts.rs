//! Generated files of a test directory.
//!
//! Everything the pipeline writes is registered here under one of four categories
//! so the cleanup phase can remove it. The registry is owned by the directory
//! orchestrator; the builder and assembly stages only append to it.

use std::fs;
use std::path::{Path, PathBuf};

/// Category of an intermediate file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ArtifactKind {
    /// `compile_commands_*.json` handed to the translator.
    CompileCommands,
    /// `.o` files from the native compiler.
    ObjectFile,
    /// `libtest.a`.
    StaticLibrary,
    /// Translated `.rs` files, the generated `main.rs` and translator build files.
    RustSource,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 4] = [
        ArtifactKind::RustSource,
        ArtifactKind::ObjectFile,
        ArtifactKind::StaticLibrary,
        ArtifactKind::CompileCommands,
    ];
}

/// Anything backed by a file on disk.
pub trait Artifact {
    fn path(&self) -> &Path;
}

impl Artifact for PathBuf {
    fn path(&self) -> &Path {
        self
    }
}

impl Artifact for &Path {
    fn path(&self) -> &Path {
        self
    }
}

/// Which categories the operator asked to keep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeepSet {
    all: bool,
    kinds: Vec<ArtifactKind>,
}

impl KeepSet {
    pub fn all() -> Self {
        Self {
            all: true,
            kinds: Vec::new(),
        }
    }

    pub fn kinds(kinds: impl IntoIterator<Item = ArtifactKind>) -> Self {
        let mut keep = Self::default();
        for kind in kinds {
            keep.insert(kind);
        }
        keep
    }

    pub fn insert(&mut self, kind: ArtifactKind) {
        if !self.kinds.contains(&kind) {
            self.kinds.push(kind);
        }
    }

    pub fn keeps(&self, kind: ArtifactKind) -> bool {
        self.all || self.kinds.contains(&kind)
    }

    pub fn keeps_everything(&self) -> bool {
        self.all || ArtifactKind::ALL.iter().all(|kind| self.kinds.contains(kind))
    }
}

/// Per-directory registry of generated files, one ordered list per category.
#[derive(Debug, Default)]
pub struct GeneratedFiles {
    rust_src: Vec<PathBuf>,
    c_obj: Vec<PathBuf>,
    c_lib: Vec<PathBuf>,
    cc_db: Vec<PathBuf>,
}

impl GeneratedFiles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, kind: ArtifactKind, artifact: impl Artifact) {
        let path = artifact.path().to_path_buf();
        let list = self.list_mut(kind);
        if !list.contains(&path) {
            list.push(path);
        }
    }

    pub fn extend<A: Artifact>(&mut self, kind: ArtifactKind, artifacts: impl IntoIterator<Item = A>) {
        for artifact in artifacts {
            self.push(kind, artifact);
        }
    }

    pub fn get(&self, kind: ArtifactKind) -> &[PathBuf] {
        match kind {
            ArtifactKind::RustSource => &self.rust_src,
            ArtifactKind::ObjectFile => &self.c_obj,
            ArtifactKind::StaticLibrary => &self.c_lib,
            ArtifactKind::CompileCommands => &self.cc_db,
        }
    }

    fn list_mut(&mut self, kind: ArtifactKind) -> &mut Vec<PathBuf> {
        match kind {
            ArtifactKind::RustSource => &mut self.rust_src,
            ArtifactKind::ObjectFile => &mut self.c_obj,
            ArtifactKind::StaticLibrary => &mut self.c_lib,
            ArtifactKind::CompileCommands => &mut self.cc_db,
        }
    }

    pub fn is_empty(&self) -> bool {
        ArtifactKind::ALL.iter().all(|kind| self.get(*kind).is_empty())
    }

    /// Removes every registered file whose category is not kept.
    ///
    /// Files that are already gone are ignored.
    pub fn remove_unkept(&self, keep: &KeepSet) {
        if keep.keeps_everything() {
            return;
        }
        for kind in ArtifactKind::ALL {
            if keep.keeps(kind) {
                continue;
            }
            for path in self.get(kind) {
                match fs::remove_file(path) {
                    Ok(()) => tracing::debug!("removed {}", path.display()),
                    Err(e) => tracing::debug!("could not remove {}: {e}", path.display()),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, "").unwrap();
        path
    }

    #[test]
    fn cleanup_respects_kept_categories() {
        let dir = tempfile::tempdir().unwrap();
        let rs = touch(dir.path(), "a.rs");
        let obj = touch(dir.path(), "a.o");
        let lib = touch(dir.path(), "libtest.a");
        let db = touch(dir.path(), "compile_commands_a.json");

        let mut files = GeneratedFiles::new();
        files.push(ArtifactKind::RustSource, rs.clone());
        files.push(ArtifactKind::ObjectFile, obj.clone());
        files.push(ArtifactKind::StaticLibrary, lib.clone());
        files.push(ArtifactKind::CompileCommands, db.clone());

        files.remove_unkept(&KeepSet::kinds([ArtifactKind::StaticLibrary]));

        assert!(!rs.exists());
        assert!(!obj.exists());
        assert!(lib.exists());
        assert!(!db.exists());
    }

    #[test]
    fn keep_all_leaves_everything() {
        let dir = tempfile::tempdir().unwrap();
        let rs = touch(dir.path(), "a.rs");
        let mut files = GeneratedFiles::new();
        files.push(ArtifactKind::RustSource, rs.clone());

        files.remove_unkept(&KeepSet::all());
        assert!(rs.exists());
    }

    #[test]
    fn missing_files_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let mut files = GeneratedFiles::new();
        files.push(ArtifactKind::ObjectFile, dir.path().join("never_built.o"));
        files.remove_unkept(&KeepSet::default());
    }

    #[test]
    fn registrations_are_ordered_and_unique() {
        let mut files = GeneratedFiles::new();
        files.extend(
            ArtifactKind::RustSource,
            [PathBuf::from("b.rs"), PathBuf::from("a.rs"), PathBuf::from("b.rs")],
        );
        assert_eq!(
            files.get(ArtifactKind::RustSource),
            &[PathBuf::from("b.rs"), PathBuf::from("a.rs")]
        );
        assert!(files.get(ArtifactKind::CompileCommands).is_empty());
    }
}
