//! Shared fixtures for the integration suites.
//!
//! Every external tool is replaced by a small shell script so the pipeline can be
//! driven end to end without a C compiler, a Rust toolchain or the translator:
//!
//! - `cc` writes `<stem>.o` into its working directory and fails on sources containing `BROKEN`
//! - `ar` touches the archive it is asked to create, then fails when `src/BREAK_ARCHIVE` exists
//! - `translator` writes `<stem>.rs` next to the C file and fails on `UNTRANSLATABLE`
//! - `cargo build` fails when `src/BREAK_BUILD` exists; `cargo run -- KEY` fails when KEY contains `fail`
//! - `rustc` fails on files containing `COMPILE_ERROR`
//!
//! `cargo` appends each invocation to `cargo.log` in the test directory.

#![allow(dead_code)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

const CC: &str = r#"#!/bin/sh
for arg in "$@"; do
  case "$arg" in
    *.c)
      if grep -q BROKEN "$arg"; then
        echo "$arg: error: expected ';'" >&2
        exit 1
      fi
      ;;
  esac
done
for arg in "$@"; do
  case "$arg" in
    *.c) : > "$(basename "$arg" .c).o" ;;
  esac
done
"#;

const AR: &str = r#"#!/bin/sh
: > "$2"
if [ -f src/BREAK_ARCHIVE ]; then
  echo "ar: $2: malformed archive" >&2
  exit 1
fi
"#;

const TRANSLATOR: &str = r#"#!/bin/sh
db="$1"
dir=$(dirname "$db")
name=$(basename "$db" .json)
stem=${name#compile_commands_}
if grep -q UNTRANSLATABLE "$dir/$stem.c"; then
  echo "translator: unsupported construct in $stem.c" >&2
  exit 1
fi
echo "// translated from $stem.c" > "$dir/$stem.rs"
for arg in "$@"; do
  if [ "$arg" = "--emit-build-files" ]; then
    for f in Cargo.toml build.rs c2rust-lib.rs rust-toolchain; do
      : > "$dir/$f"
    done
  fi
done
"#;

const CARGO: &str = r#"#!/bin/sh
echo "$*" >> cargo.log
case "$1" in
  build)
    if [ -f src/BREAK_BUILD ]; then
      echo "error[E0425]: cannot find function" >&2
      exit 101
    fi
    ;;
  run)
    for key in "$@"; do :; done
    case "$key" in
      *fail*)
        echo "thread 'main' panicked at $key" >&2
        exit 101
        ;;
    esac
    ;;
esac
"#;

const RUSTC: &str = r#"#!/bin/sh
for file in "$@"; do :; done
if grep -q COMPILE_ERROR "$file"; then
  echo "error: expected item" >&2
  exit 1
fi
"#;

/// Paths of the stand-in tools.
pub struct Tools {
    pub cc: PathBuf,
    pub ar: PathBuf,
    pub cargo: PathBuf,
    pub rustc: PathBuf,
    pub translator: PathBuf,
}

/// A scratch area holding the stand-in tools and a root of test directories.
pub struct Workspace {
    _temp: TempDir,
    pub root: PathBuf,
    pub tools: Tools,
}

impl Workspace {
    pub fn new() -> Self {
        let temp = tempfile::tempdir().unwrap();
        let bin = temp.path().join("bin");
        fs::create_dir(&bin).unwrap();
        let tools = Tools {
            cc: script(&bin, "cc", CC),
            ar: script(&bin, "ar", AR),
            cargo: script(&bin, "cargo", CARGO),
            rustc: script(&bin, "rustc", RUSTC),
            translator: script(&bin, "c2rust-transpile", TRANSLATOR),
        };
        let root = temp.path().join("tests");
        fs::create_dir(&root).unwrap();
        Self {
            _temp: temp,
            root,
            tools,
        }
    }

    /// Creates `<root>/<name>/src`.
    pub fn dir(&self, name: &str) -> Fixture {
        let path = self.root.join(name);
        fs::create_dir_all(path.join("src")).unwrap();
        fs::write(path.join("Cargo.toml"), format!("[package]\nname = \"{name}\"\n")).unwrap();
        Fixture { path }
    }

    /// Command-line arguments pointing every tool at its stand-in.
    pub fn args(&self, extra: &[&str]) -> Vec<String> {
        let mut args = vec!["test_translator".to_string(), self.root.display().to_string()];
        for (flag, path) in [
            ("--cc", &self.tools.cc),
            ("--ar", &self.tools.ar),
            ("--cargo", &self.tools.cargo),
            ("--rustc", &self.tools.rustc),
            ("--translator", &self.tools.translator),
        ] {
            args.push(flag.to_string());
            args.push(path.display().to_string());
        }
        args.extend(extra.iter().map(|arg| arg.to_string()));
        args
    }
}

/// One test directory inside a [`Workspace`].
pub struct Fixture {
    pub path: PathBuf,
}

impl Fixture {
    pub fn src(&self, name: &str) -> PathBuf {
        self.path.join("src").join(name)
    }

    pub fn file(&self, name: &str, contents: &str) -> &Self {
        fs::write(self.src(name), contents).unwrap();
        self
    }

    pub fn exists(&self, name: &str) -> bool {
        self.src(name).exists()
    }

    pub fn top_exists(&self, name: &str) -> bool {
        self.path.join(name).exists()
    }

    /// Every line `cargo` was invoked with, in order.
    pub fn cargo_log(&self) -> Vec<String> {
        fs::read_to_string(self.path.join("cargo.log"))
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }
}

fn script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, body).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}
