//! Generated `main.rs` for a test directory.
//!
//! The generated crate root declares every translated module and every passing
//! test file, then dispatches on its first argument:
//!
//! ```text
//! match std::env::args().nth(1).as_ref().map(AsRef::<str>::as_ref) {
//!     Some("test_arith::test_add") => test_arith::test_add(),
//!     e => panic!("Tried to run unknown test: {:?}", e),
//! }
//! ```

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::{HarnessError, HarnessResult};
use crate::fixture::{TestFile, TestFunction};

/// Crate-level features every generated crate enables.
pub const BASE_FEATURES: [&str; 8] = [
    "libc",
    "extern_types",
    "simd_ffi",
    "stdsimd",
    "const_transmute",
    "nll",
    "linkage",
    "register_tool",
];

/// Tool namespace registered for translator attributes.
pub const REGISTERED_TOOL: &str = "c2rust";

/// One arm of the dispatcher `match`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchArm {
    pub key: String,
    pub call: String,
}

/// Incrementally collects the pieces of the generated crate root.
#[derive(Debug, Clone)]
pub struct TestCrateBuilder {
    features: Vec<String>,
    registered_tools: Vec<String>,
    extern_crates: Vec<String>,
    modules: Vec<String>,
    arms: Vec<DispatchArm>,
}

impl Default for TestCrateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestCrateBuilder {
    /// Starts with the base feature set and the `c2rust` tool registration.
    pub fn new() -> Self {
        let mut builder = Self {
            features: Vec::new(),
            registered_tools: Vec::new(),
            extern_crates: Vec::new(),
            modules: Vec::new(),
            arms: Vec::new(),
        };
        builder.add_features(BASE_FEATURES);
        push_unique(&mut builder.registered_tools, REGISTERED_TOOL);
        builder
    }

    pub fn add_features<I, S>(&mut self, features: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for feature in features {
            push_unique(&mut self.features, feature.as_ref());
        }
    }

    pub fn add_extern_crates<I, S>(&mut self, crates: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for name in crates {
            push_unique(&mut self.extern_crates, name.as_ref());
        }
    }

    /// Declares `pub mod <name>;`.
    pub fn add_module(&mut self, name: &str) {
        push_unique(&mut self.modules, name);
    }

    /// Merges a test file's requirements and, if it is expected to pass,
    /// declares it and adds an arm for each of its passing functions.
    pub fn add_test_file(&mut self, file: &TestFile) {
        self.add_features(&file.features);
        self.add_extern_crates(&file.extern_crates);
        if !file.pass_expected {
            return;
        }

        let module = file.module_name();
        self.add_module(&module);
        for function in dispatched_functions(file) {
            self.arms.push(DispatchArm {
                key: file.dispatch_key(function),
                call: format!("{module}::{}()", function.name),
            });
        }
    }

    pub fn arms(&self) -> &[DispatchArm] {
        &self.arms
    }

    pub fn modules(&self) -> &[String] {
        &self.modules
    }

    /// Renders the crate root source.
    pub fn render(&self) -> String {
        let mut out = String::new();
        if !self.features.is_empty() {
            let _ = writeln!(out, "#![feature({})]", self.features.join(", "));
        }
        for tool in &self.registered_tools {
            let _ = writeln!(out, "#![register_tool({tool})]");
        }
        out.push('\n');

        for name in &self.extern_crates {
            let _ = writeln!(out, "extern crate {name};");
        }
        if !self.extern_crates.is_empty() {
            out.push('\n');
        }

        for module in &self.modules {
            let _ = writeln!(out, "pub mod {module};");
        }
        if !self.modules.is_empty() {
            out.push('\n');
        }

        out.push_str("pub fn main() {\n");
        out.push_str("    match std::env::args().nth(1).as_ref().map(AsRef::<str>::as_ref) {\n");
        for arm in &self.arms {
            let _ = writeln!(out, "        Some({:?}) => {},", arm.key, arm.call);
        }
        out.push_str("        e => panic!(\"Tried to run unknown test: {:?}\", e),\n");
        out.push_str("    }\n");
        out.push_str("}\n");
        out
    }

    /// Writes the crate root to `path`.
    pub fn write(&self, path: &Path) -> HarnessResult<PathBuf> {
        fs::write(path, self.render()).map_err(|e| HarnessError::io(path, e))?;
        Ok(path.to_path_buf())
    }
}

/// Functions of `file` that get a dispatch arm: the passing ones of a passing file.
pub fn dispatched_functions(file: &TestFile) -> impl Iterator<Item = &TestFunction> {
    file.test_functions
        .iter()
        .filter(move |function| file.pass_expected && function.pass_expected)
}

fn push_unique(list: &mut Vec<String>, item: &str) {
    if !list.iter().any(|existing| existing == item) {
        list.push(item.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_file(name: &str, text: &str) -> TestFile {
        TestFile::parse(Path::new(&format!("/t/src/{name}.rs")), text)
    }

    #[test]
    fn dispatch_table_covers_passing_functions_only() {
        let mut builder = TestCrateBuilder::new();
        builder.add_module("arith");
        builder.add_test_file(&test_file(
            "test_arith",
            "\npub fn test_add() {}\n// xfail\npub fn test_wrap() {}\n",
        ));
        builder.add_test_file(&test_file("test_skip", "//! xfail\n\npub fn test_never() {}\n"));

        assert_eq!(
            builder.arms(),
            &[DispatchArm {
                key: "test_arith::test_add".into(),
                call: "test_arith::test_add()".into(),
            }]
        );
        assert_eq!(builder.modules(), &["arith".to_string(), "test_arith".to_string()]);
    }

    #[test]
    fn passing_file_without_dispatched_functions_is_still_declared() {
        let mut builder = TestCrateBuilder::new();
        builder.add_test_file(&test_file("test_only_xfail", "\n// xfail\npub fn test_a() {}\n"));
        builder.add_test_file(&test_file("test_empty", "fn helper() {}\n"));

        assert!(builder.arms().is_empty());
        assert_eq!(
            builder.modules(),
            &["test_only_xfail".to_string(), "test_empty".to_string()]
        );
    }

    #[test]
    fn xfail_files_still_contribute_requirements() {
        let mut builder = TestCrateBuilder::new();
        builder.add_test_file(&test_file(
            "test_simd",
            "//! xfail, feature_core_intrinsics, extern_crate_libc\n\npub fn test_a() {}\n",
        ));
        let rendered = builder.render();
        assert!(rendered.contains("core_intrinsics)]"));
        assert!(rendered.contains("extern crate libc;"));
        assert!(!rendered.contains("pub mod test_simd;"));
    }

    #[test]
    fn renders_dispatcher() {
        let mut builder = TestCrateBuilder::new();
        builder.add_module("ptr");
        builder.add_test_file(&test_file("test_ptr", "\npub fn test_deref() {}\n"));

        let expected = "\
#![feature(libc, extern_types, simd_ffi, stdsimd, const_transmute, nll, linkage, register_tool)]
#![register_tool(c2rust)]

pub mod ptr;
pub mod test_ptr;

pub fn main() {
    match std::env::args().nth(1).as_ref().map(AsRef::<str>::as_ref) {
        Some(\"test_ptr::test_deref\") => test_ptr::test_deref(),
        e => panic!(\"Tried to run unknown test: {:?}\", e),
    }
}
";
        assert_eq!(builder.render(), expected);
    }

    #[test]
    fn modules_and_features_are_deduplicated() {
        let mut builder = TestCrateBuilder::new();
        builder.add_features(["nll", "box_syntax", "box_syntax"]);
        builder.add_test_file(&test_file("test_two", "\npub fn test_a() {}\npub fn test_b() {}\n"));
        assert_eq!(builder.modules(), &["test_two".to_string()]);
        assert_eq!(builder.arms().len(), 2);
        assert_eq!(builder.render().matches("box_syntax").count(), 1);
    }
}
