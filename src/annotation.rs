//! First-line fixture annotations.
//!
//! A fixture may start with a line of the form
//!
//! ```text
//! //! xfail, feature_rustc_private, extern_crate_libc
//! ```
//!
//! The tokens after the marker are comma separated and whitespace trimmed. Only the
//! first line is ever considered; a file without a matching first line has no flags.

use std::collections::BTreeSet;

/// Marker that opens an annotation line.
pub const ANNOTATION_MARKER: &str = "//! ";

/// The set of flag tokens attached to a fixture file or test function.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Flags(BTreeSet<String>);

impl Flags {
    /// Parses a comma separated token list. Empty tokens are dropped.
    pub fn from_list(list: &str) -> Self {
        Flags(
            list.split(',')
                .map(str::trim)
                .filter(|token| !token.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }

    pub fn contains(&self, token: &str) -> bool {
        self.0.contains(token)
    }

    /// Names of all tokens starting with `prefix`, with the prefix stripped.
    pub fn with_prefix<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.0
            .iter()
            .filter_map(move |token| token.strip_prefix(prefix))
            .filter(|name| !name.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<'a> FromIterator<&'a str> for Flags {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        Flags(iter.into_iter().map(str::to_string).collect())
    }
}

/// Extracts the annotation flags from the first line of `text`.
pub fn parse_annotation(text: &str) -> Flags {
    text.lines()
        .next()
        .and_then(|first| first.strip_prefix(ANNOTATION_MARKER))
        .map(Flags::from_list)
        .unwrap_or_default()
}

// ============================================================================
// TRANSLATION OPTIONS
// ============================================================================

/// Per C-file translation switches.
///
/// | token | effect |
/// |---|---|
/// | `skip_translation` | file is left out of discovery |
/// | `disable_incremental_relooper` | `--no-incremental-relooper` |
/// | `disallow_current_block` | `--fail-on-multiple` |
/// | `translate_const_macros` | `--translate-const-macros` |
/// | `reorganize_definitions` | `--reorganize-definitions` |
/// | `emit_build_files` | `--emit-build-files` |
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TranslationOptions {
    pub skip_translation: bool,
    pub disable_incremental_relooper: bool,
    pub disallow_current_block: bool,
    pub translate_const_macros: bool,
    pub reorganize_definitions: bool,
    pub emit_build_files: bool,
}

impl TranslationOptions {
    pub fn from_flags(flags: &Flags) -> Self {
        Self {
            skip_translation: flags.contains("skip_translation"),
            disable_incremental_relooper: flags.contains("disable_incremental_relooper"),
            disallow_current_block: flags.contains("disallow_current_block"),
            translate_const_macros: flags.contains("translate_const_macros"),
            reorganize_definitions: flags.contains("reorganize_definitions"),
            emit_build_files: flags.contains("emit_build_files"),
        }
    }

    /// Translator flags for the enabled options, in a fixed order.
    pub fn translator_args(&self) -> Vec<&'static str> {
        [
            (self.disable_incremental_relooper, "--no-incremental-relooper"),
            (self.disallow_current_block, "--fail-on-multiple"),
            (self.translate_const_macros, "--translate-const-macros"),
            (self.reorganize_definitions, "--reorganize-definitions"),
            (self.emit_build_files, "--emit-build-files"),
        ]
        .into_iter()
        .filter_map(|(enabled, flag)| enabled.then_some(flag))
        .collect()
    }
}
