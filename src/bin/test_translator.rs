// Translator test runner
// Usage: test_translator <DIRECTORY> [--only-files REGEX] [--only-directories REGEX] [--keep KIND]...

fn main() {
    transpile_harness::cli::run();
}
