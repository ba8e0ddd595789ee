//! Operator-facing status lines and the final summary.
//!
//! Status lines overwrite the current terminal line, so a running step is
//! replaced by its result. Colors carry no meaning beyond presentation.

use std::io::{self, Write};

use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use crate::outcome::OutcomeTally;

/// Color tier of a status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusTier {
    /// A step in progress or a warning.
    Running,
    Ok,
    /// Neutral information, including expected failures.
    Info,
    Fail,
}

impl StatusTier {
    fn color(self) -> Color {
        match self {
            StatusTier::Running => Color::Yellow,
            StatusTier::Ok => Color::Green,
            StatusTier::Info => Color::Blue,
            StatusTier::Fail => Color::Red,
        }
    }
}

/// Writes status lines to a color-capable stream.
pub struct StatusReporter<W: WriteColor> {
    out: W,
    overwrite: bool,
}

impl StatusReporter<StandardStream> {
    /// Reporter on stdout; colors and line rewriting only on a terminal.
    pub fn stdout() -> Self {
        let tty = atty::is(atty::Stream::Stdout);
        let choice = if tty { ColorChoice::Auto } else { ColorChoice::Never };
        Self::new(StandardStream::stdout(choice), tty)
    }
}

impl<W: WriteColor> StatusReporter<W> {
    pub fn new(out: W, overwrite: bool) -> Self {
        Self { out, overwrite }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Prints the directory name on its own line.
    pub fn header(&mut self, name: &str) {
        let _ = writeln!(self.out, "{name}:");
        let _ = self.out.flush();
    }

    /// Replaces the current line with `[ label ] message`.
    pub fn status(&mut self, tier: StatusTier, label: &str, message: &str) {
        let _ = self.write_status(tier, label, message);
    }

    /// Like [`status`](Self::status), but ends the line.
    pub fn status_line(&mut self, tier: StatusTier, label: &str, message: &str) {
        self.status(tier, label, message);
        self.newline();
    }

    fn write_status(&mut self, tier: StatusTier, label: &str, message: &str) -> io::Result<()> {
        if self.overwrite {
            write!(self.out, "\r\x1b[K")?;
        }
        self.out.set_color(ColorSpec::new().set_fg(Some(tier.color())))?;
        write!(self.out, " [ {label} ] ")?;
        self.out.reset()?;
        write!(self.out, "{message}")?;
        self.out.flush()
    }

    pub fn newline(&mut self) {
        let _ = writeln!(self.out);
    }

    /// Echoes tool diagnostics verbatim.
    pub fn diagnostics(&mut self, text: &str) {
        let _ = write!(self.out, "{text}");
        if !text.is_empty() && !text.ends_with('\n') {
            let _ = writeln!(self.out);
        }
        let _ = self.out.flush();
    }

    /// Prints the outcome table.
    pub fn summary(&mut self, tally: &OutcomeTally) {
        let _ = writeln!(self.out, "\nTest summary:");
        for (outcome, count) in tally.rows() {
            let _ = writeln!(self.out, "  {outcome}: {count}");
        }
        let _ = self.out.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::TestOutcome;
    use termcolor::Buffer;

    fn text(reporter: StatusReporter<Buffer>) -> String {
        String::from_utf8(reporter.into_inner().into_inner()).unwrap()
    }

    #[test]
    fn status_lines_without_terminal() {
        let mut reporter = StatusReporter::new(Buffer::no_color(), false);
        reporter.header("ptr");
        reporter.status(StatusTier::Running, "RUNNING", "libtest.a: creating a static C library...");
        reporter.status_line(StatusTier::Ok, "OK", "    test test_ptr.rs - test_deref");
        assert_eq!(
            text(reporter),
            "ptr:\n [ RUNNING ] libtest.a: creating a static C library... [ OK ]     test test_ptr.rs - test_deref\n"
        );
    }

    #[test]
    fn overwrite_clears_current_line() {
        let mut reporter = StatusReporter::new(Buffer::no_color(), true);
        reporter.status(StatusTier::Fail, "FAILED", "create libtest.a");
        assert_eq!(text(reporter), "\r\x1b[K [ FAILED ] create libtest.a");
    }

    #[test]
    fn summary_lists_every_kind() {
        let mut reporter = StatusReporter::new(Buffer::no_color(), false);
        reporter.summary(&[TestOutcome::Success].into_iter().collect());
        assert_eq!(
            text(reporter),
            "\nTest summary:\n  unexpected failures: 0\n  unexpected successes: 0\n  expected failures: 0\n  successes: 1\n"
        );
    }

    #[test]
    fn diagnostics_end_with_newline() {
        let mut reporter = StatusReporter::new(Buffer::no_color(), false);
        reporter.diagnostics("error: expected `;`");
        assert_eq!(text(reporter), "error: expected `;`\n");
    }
}
