//! Colored terminal output for command results.
//!
//! Progress of the bundlers themselves goes through `log`; this is for what
//! the user asked to see: bundler and parameter listings and the artifacts
//! produced.

use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};
use std::io::{self, IsTerminal, Write};

/// Writes styled messages to stdout, warnings and errors to stderr.
#[derive(Debug, Clone)]
pub struct OutputManager {
    verbose: bool,
    quiet: bool,
    stdout_color: ColorChoice,
    stderr_color: ColorChoice,
}

impl OutputManager {
    /// Creates a manager; color is only used on terminals.
    pub fn new(verbose: bool, quiet: bool) -> Self {
        let choice = |terminal: bool| {
            if terminal {
                ColorChoice::Auto
            } else {
                ColorChoice::Never
            }
        };
        Self {
            verbose,
            quiet,
            stdout_color: choice(io::stdout().is_terminal()),
            stderr_color: choice(io::stderr().is_terminal()),
        }
    }

    /// Whether verbose output was requested.
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Plain line on stdout.
    pub fn info(&self, message: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        let mut out = StandardStream::stdout(self.stdout_color);
        writeln!(out, "{message}")
    }

    /// Line shown only in verbose mode.
    pub fn verbose(&self, message: &str) -> io::Result<()> {
        if !self.verbose || self.quiet {
            return Ok(());
        }
        self.styled(false, None, false, "", message)
    }

    /// Green check mark line.
    pub fn success(&self, message: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        self.styled(false, Some(Color::Green), false, "✓ ", message)
    }

    /// Cyan progress line.
    pub fn progress(&self, message: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        self.styled(false, Some(Color::Cyan), false, "→ ", message)
    }

    /// Bold section title.
    pub fn section(&self, title: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        self.styled(false, None, true, "", title)
    }

    /// Indented detail line.
    pub fn indent(&self, message: &str) -> io::Result<()> {
        self.info(&format!("    {message}"))
    }

    /// Yellow warning on stderr.
    pub fn warn(&self, message: &str) -> io::Result<()> {
        self.styled(true, Some(Color::Yellow), true, "warning: ", message)
    }

    /// Red error on stderr, never suppressed.
    pub fn error(&self, message: &str) -> io::Result<()> {
        self.styled(true, Some(Color::Red), true, "error: ", message)
    }

    fn styled(
        &self,
        stderr: bool,
        color: Option<Color>,
        bold: bool,
        prefix: &str,
        message: &str,
    ) -> io::Result<()> {
        let mut stream = if stderr {
            StandardStream::stderr(self.stderr_color)
        } else {
            StandardStream::stdout(self.stdout_color)
        };
        stream.set_color(ColorSpec::new().set_fg(color).set_bold(bold))?;
        write!(stream, "{prefix}{message}")?;
        stream.reset()?;
        writeln!(stream)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiet_manager_suppresses_stdout_lines() {
        let output = OutputManager::new(true, true);
        assert!(output.is_verbose());
        output.info("hidden").unwrap();
        output.verbose("hidden").unwrap();
        output.success("hidden").unwrap();
        output.section("hidden").unwrap();
    }

    #[test]
    fn plain_manager_writes_without_color_outside_a_terminal() {
        let output = OutputManager::new(false, false);
        assert!(!output.is_verbose());
        output.progress("working").unwrap();
        output.warn("careful").unwrap();
    }
}
