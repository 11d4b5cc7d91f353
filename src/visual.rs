//! Console narration for the readiness wait
use colored::*;
use std::io::{self, Write};

/// Writes the readiness progress lines. Production narration goes to stdout
/// in colour; any other writer gets plain lines.
pub struct ReadinessVisual<W: Write> {
    out: W,
    color: bool,
}

impl ReadinessVisual<io::Stdout> {
    pub fn stdout() -> Self {
        Self {
            out: io::stdout(),
            color: true,
        }
    }
}

impl<W: Write> ReadinessVisual<W> {
    pub fn plain(out: W) -> Self {
        Self { out, color: false }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn waiting(&mut self, host: &str) {
        self.emit(&waiting_line(host), |s| s.bright_cyan());
    }

    pub fn not_ready(&mut self, attempt: u32, max_attempts: u32) {
        self.emit(&not_ready_line(attempt, max_attempts), |s| s.yellow());
    }

    pub fn ready(&mut self) {
        self.emit("Database is ready!", |s| s.bright_green());
    }

    pub fn exhausted(&mut self, max_attempts: u32) {
        self.emit(&exhausted_line(max_attempts), |s| s.red());
    }

    pub fn never_ready(&mut self) {
        self.emit("ERROR: Database never became ready!", |s| s.bright_red());
    }

    /// Narration is best effort; a failed write never affects the wait
    fn emit(&mut self, line: &str, paint: fn(&str) -> ColoredString) {
        let written = if self.color {
            writeln!(self.out, "{}", paint(line))
        } else {
            writeln!(self.out, "{line}")
        };
        if let Err(e) = written.and_then(|()| self.out.flush()) {
            tracing::debug!(error = %e, "failed to write readiness narration");
        }
    }
}

fn waiting_line(host: &str) -> String {
    format!("Waiting for database at {host}...")
}

fn not_ready_line(attempt: u32, max_attempts: u32) -> String {
    format!("Attempt {attempt}/{max_attempts}: Database not ready yet...")
}

fn exhausted_line(max_attempts: u32) -> String {
    format!("Database still unreachable after {max_attempts} attempts")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn narrated(f: impl FnOnce(&mut ReadinessVisual<Vec<u8>>)) -> String {
        let mut visual = ReadinessVisual::plain(Vec::new());
        f(&mut visual);
        String::from_utf8(visual.into_inner()).unwrap()
    }

    #[test]
    fn progress_line_shows_index_and_total() {
        assert_eq!(
            narrated(|v| v.not_ready(3, 30)),
            "Attempt 3/30: Database not ready yet...\n"
        );
        assert_eq!(
            narrated(|v| v.waiting("database")),
            "Waiting for database at database...\n"
        );
    }

    #[test]
    fn plain_writer_gets_no_escape_codes() {
        let text = narrated(|v| {
            v.ready();
            v.never_ready();
        });
        assert_eq!(
            text,
            "Database is ready!\nERROR: Database never became ready!\n"
        );
        assert!(!text.contains('\u{1b}'));
    }
}
