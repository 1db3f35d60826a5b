// ── Status item ───────────────────────────────────────────────────────────────
//
// Turns a size report into the status-bar text and defines the surface it is
// shown on.  `StatusLine` is an in-memory surface for hosts without a real
// status bar (the CLI) and for tests.

use std::collections::HashMap;

use crate::{
    buffer::BufferId,
    format::{format_size, Units},
};

/// Status key under which the size is shown.
pub const KEY_SIZE: &str = "FileSize";

// ── Host interface ────────────────────────────────────────────────────────────

/// Where per-buffer status messages go.
pub trait StatusSurface {
    fn set_status(&mut self, buffer: BufferId, key: &str, text: &str);
    fn erase_status(&mut self, buffer: BufferId, key: &str);
}

// ── Report ────────────────────────────────────────────────────────────────────

/// A size ready to be displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeReport {
    pub size: u64,
    pub compressed: Option<u64>,
    /// `false` when the size was read from the filesystem.
    pub estimated: bool,
}

/// Render a report, e.g. `"~1.50 KiB (gzip: 312 Bytes)"`.
///
/// Estimates get a `~` prefix.  The compressed size is appended only when
/// present and non-zero.
pub fn status_text(report: &SizeReport, units: Units) -> String {
    let mut text = String::new();
    if report.estimated {
        text.push('~');
    }
    text.push_str(&format_size(report.size, units));
    if let Some(compressed) = report.compressed.filter(|&c| c > 0) {
        text.push_str(" (gzip: ");
        text.push_str(&format_size(compressed, units));
        text.push(')');
    }
    text
}

// ── StatusLine ────────────────────────────────────────────────────────────────

/// In-memory status surface.
#[derive(Debug, Default)]
pub struct StatusLine {
    entries: HashMap<(BufferId, String), String>,
    writes: usize,
}

impl StatusLine {
    pub fn get(&self, buffer: BufferId, key: &str) -> Option<&str> {
        self.entries
            .get(&(buffer, key.to_owned()))
            .map(String::as_str)
    }

    /// Total `set_status` calls so far.
    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl StatusSurface for StatusLine {
    fn set_status(&mut self, buffer: BufferId, key: &str, text: &str) {
        self.writes += 1;
        self.entries.insert((buffer, key.to_owned()), text.to_owned());
    }

    fn erase_status(&mut self, buffer: BufferId, key: &str) {
        self.entries.remove(&(buffer, key.to_owned()));
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
