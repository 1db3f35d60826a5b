// ── Event listener ────────────────────────────────────────────────────────────
//
// The host calls `on_post_save` / `on_modified` / `on_activated` with a
// buffer.  Each event schedules a deferred check; when the last check of a
// burst fires, the size is computed once and written to the status surface.
//
// Every failure is absorbed here.  The user sees either a size or nothing.

use crate::{
    buffer::TextBuffer,
    config::Settings,
    error::{Result, SizeError},
    estimate::estimate_buffer,
    measure::measure_file,
    schedule::{PendingCalls, Scheduler},
    status::{status_text, SizeReport, StatusSurface, KEY_SIZE},
};

// ── Host interface ────────────────────────────────────────────────────────────

/// Editor events that may change a buffer's size.
pub trait EventListener {
    fn on_post_save(&mut self, buffer: &dyn TextBuffer);
    fn on_modified(&mut self, buffer: &dyn TextBuffer);
    fn on_activated(&mut self, buffer: &dyn TextBuffer);
}

// ── FileSizeListener ──────────────────────────────────────────────────────────

/// Keeps the `FileSize` status item of each buffer up to date.
pub struct FileSizeListener<St, Sc> {
    settings: Settings,
    status: St,
    scheduler: Sc,
    pending: PendingCalls,
}

impl<St: StatusSurface, Sc: Scheduler> FileSizeListener<St, Sc> {
    pub fn new(settings: Settings, status: St, scheduler: Sc) -> Self {
        Self {
            settings,
            status,
            scheduler,
            pending: PendingCalls::default(),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn status(&self) -> &St {
        &self.status
    }

    pub fn scheduler_mut(&mut self) -> &mut Sc {
        &mut self.scheduler
    }

    /// Number of deferred checks still outstanding for `buffer`.
    pub fn pending(&self, buffer: &dyn TextBuffer) -> u32 {
        self.pending.pending(buffer.id())
    }

    /// Count an event and schedule the deferred check.
    fn update_debounced(&mut self, buffer: &dyn TextBuffer) {
        let id = buffer.id();
        self.pending.push(id);
        self.scheduler.defer(self.settings.debounce_delay(), id);
    }

    /// Scheduler callback: runs the update only if no newer event arrived.
    ///
    /// Returns `true` if an update cycle ran.
    pub fn on_deferred(&mut self, buffer: &dyn TextBuffer) -> bool {
        if !self.pending.pop(buffer.id()) {
            tracing::trace!(buffer = buffer.id().0, "superseded by a newer event");
            return false;
        }
        self.update_file_size(buffer);
        true
    }

    /// Compute and display the size right away, without debouncing.
    pub fn update_file_size(&mut self, buffer: &dyn TextBuffer) {
        let id = buffer.id();
        match self.compute(buffer) {
            Ok(Some(report)) => {
                let text = status_text(&report, self.settings.units);
                tracing::debug!(buffer = id.0, estimated = report.estimated, %text, "size updated");
                self.status.set_status(id, KEY_SIZE, &text);
            }
            Ok(None) => self.status.erase_status(id, KEY_SIZE),
            // Another event is already queued; touching the status now
            // would only make it flicker.
            Err(e @ SizeError::ViewChanged { .. }) => {
                tracing::debug!(buffer = id.0, error = %e, "skipping update");
            }
            Err(e) => {
                tracing::debug!(buffer = id.0, error = %e, "no size available");
                self.status.erase_status(id, KEY_SIZE);
            }
        }
    }

    /// Measure a clean saved file; estimate anything else.
    ///
    /// `Ok(None)` means estimation is switched off for unsaved buffers.
    fn compute(&self, buffer: &dyn TextBuffer) -> Result<Option<SizeReport>> {
        let compressed = self.settings.compute_compressed_size;

        match buffer.file_path() {
            Some(path) if !buffer.is_dirty() => {
                let m = measure_file(path, compressed)?;
                Ok(Some(SizeReport {
                    size: m.size,
                    compressed: m.compressed,
                    estimated: false,
                }))
            }
            _ if self.settings.estimate_unsaved_buffers => {
                let est = estimate_buffer(buffer, compressed)?;
                Ok(Some(SizeReport {
                    size: est.size,
                    compressed: est.compressed,
                    estimated: true,
                }))
            }
            _ => Ok(None),
        }
    }
}

impl<St: StatusSurface, Sc: Scheduler> EventListener for FileSizeListener<St, Sc> {
    fn on_post_save(&mut self, buffer: &dyn TextBuffer) {
        self.update_debounced(buffer);
    }

    fn on_modified(&mut self, buffer: &dyn TextBuffer) {
        self.update_debounced(buffer);
    }

    fn on_activated(&mut self, buffer: &dyn TextBuffer) {
        self.update_debounced(buffer);
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
