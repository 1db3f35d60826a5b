// ── statusbar-filesize ────────────────────────────────────────────────────────
//
// Shows how large a text buffer is (or will be once saved) in an editor's
// status bar.
//
//   • Saved, unmodified buffers: the size comes straight from the filesystem.
//   • Everything else: the buffer is re-encoded chunk by chunk with its
//     target encoding and line endings, and the bytes are counted.
//
// The host editor is reached only through the traits in `buffer`, `status`,
// `schedule` and `listener`; nothing here knows about a particular editor.

// No FFI anywhere in this crate.
#![forbid(unsafe_code)]

pub mod buffer;
pub mod config;
pub mod encoding;
pub mod error;
pub mod estimate;
pub mod format;
pub mod listener;
pub mod measure;
pub mod schedule;
pub mod status;

pub use buffer::{BufferId, MemoryBuffer, TextBuffer};
pub use config::Settings;
pub use error::{Result, SizeError};
pub use estimate::{estimate_buffer, estimate_file_size, Estimate};
pub use format::{file_size_str, format_size, Units};
pub use listener::{EventListener, FileSizeListener};
