// ── Central error type ────────────────────────────────────────────────────────
//
// All fallible operations in the crate return `error::Result<T>`.  None of
// these errors ever reach the end user: `FileSizeListener` absorbs them and
// clears the status item instead (see `listener`).

use std::path::PathBuf;

/// Every error that a size computation can produce.
#[derive(Debug, thiserror::Error)]
pub enum SizeError {
    /// The buffer's encoding name is not in the encoding map.
    #[error("unsupported encoding {0:?}")]
    UnsupportedEncoding(String),

    /// The buffer's line-ending name is not in the line-ending map.
    #[error("unsupported line endings {0:?}")]
    UnsupportedLineEnding(String),

    /// The buffer holds a character the target encoding cannot represent.
    #[error("character {character:?} cannot be encoded as {encoding}")]
    Unencodable {
        /// The first offending character.
        character: char,
        /// Display name of the target encoding.
        encoding: &'static str,
    },

    /// The buffer was modified while it was being scanned.
    #[error("buffer changed during scan (revision {expected} -> {found})")]
    ViewChanged {
        /// Revision observed when the scan started.
        expected: u64,
        /// Revision observed when the change was noticed.
        found: u64,
    },

    /// The file backing a saved buffer could not be inspected.
    #[error("cannot read {}: {source}", .path.display())]
    Filesystem {
        /// The file that was being measured.
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The zlib stream could not be produced.
    #[error("compression failed: {0}")]
    Compression(#[source] std::io::Error),
}

impl SizeError {
    /// `true` when retrying later may succeed without any user action.
    ///
    /// Only a concurrent modification is transient; every other failure is
    /// permanent for the current buffer state.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::ViewChanged { .. })
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SizeError>;

// ── Tests ─────────────────────────────────────────────────────────────────────
