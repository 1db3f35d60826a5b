// ── Text buffers ──────────────────────────────────────────────────────────────
//
// `TextBuffer` is everything the size logic needs from a host editor's
// buffer.  `MemoryBuffer` is a self-contained implementation used by the CLI
// host and the tests.
//
// Buffers always hold `\n`-normalized text; the on-disk line ending is a
// separate property applied at encode time.

use std::{
    fs,
    ops::Range,
    path::{Path, PathBuf},
};

use crate::{
    encoding::LineEnding,
    error::{Result, SizeError},
};

// ── Identity ──────────────────────────────────────────────────────────────────

/// Stable identity of a buffer for as long as the host keeps it open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferId(pub u64);

// ── Host interface ────────────────────────────────────────────────────────────

/// Read-only view of a host buffer.
pub trait TextBuffer {
    fn id(&self) -> BufferId;

    /// Length in characters.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Changes on every content mutation and never goes backwards.
    fn revision(&self) -> u64;

    /// Characters in `range`, clamped to the buffer length.
    fn substr(&self, range: Range<usize>) -> String;

    /// Host encoding label, e.g. `"UTF-8"` or `"Western (Windows 1252)"`.
    fn encoding_name(&self) -> &str;

    /// Host line-ending label: `"Unix"`, `"Windows"` or `"CR"`.
    fn line_endings_name(&self) -> &str;

    /// `true` when the buffer has changes not yet saved to disk.
    fn is_dirty(&self) -> bool;

    /// The file the buffer was loaded from or saved to, if any.
    fn file_path(&self) -> Option<&Path>;
}

// ── MemoryBuffer ──────────────────────────────────────────────────────────────

/// An owned, in-memory buffer.
#[derive(Debug)]
pub struct MemoryBuffer {
    id: BufferId,
    chars: Vec<char>,
    revision: u64,
    encoding: String,
    line_endings: LineEnding,
    dirty: bool,
    path: Option<PathBuf>,
}

impl MemoryBuffer {
    /// A fresh, untitled buffer holding `text`.
    ///
    /// Untitled buffers start dirty only if they have content, like an editor
    /// scratch tab that has been typed into.
    pub fn new(id: BufferId, text: &str) -> Self {
        Self {
            id,
            chars: normalize_newlines(text).chars().collect(),
            revision: 1,
            encoding: "UTF-8".to_owned(),
            line_endings: LineEnding::Unix,
            dirty: !text.is_empty(),
            path: None,
        }
    }

    /// Load a file, detecting its encoding and dominant line ending.
    ///
    /// The resulting buffer is clean and remembers `path`.
    pub fn open(id: BufferId, path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let bytes = fs::read(&path).map_err(|source| SizeError::Filesystem {
            path: path.clone(),
            source,
        })?;

        let (encoding, text) = detect_and_decode(&bytes);
        let line_endings = detect_eol(&text);
        tracing::debug!(
            path = %path.display(),
            encoding,
            line_endings = line_endings.name(),
            "opened buffer"
        );

        Ok(Self {
            id,
            chars: normalize_newlines(&text).chars().collect(),
            revision: 1,
            encoding: encoding.to_owned(),
            line_endings,
            dirty: false,
            path: Some(path),
        })
    }

    /// Insert `text` before character index `at` (clamped to the end).
    pub fn insert(&mut self, at: usize, text: &str) {
        let at = at.min(self.chars.len());
        let normalized = normalize_newlines(text);
        let tail = self.chars.split_off(at);
        self.chars.extend(normalized.chars());
        self.chars.extend(tail);
        self.touch();
    }

    /// Replace the whole content.
    pub fn set_text(&mut self, text: &str) {
        self.chars = normalize_newlines(text).chars().collect();
        self.touch();
    }

    /// Change the encoding the buffer will be saved with.
    pub fn set_encoding(&mut self, name: impl Into<String>) {
        self.encoding = name.into();
        self.touch();
    }

    /// Change the line ending the buffer will be saved with.
    pub fn set_line_endings(&mut self, eol: LineEnding) {
        self.line_endings = eol;
        self.touch();
    }

    /// Record a successful save to `path`.
    pub fn mark_saved(&mut self, path: impl Into<PathBuf>) {
        self.path = Some(path.into());
        self.dirty = false;
    }

    /// The full content, `\n`-normalized.
    pub fn text(&self) -> String {
        self.chars.iter().collect()
    }

    fn touch(&mut self) {
        self.revision += 1;
        self.dirty = true;
    }
}

impl TextBuffer for MemoryBuffer {
    fn id(&self) -> BufferId {
        self.id
    }

    fn len(&self) -> usize {
        self.chars.len()
    }

    fn revision(&self) -> u64 {
        self.revision
    }

    fn substr(&self, range: Range<usize>) -> String {
        let end = range.end.min(self.chars.len());
        let start = range.start.min(end);
        self.chars[start..end].iter().collect()
    }

    fn encoding_name(&self) -> &str {
        &self.encoding
    }

    fn line_endings_name(&self) -> &str {
        self.line_endings.name()
    }

    fn is_dirty(&self) -> bool {
        self.dirty
    }

    fn file_path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

// ── Detection ─────────────────────────────────────────────────────────────────

/// Detect the encoding of `bytes` and return its host label + decoded text.
///
/// Detection order:
/// 1. UTF-16 LE BOM (`FF FE`)
/// 2. UTF-16 BE BOM (`FE FF`)
/// 3. UTF-8 BOM (`EF BB BF`)
/// 4. Heuristic: if the bytes are valid UTF-8, treat as UTF-8
/// 5. Fallback: Windows-1252
fn detect_and_decode(bytes: &[u8]) -> (&'static str, String) {
    if let Some(payload) = bytes.strip_prefix(b"\xFF\xFE") {
        let units: Vec<u16> = payload
            .chunks_exact(2)
            .map(|c| u16::from_le_bytes([c[0], c[1]]))
            .collect();
        return ("UTF-16 LE with BOM", String::from_utf16_lossy(&units));
    }

    if let Some(payload) = bytes.strip_prefix(b"\xFE\xFF") {
        let units: Vec<u16> = payload
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        return ("UTF-16 BE with BOM", String::from_utf16_lossy(&units));
    }

    if let Some(payload) = bytes.strip_prefix(b"\xEF\xBB\xBF") {
        return ("UTF-8 with BOM", String::from_utf8_lossy(payload).into_owned());
    }

    if let Ok(text) = std::str::from_utf8(bytes) {
        return ("UTF-8", text.to_owned());
    }

    let (text, _) = encoding_rs::WINDOWS_1252.decode_without_bom_handling(bytes);
    ("Western (Windows 1252)", text.into_owned())
}

/// Detect the dominant line ending in raw (not yet normalized) text.
///
/// Counts `\r\n`, lone `\r` and lone `\n`; ties favour Unix, then Windows.
/// Text without any newline is reported as Unix.
fn detect_eol(text: &str) -> LineEnding {
    let bytes = text.as_bytes();
    let mut crlf = 0usize;
    let mut lf = 0usize;
    let mut cr = 0usize;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\r' if bytes.get(i + 1) == Some(&b'\n') => {
                crlf += 1;
                i += 2;
            }
            b'\r' => {
                cr += 1;
                i += 1;
            }
            b'\n' => {
                lf += 1;
                i += 1;
            }
            _ => i += 1,
        }
    }
    if lf >= crlf && lf >= cr {
        LineEnding::Unix
    } else if crlf >= cr {
        LineEnding::Windows
    } else {
        LineEnding::Cr
    }
}

fn normalize_newlines(text: &str) -> std::borrow::Cow<'_, str> {
    if text.contains('\r') {
        std::borrow::Cow::Owned(text.replace("\r\n", "\n").replace('\r', "\n"))
    } else {
        std::borrow::Cow::Borrowed(text)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
