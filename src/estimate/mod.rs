// ── Size estimation ───────────────────────────────────────────────────────────
//
// Predicts how many bytes a buffer will occupy once saved, without touching
// the disk.  The buffer is walked in `BLOCK_SIZE`-character chunks so a large
// buffer is never copied in one go, and the revision counter is re-read
// before every chunk: if the buffer moved underneath the scan, the partial
// count is thrown away and `SizeError::ViewChanged` is returned.

use std::{iter::FusedIterator, ops::Range};

use crate::{
    buffer::TextBuffer,
    encoding::{ByteEncoding, LineEnding, TextEncoding},
    error::{Result, SizeError},
    measure::deflate_len,
};

/// Characters read from the buffer per step.
pub const BLOCK_SIZE: usize = 1000;

// ── Chunking ──────────────────────────────────────────────────────────────────

/// Half-open, contiguous sub-ranges of `range`, each at most `step` long.
///
/// Cloning the iterator restarts from the clone point.
#[derive(Debug, Clone)]
pub struct ChunkRanges {
    next: usize,
    end: usize,
    step: usize,
}

impl ChunkRanges {
    /// # Panics
    ///
    /// Panics if `step` is zero.
    pub fn new(range: Range<usize>, step: usize) -> Self {
        assert!(step > 0, "chunk step must be non-zero");
        Self {
            next: range.start,
            end: range.end,
            step,
        }
    }
}

impl Iterator for ChunkRanges {
    type Item = Range<usize>;

    fn next(&mut self) -> Option<Range<usize>> {
        if self.next >= self.end {
            return None;
        }
        let start = self.next;
        let end = start.saturating_add(self.step).min(self.end);
        self.next = end;
        Some(start..end)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.end.saturating_sub(self.next).div_ceil(self.step);
        (n, Some(n))
    }
}

impl ExactSizeIterator for ChunkRanges {}
impl FusedIterator for ChunkRanges {}

// ── Result ────────────────────────────────────────────────────────────────────

/// Predicted on-disk size of a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Estimate {
    pub size: u64,
    /// zlib length of the predicted file, when it was requested.
    pub compressed: Option<u64>,
}

impl Estimate {
    pub fn into_parts(self) -> (u64, Option<u64>) {
        (self.size, self.compressed)
    }
}

// ── Entry points ──────────────────────────────────────────────────────────────

/// Estimate `buffer` using its own encoding and line-ending settings.
pub fn estimate_buffer<B>(buffer: &B, include_compressed: bool) -> Result<Estimate>
where
    B: TextBuffer + ?Sized,
{
    estimate_file_size(
        buffer,
        buffer.encoding_name(),
        buffer.line_endings_name(),
        include_compressed,
    )
}

/// Estimate the saved size of `buffer` as if written with the given host
/// encoding and line-ending labels.
///
/// Errors:
/// * `UnsupportedEncoding` / `UnsupportedLineEnding` for unknown labels,
///   before anything is read;
/// * `Unencodable` when the text holds a character the encoding lacks;
/// * `ViewChanged` when the buffer's revision moved during the scan.  This
///   is the only transient error; callers should simply try again later.
pub fn estimate_file_size<B>(
    buffer: &B,
    encoding_name: &str,
    line_ending_name: &str,
    include_compressed: bool,
) -> Result<Estimate>
where
    B: TextBuffer + ?Sized,
{
    let encoding = TextEncoding::from_name(encoding_name)
        .ok_or_else(|| SizeError::UnsupportedEncoding(encoding_name.to_owned()))?;
    let eol = LineEnding::from_name(line_ending_name)
        .ok_or_else(|| SizeError::UnsupportedLineEnding(line_ending_name.to_owned()))?;

    let fencepost = buffer.revision();
    let mut tally = Tally::new(encoding, include_compressed);

    for range in ChunkRanges::new(0..buffer.len(), BLOCK_SIZE) {
        check_revision(buffer, fencepost)?;
        tracing::trace!(start = range.start, end = range.end, "estimating chunk");
        let text = buffer.substr(range);
        tally.feed(&eol.apply(&text))?;
    }
    // A change during the last read would otherwise go unnoticed.
    check_revision(buffer, fencepost)?;

    tally.finish()
}

fn check_revision<B: TextBuffer + ?Sized>(buffer: &B, fencepost: u64) -> Result<()> {
    let found = buffer.revision();
    if found != fencepost {
        return Err(SizeError::ViewChanged {
            expected: fencepost,
            found,
        });
    }
    Ok(())
}

// ── Accumulator ───────────────────────────────────────────────────────────────

/// Running byte count, plus the predicted file bytes if compression is wanted.
struct Tally {
    encoding: TextEncoding,
    bytes: u64,
    /// Hex digits seen so far (hexadecimal mode only).
    nibbles: u64,
    /// High nibble waiting for its partner (hexadecimal mode only).
    half_byte: Option<u8>,
    stream: Option<Vec<u8>>,
    scratch: Vec<u8>,
}

impl Tally {
    fn new(encoding: TextEncoding, include_compressed: bool) -> Self {
        let mut tally = Self {
            encoding,
            bytes: 0,
            nibbles: 0,
            half_byte: None,
            stream: include_compressed.then(Vec::new),
            scratch: Vec::new(),
        };
        if let TextEncoding::Bytes(enc) = encoding {
            tally.push_bytes(enc.bom());
        }
        tally
    }

    fn feed(&mut self, text: &str) -> Result<()> {
        match self.encoding {
            TextEncoding::Hexadecimal => self.feed_hex(text),
            TextEncoding::Bytes(enc) => self.feed_encoded(enc, text)?,
        }
        Ok(())
    }

    /// Hex digits are counted, not encoded.  Two digits make one byte; the
    /// count is only halved in `finish`, so an odd digit split across two
    /// chunks still pairs up with its neighbour.
    fn feed_hex(&mut self, text: &str) {
        for c in text.chars() {
            // Exactly 0-9a-fA-F.
            let Some(nibble) = c.to_digit(16) else {
                continue;
            };
            self.nibbles += 1;
            if let Some(stream) = self.stream.as_mut() {
                match self.half_byte.take() {
                    Some(high) => stream.push(high << 4 | nibble as u8),
                    None => self.half_byte = Some(nibble as u8),
                }
            }
        }
    }

    fn feed_encoded(&mut self, enc: ByteEncoding, text: &str) -> Result<()> {
        let mut scratch = std::mem::take(&mut self.scratch);
        scratch.clear();
        enc.encode_into(text, &mut scratch)
            .map_err(|character| SizeError::Unencodable {
                character,
                encoding: enc.label(),
            })?;
        self.push_bytes(&scratch);
        self.scratch = scratch;
        Ok(())
    }

    fn push_bytes(&mut self, bytes: &[u8]) {
        self.bytes += bytes.len() as u64;
        if let Some(stream) = self.stream.as_mut() {
            stream.extend_from_slice(bytes);
        }
    }

    fn finish(self) -> Result<Estimate> {
        let size = match self.encoding {
            // Truncating: a trailing unpaired digit adds nothing.
            TextEncoding::Hexadecimal => self.nibbles / 2,
            TextEncoding::Bytes(_) => self.bytes,
        };
        let compressed = self.stream.as_deref().map(deflate_len).transpose()?;
        Ok(Estimate { size, compressed })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::{cell::Cell, path::Path};

    use super::*;
    use crate::buffer::{BufferId, MemoryBuffer};

    fn buffer(text: &str) -> MemoryBuffer {
        MemoryBuffer::new(BufferId(1), text)
    }

    /// Wraps a buffer and bumps the revision on the n-th `substr` call, the
    /// way an edit landing mid-scan would.
    struct EditedDuringScan {
        inner: MemoryBuffer,
        revision: Cell<u64>,
        reads: Cell<usize>,
        edit_on_read: usize,
    }

    impl EditedDuringScan {
        fn new(text: &str, edit_on_read: usize) -> Self {
            let inner = buffer(text);
            let revision = Cell::new(inner.revision());
            Self {
                inner,
                revision,
                reads: Cell::new(0),
                edit_on_read,
            }
        }
    }

    impl TextBuffer for EditedDuringScan {
        fn id(&self) -> BufferId {
            self.inner.id()
        }
        fn len(&self) -> usize {
            self.inner.len()
        }
        fn revision(&self) -> u64 {
            self.revision.get()
        }
        fn substr(&self, range: Range<usize>) -> String {
            self.reads.set(self.reads.get() + 1);
            if self.reads.get() == self.edit_on_read {
                self.revision.set(self.revision.get() + 1);
            }
            self.inner.substr(range)
        }
        fn encoding_name(&self) -> &str {
            self.inner.encoding_name()
        }
        fn line_endings_name(&self) -> &str {
            self.inner.line_endings_name()
        }
        fn is_dirty(&self) -> bool {
            true
        }
        fn file_path(&self) -> Option<&Path> {
            None
        }
    }

    #[test]
    fn chunk_ranges_cover_without_gaps() {
        let chunks: Vec<_> = ChunkRanges::new(0..2500, 1000).collect();
        assert_eq!(chunks, vec![0..1000, 1000..2000, 2000..2500]);
    }

    #[test]
    fn chunk_ranges_exact_multiple_and_empty() {
        assert_eq!(ChunkRanges::new(0..2000, 1000).count(), 2);
        assert_eq!(ChunkRanges::new(0..0, 1000).next(), None);
        assert_eq!(ChunkRanges::new(5..5, 1).len(), 0);
    }

    #[test]
    fn chunk_ranges_restart_from_clone() {
        let mut it = ChunkRanges::new(10..35, 10);
        assert_eq!(it.next(), Some(10..20));
        let saved = it.clone();
        assert_eq!(it.collect::<Vec<_>>(), vec![20..30, 30..35]);
        assert_eq!(saved.len(), 2);
        assert_eq!(saved.collect::<Vec<_>>(), vec![20..30, 30..35]);
    }

    #[test]
    fn ascii_size_matches_substituted_text() {
        let line = "the quick brown fox\n";
        let text = line.repeat(200); // 4000 chars, four chunks
        let buf = buffer(&text);

        for (name, eol) in [("Unix", "\n"), ("Windows", "\r\n"), ("CR", "\r")] {
            let expected = text.replace('\n', eol).len() as u64;
            let est = estimate_file_size(&buf, "UTF-8", name, false).unwrap();
            assert_eq!(est, Estimate { size: expected, compressed: None }, "{name}");
        }
    }

    #[test]
    fn empty_buffer_is_zero() {
        let est = estimate_file_size(&buffer(""), "UTF-8", "Unix", false).unwrap();
        assert_eq!(est.into_parts(), (0, None));
    }

    #[test]
    fn multibyte_utf8_counts_bytes_not_chars() {
        let est = estimate_file_size(&buffer("héllo"), "UTF-8", "Unix", false).unwrap();
        assert_eq!(est.size, 6);
    }

    #[test]
    fn utf16_with_bom_counts_bom_once() {
        let est = estimate_file_size(&buffer("ab\n"), "UTF-16 LE with BOM", "Windows", false)
            .unwrap();
        assert_eq!(est.size, 2 + 4 * 2);
    }

    #[test]
    fn single_byte_legacy_encoding() {
        let est = estimate_file_size(&buffer("Grüße\n"), "Western (Windows 1252)", "Windows", false)
            .unwrap();
        assert_eq!(est.size, 7);
    }

    #[test]
    fn hexadecimal_five_digits_is_two_bytes() {
        let est = estimate_file_size(&buffer("0a1B2"), "Hexadecimal", "Unix", false).unwrap();
        assert_eq!(est.size, 2);
    }

    #[test]
    fn hexadecimal_ignores_non_digits_and_line_endings() {
        let est = estimate_file_size(&buffer("0a 1b\n2c\n"), "Hexadecimal", "Windows", false)
            .unwrap();
        assert_eq!(est.size, 3);
    }

    #[test]
    fn hexadecimal_pairs_across_chunk_boundary() {
        // 1001 digits: chunk one ends on an unpaired digit.
        let text = "f".repeat(BLOCK_SIZE + 1);
        let est = estimate_file_size(&buffer(&text), "Hexadecimal", "Unix", false).unwrap();
        assert_eq!(est.size, 500);

        let text = "f".repeat(BLOCK_SIZE + 2);
        let est = estimate_file_size(&buffer(&text), "Hexadecimal", "Unix", false).unwrap();
        assert_eq!(est.size, 501);
    }

    #[test]
    fn hexadecimal_compresses_packed_bytes() {
        let est = estimate_file_size(&buffer("ff00 7"), "Hexadecimal", "Unix", true).unwrap();
        assert_eq!(est.size, 2);
        assert_eq!(est.compressed, Some(deflate_len(&[0xFF, 0x00]).unwrap()));
    }

    #[test]
    fn compressed_size_covers_substituted_bytes() {
        let text = "abc\n".repeat(500);
        let est = estimate_file_size(&buffer(&text), "UTF-8", "Windows", true).unwrap();
        let expected = text.replace('\n', "\r\n");
        assert_eq!(est.size, expected.len() as u64);
        assert_eq!(est.compressed, Some(deflate_len(expected.as_bytes()).unwrap()));
        assert!(est.compressed.unwrap() < est.size);
    }

    #[test]
    fn unknown_encoding_is_rejected_before_reading() {
        let buf = EditedDuringScan::new("abc", 1);
        let err = estimate_file_size(&buf, "Klingon", "Unix", false).unwrap_err();
        assert!(matches!(err, SizeError::UnsupportedEncoding(ref n) if n == "Klingon"));
        assert_eq!(buf.reads.get(), 0);
    }

    #[test]
    fn unknown_line_ending_is_rejected() {
        let err = estimate_file_size(&buffer("abc"), "UTF-8", "NEL", false).unwrap_err();
        assert!(matches!(err, SizeError::UnsupportedLineEnding(_)));
    }

    #[test]
    fn unencodable_character_fails_whole_estimate() {
        let mut text = "a".repeat(BLOCK_SIZE * 2);
        text.push('€');
        let err = estimate_file_size(&buffer(&text), "Western (ISO 8859-1)", "Unix", true)
            .unwrap_err();
        assert!(matches!(err, SizeError::Unencodable { character: '€', .. }));
        assert!(!err.is_transient());
    }

    #[test]
    fn edit_between_chunks_aborts_scan() {
        let buf = EditedDuringScan::new(&"x".repeat(2500), 1);
        let err = estimate_buffer(&buf, false).unwrap_err();
        assert!(matches!(err, SizeError::ViewChanged { expected: 1, found: 2 }));
        assert!(err.is_transient());
        // Aborted at the second chunk, the third is never read.
        assert_eq!(buf.reads.get(), 1);
    }

    #[test]
    fn edit_during_last_chunk_is_still_detected() {
        let buf = EditedDuringScan::new(&"x".repeat(2500), 3);
        let err = estimate_buffer(&buf, false).unwrap_err();
        assert!(matches!(err, SizeError::ViewChanged { .. }));
        assert_eq!(buf.reads.get(), 3);
    }

    #[test]
    fn estimate_buffer_uses_buffer_settings() {
        let mut buf = buffer("a\nb\n");
        buf.set_line_endings(LineEnding::Windows);
        buf.set_encoding("UTF-16 BE");
        assert_eq!(estimate_buffer(&buf, false).unwrap().size, 6 * 2);
    }
}
