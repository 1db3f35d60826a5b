// ── On-disk measurement ───────────────────────────────────────────────────────
//
// The authoritative path: when a buffer is saved and unmodified, its size is
// whatever the filesystem says.  Also home to the zlib length helper shared
// with the estimator.

use std::{
    fs,
    io::{self, Write},
    path::Path,
};

use flate2::{write::ZlibEncoder, Compression};

use crate::error::{Result, SizeError};

/// Exact size of a file, plus its zlib-compressed length when requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Measurement {
    pub size: u64,
    pub compressed: Option<u64>,
}

/// Read the size of `path` from the filesystem.
///
/// With `include_compressed`, the raw file bytes are streamed through zlib
/// (never fully loaded into memory).
pub fn measure_file(path: &Path, include_compressed: bool) -> Result<Measurement> {
    let fs_err = |source| SizeError::Filesystem {
        path: path.to_path_buf(),
        source,
    };

    let size = fs::metadata(path).map_err(fs_err)?.len();
    let compressed = if include_compressed {
        let mut file = fs::File::open(path).map_err(fs_err)?;
        let mut encoder = ZlibEncoder::new(ByteCounter::default(), Compression::default());
        io::copy(&mut file, &mut encoder).map_err(fs_err)?;
        Some(encoder.finish().map_err(SizeError::Compression)?.0)
    } else {
        None
    };

    Ok(Measurement { size, compressed })
}

/// Length of `bytes` after zlib compression at the default level.
pub fn deflate_len(bytes: &[u8]) -> Result<u64> {
    let mut encoder = ZlibEncoder::new(ByteCounter::default(), Compression::default());
    encoder.write_all(bytes).map_err(SizeError::Compression)?;
    Ok(encoder.finish().map_err(SizeError::Compression)?.0)
}

/// A `Write` sink that only counts what passes through it.
#[derive(Debug, Default)]
struct ByteCounter(u64);

impl Write for ByteCounter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0 += buf.len() as u64;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
