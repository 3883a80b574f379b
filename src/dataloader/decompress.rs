use std::io::{self, ErrorKind, Read};

use flate2::read::GzDecoder;

use super::error::DataLoaderError;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
const GZIP_HEADER_LEN: usize = 10;

// Largest up-front reservation made on the strength of a header field alone.
pub(crate) const MAX_PREALLOC: usize = 1 << 20;

/// Pull-based reader over a single gzip member held in memory.
///
/// Every error the inner decoder raises is a decompression failure, so parsers
/// reading through this type report `DataLoaderError::Decompression` for them
/// and keep short reads for their own structural errors.
pub struct Decompressor<'a> {
    inner: GzDecoder<&'a [u8]>,
}

impl<'a> Decompressor<'a> {
    pub fn new(compressed: &'a [u8]) -> Result<Self, DataLoaderError> {
        if compressed.len() < GZIP_HEADER_LEN {
            return Err(DataLoaderError::Decompression(io::Error::new(
                ErrorKind::UnexpectedEof,
                format!(
                    "buffer of {} bytes is shorter than a gzip header",
                    compressed.len()
                ),
            )));
        }
        if compressed[..2] != GZIP_MAGIC {
            return Err(DataLoaderError::Decompression(io::Error::new(
                ErrorKind::InvalidData,
                "missing gzip magic bytes",
            )));
        }

        Ok(Self {
            inner: GzDecoder::new(compressed),
        })
    }

    /// Drains whatever the parsers left unread so the gzip trailer (CRC32 and
    /// length) is checked.
    pub fn finish(mut self) -> Result<u64, DataLoaderError> {
        io::copy(&mut self.inner, &mut io::sink()).map_err(DataLoaderError::Decompression)
    }
}

impl Read for Decompressor<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

/// Reads until `buf` is full or the stream ends, returning the bytes read.
pub(crate) fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize, DataLoaderError> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(DataLoaderError::Decompression(e)),
        }
    }
    Ok(filled)
}

/// Reads at most `len` bytes into a fresh vector.
pub(crate) fn read_block<R: Read>(reader: &mut R, len: usize) -> Result<Vec<u8>, DataLoaderError> {
    let mut block = Vec::with_capacity(len.min(MAX_PREALLOC));
    reader
        .by_ref()
        .take(len as u64)
        .read_to_end(&mut block)
        .map_err(DataLoaderError::Decompression)?;
    Ok(block)
}
