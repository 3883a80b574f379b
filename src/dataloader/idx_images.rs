use std::io::Read;

use byteorder::{BigEndian, ByteOrder};
use tracing::debug;

use super::config::DecoderConfig;
use super::decompress::{read_block, read_full, MAX_PREALLOC};
use super::error::{DataLoaderError, StreamKind};

pub const IMAGE_MAGIC: u32 = 0x0000_0803;
pub const IMAGE_HEADER_LEN: usize = 16;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageHeader {
    pub magic: u32,
    pub count: u32,
    pub width: u32,
    pub height: u32,
}

impl ImageHeader {
    fn parse(bytes: &[u8; IMAGE_HEADER_LEN]) -> Self {
        Self {
            magic: BigEndian::read_u32(&bytes[0..4]),
            count: BigEndian::read_u32(&bytes[4..8]),
            width: BigEndian::read_u32(&bytes[8..12]),
            height: BigEndian::read_u32(&bytes[12..16]),
        }
    }

    /// Bytes per image. `u32 * u32` always fits in `u64`.
    pub fn image_len(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

/// Decoded image blocks, each exactly `width * height` bytes, row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageSet {
    pub images: Vec<Vec<u8>>,
    pub width: u32,
    pub height: u32,
}

impl ImageSet {
    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

pub fn read_image_header<R: Read>(
    reader: &mut R,
    config: &DecoderConfig,
) -> Result<ImageHeader, DataLoaderError> {
    let mut bytes = [0u8; IMAGE_HEADER_LEN];
    let found = read_full(reader, &mut bytes)?;
    if found < IMAGE_HEADER_LEN {
        return Err(DataLoaderError::HeaderRead {
            stream: StreamKind::Images,
            needed: IMAGE_HEADER_LEN,
            found,
        });
    }

    let header = ImageHeader::parse(&bytes);
    debug!(
        count = header.count,
        width = header.width,
        height = header.height,
        "parsed image header"
    );

    if header.magic != IMAGE_MAGIC {
        if config.validate_magic {
            return Err(DataLoaderError::BadMagic {
                stream: StreamKind::Images,
                expected: IMAGE_MAGIC,
                found: header.magic,
            });
        }
        debug!(magic = header.magic, "ignoring unexpected image magic");
    }

    if header.width == 0 || header.height == 0 {
        return Err(DataLoaderError::InvalidDimensions {
            width: header.width,
            height: header.height,
        });
    }

    if let Some(limits) = &config.limits {
        if header.count > limits.max_count {
            return Err(DataLoaderError::LimitExceeded {
                what: "image count",
                value: header.count as u64,
                limit: limits.max_count as u64,
            });
        }
        if header.image_len() > limits.max_image_bytes as u64 {
            return Err(DataLoaderError::LimitExceeded {
                what: "image size",
                value: header.image_len(),
                limit: limits.max_image_bytes as u64,
            });
        }
    }

    Ok(header)
}

/// Parses an image stream: a 16 byte header followed by `count` blocks of
/// `width * height` bytes. A short block is an error, never padded.
pub fn read_images<R: Read>(
    reader: &mut R,
    config: &DecoderConfig,
) -> Result<ImageSet, DataLoaderError> {
    let header = read_image_header(reader, config)?;

    let image_len = usize::try_from(header.image_len()).map_err(|_| DataLoaderError::LimitExceeded {
        what: "image size",
        value: header.image_len(),
        limit: usize::MAX as u64,
    })?;
    let count = header.count as usize;

    // Only reserve what a plausible stream could fill; the vector grows as blocks arrive.
    let per_image = image_len + std::mem::size_of::<Vec<u8>>();
    let mut images = Vec::with_capacity(count.min(MAX_PREALLOC / per_image));
    for index in 0..count {
        let block = read_block(reader, image_len)?;
        if block.len() < image_len {
            return Err(DataLoaderError::TruncatedImageData {
                index,
                expected: image_len,
                found: block.len(),
            });
        }
        images.push(block);
    }

    Ok(ImageSet {
        images,
        width: header.width,
        height: header.height,
    })
}
