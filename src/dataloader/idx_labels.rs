use std::io::Read;

use byteorder::{BigEndian, ByteOrder};
use tracing::debug;

use super::config::DecoderConfig;
use super::decompress::{read_block, read_full};
use super::error::{DataLoaderError, StreamKind};

pub const LABEL_MAGIC: u32 = 0x0000_0801;
pub const LABEL_HEADER_LEN: usize = 8;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LabelHeader {
    pub magic: u32,
    pub count: u32,
}

pub fn read_label_header<R: Read>(reader: &mut R) -> Result<LabelHeader, DataLoaderError> {
    let mut bytes = [0u8; LABEL_HEADER_LEN];
    let found = read_full(reader, &mut bytes)?;
    if found < LABEL_HEADER_LEN {
        return Err(DataLoaderError::HeaderRead {
            stream: StreamKind::Labels,
            needed: LABEL_HEADER_LEN,
            found,
        });
    }

    Ok(LabelHeader {
        magic: BigEndian::read_u32(&bytes[0..4]),
        count: BigEndian::read_u32(&bytes[4..8]),
    })
}

/// Reads `count` one-byte labels after the 8 byte header.
///
/// `count` comes from the caller (normally the image stream); the header's own
/// count is only consulted when `check_label_count` is set.
pub fn read_labels<R: Read>(
    reader: &mut R,
    count: usize,
    config: &DecoderConfig,
) -> Result<Vec<u8>, DataLoaderError> {
    let header = read_label_header(reader)?;
    debug!(declared = header.count, expected = count, "parsed label header");

    if header.magic != LABEL_MAGIC {
        if config.validate_magic {
            return Err(DataLoaderError::BadMagic {
                stream: StreamKind::Labels,
                expected: LABEL_MAGIC,
                found: header.magic,
            });
        }
        debug!(magic = header.magic, "ignoring unexpected label magic");
    }

    if config.check_label_count && header.count as usize != count {
        return Err(DataLoaderError::SampleCountMismatch {
            images: count,
            labels: header.count as usize,
        });
    }

    let labels = read_block(reader, count)?;
    if labels.len() < count {
        return Err(DataLoaderError::UnexpectedEndOfLabels {
            expected: count,
            found: labels.len(),
        });
    }

    Ok(labels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataloader::fixtures::label_stream;

    #[test]
    fn reads_requested_count() {
        let stream = label_stream(&[3, 7, 1]);

        let labels = read_labels(&mut stream.as_slice(), 3, &DecoderConfig::default()).unwrap();

        assert_eq!(labels, vec![3, 7, 1]);
    }

    #[test]
    fn trailing_labels_are_ignored() {
        let stream = label_stream(&[3, 7, 1]);

        let labels = read_labels(&mut stream.as_slice(), 2, &DecoderConfig::default()).unwrap();

        assert_eq!(labels, vec![3, 7]);
    }

    #[test]
    fn labels_above_nine_are_kept() {
        let stream = label_stream(&[200, 255]);

        let labels = read_labels(&mut stream.as_slice(), 2, &DecoderConfig::default()).unwrap();

        assert_eq!(labels, vec![200, 255]);
    }

    #[test]
    fn short_header_is_header_read_error() {
        let stream = label_stream(&[]);

        assert!(matches!(
            read_labels(&mut &stream[..7], 0, &DecoderConfig::default()),
            Err(DataLoaderError::HeaderRead {
                stream: StreamKind::Labels,
                needed: 8,
                found: 7,
            })
        ));
    }

    #[test]
    fn missing_labels_are_unexpected_end() {
        let stream = label_stream(&[3, 7]);

        assert!(matches!(
            read_labels(&mut stream.as_slice(), 5, &DecoderConfig::default()),
            Err(DataLoaderError::UnexpectedEndOfLabels {
                expected: 5,
                found: 2,
            })
        ));
    }

    #[test]
    fn declared_count_is_only_checked_on_request() {
        let mut stream = label_stream(&[3, 7]);
        // Header claims 9 labels.
        stream[4..8].copy_from_slice(&9u32.to_be_bytes());

        let labels = read_labels(&mut stream.as_slice(), 2, &DecoderConfig::default()).unwrap();
        assert_eq!(labels, vec![3, 7]);

        let strict = DecoderConfig {
            check_label_count: true,
            ..Default::default()
        };
        assert!(matches!(
            read_labels(&mut stream.as_slice(), 2, &strict),
            Err(DataLoaderError::SampleCountMismatch { images: 2, labels: 9 })
        ));
    }

    #[test]
    fn bad_magic_fails_only_when_validating() {
        let mut stream = label_stream(&[1]);
        stream[3] = 0x03;

        assert!(read_labels(&mut stream.as_slice(), 1, &DecoderConfig::default()).is_ok());

        let strict = DecoderConfig {
            validate_magic: true,
            ..Default::default()
        };
        assert!(matches!(
            read_labels(&mut stream.as_slice(), 1, &strict),
            Err(DataLoaderError::BadMagic {
                stream: StreamKind::Labels,
                expected: LABEL_MAGIC,
                found: 0x0000_0803,
            })
        ));
    }
}
