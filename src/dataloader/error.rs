use std::fmt;

use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StreamKind {
    Images,
    Labels,
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamKind::Images => write!(f, "image"),
            StreamKind::Labels => write!(f, "label"),
        }
    }
}

#[derive(Error, Debug)]
pub enum DataLoaderError {
    // Decoding errors
    #[error("Decompression error: {0}")]
    Decompression(#[source] std::io::Error),

    #[error("Could not read {stream} header: needed {needed} bytes, found {found}")]
    HeaderRead {
        stream: StreamKind,
        needed: usize,
        found: usize,
    },

    #[error("Image dimensions must be non-zero. Width: {width}, Height: {height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("Not enough data for image {index}: expected {expected} bytes, found {found}")]
    TruncatedImageData {
        index: usize,
        expected: usize,
        found: usize,
    },

    #[error("Unexpected end of labels: expected {expected}, found {found}")]
    UnexpectedEndOfLabels { expected: usize, found: usize },

    #[error("Sample count mismatch. Images: {images}, Labels: {labels}")]
    SampleCountMismatch { images: usize, labels: usize },

    #[error("Bad {stream} magic number: expected {expected:#010x}, found {found:#010x}")]
    BadMagic {
        stream: StreamKind,
        expected: u32,
        found: u32,
    },

    #[error("Declared {what} of {value} exceeds the configured limit of {limit}")]
    LimitExceeded {
        what: &'static str,
        value: u64,
        limit: u64,
    },

    #[error("Label {label} of sample {index} is outside 0..{num_classes}")]
    LabelOutOfRange {
        index: usize,
        label: u8,
        num_classes: usize,
    },

    #[error("Sample {index} is out of range for a dataset of {len} samples")]
    SampleOutOfRange { index: usize, len: usize },

    // Asset errors
    #[error("Directory not found: {0}")]
    DirectoryNotFound(String),

    #[error("Asset not found: {0}")]
    AssetNotFound(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Image error: {0}")]
    ImageError(#[from] image::ImageError),

    // DataLoader errors
    #[error("Invalid dataset split ratios. Train: {train}, Test: {test}")]
    InvalidSplitRatios { train: f32, test: f32 },

    #[error("Invalid batch size: {0}")]
    InvalidBatchSize(usize),

    #[error("Invalid number of classes: {0}")]
    InvalidClassCount(usize),

    #[error("No samples in the dataset")]
    EmptyDataset,

    #[error("Random number generator (shuffle_seed) not set or enabled")]
    RngNotSet,

    #[error("Failed to build thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}
