use super::error::DataLoaderError;

pub const DEFAULT_NUM_CLASSES: usize = 10;

/// Upper bounds applied to untrusted header fields before anything is allocated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DecodeLimits {
    pub max_count: u32,
    pub max_image_bytes: usize,
}

/// Controls how IDX streams are decoded and assembled.
///
/// The defaults accept exactly what the plain format accepts: magic numbers are
/// skipped, the label header count is ignored and header fields are unbounded.
/// Callers decoding untrusted buffers should set `limits`.
#[derive(Clone, Debug)]
pub struct DecoderConfig {
    pub validate_magic: bool,
    pub check_label_count: bool,
    pub verify_checksum: bool,
    pub limits: Option<DecodeLimits>,
    pub validate_labels: bool,
    pub num_classes: usize,
    pub parallel_normalize: bool,
    pub threads: usize,
}

impl DecoderConfig {
    pub fn build(self) -> Result<Self, DataLoaderError> {
        if self.num_classes == 0 {
            return Err(DataLoaderError::InvalidClassCount(self.num_classes));
        }
        Ok(self)
    }
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            validate_magic: false,
            check_label_count: false,
            verify_checksum: true,
            limits: None,
            validate_labels: false,
            num_classes: DEFAULT_NUM_CLASSES,
            parallel_normalize: false,
            threads: num_cpus::get(),
        }
    }
}

#[cfg(feature = "batching")]
pub struct DataLoaderConfig {
    pub batch_size: usize,
    pub prefetch_count: usize,
    pub train_ratio: f32,
    pub test_ratio: f32,
    pub shuffle: bool,
    pub shuffle_seed: Option<u64>,
    pub drop_last: bool,
}

#[cfg(feature = "batching")]
impl DataLoaderConfig {
    pub fn build(self) -> Result<Self, DataLoaderError> {
        check_split_ratios(self.train_ratio, self.test_ratio)?;
        if self.batch_size == 0 {
            return Err(DataLoaderError::InvalidBatchSize(self.batch_size));
        }

        Ok(self)
    }
}

#[cfg(feature = "batching")]
impl Default for DataLoaderConfig {
    fn default() -> Self {
        Self {
            batch_size: 32,
            prefetch_count: 4,
            train_ratio: 1.0,
            test_ratio: 0.0,
            shuffle: true,
            shuffle_seed: None,
            drop_last: false,
        }
    }
}

#[cfg(feature = "batching")]
fn check_split_ratios(train_ratio: f32, test_ratio: f32) -> Result<(), DataLoaderError> {
    // NaN compares false against everything, so finiteness is checked first.
    if !train_ratio.is_finite()
        || !test_ratio.is_finite()
        || train_ratio + test_ratio > 1.0
        || train_ratio <= 0.0
        || test_ratio < 0.0
    {
        return Err(DataLoaderError::InvalidSplitRatios {
            train: train_ratio,
            test: test_ratio,
        });
    }
    Ok(())
}
