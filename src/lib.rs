//! Decoder for the gzip-compressed IDX image/label files of the MNIST family.
//!
//! ```no_run
//! use mnist_idx::{load_training_dataset, DirectorySource};
//!
//! let source = DirectorySource::new("data/")?;
//! let dataset = load_training_dataset(&source)?;
//! let inputs = dataset.intensity_vectors();
//! let targets = dataset.label_vectors()?;
//! # Ok::<(), mnist_idx::DataLoaderError>(())
//! ```
//!
//! Splitting, shuffling and prefetched batching live behind the default
//! `batching` feature. Build with `--no-default-features` for the decoder alone.

pub mod dataloader;

#[cfg(feature = "batching")]
pub use dataloader::config::DataLoaderConfig;
pub use dataloader::config::{DecodeLimits, DecoderConfig};
#[cfg(feature = "batching")]
pub use dataloader::data_batch::DataBatch;
#[cfg(feature = "batching")]
pub use dataloader::dataloader::{DataLoader, DatasetSplit};
pub use dataloader::dataset::{DataSet, Sample};
pub use dataloader::datasource::{
    load_dataset, load_testing_dataset, load_training_dataset, Asset, AssetSource, DatasetKind,
    DirectorySource, MemorySource,
};
pub use dataloader::error::DataLoaderError;
#[cfg(feature = "batching")]
pub use dataloader::par_iter::PrefetchDataLoaderIterator;
