pub mod config;
#[cfg(feature = "batching")]
pub mod data_batch;
#[cfg(feature = "batching")]
pub mod dataloader;
pub mod dataset;
pub mod datasource;
pub mod decompress;
pub mod error;
pub mod idx_images;
pub mod idx_labels;
#[cfg(feature = "batching")]
pub mod info;
#[cfg(feature = "batching")]
pub mod par_iter;
