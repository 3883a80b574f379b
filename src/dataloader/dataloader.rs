use std::sync::Arc;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::debug;

use super::config::DataLoaderConfig;
use super::data_batch::DataBatch;
use super::dataset::DataSet;
use super::error::DataLoaderError;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DatasetSplit {
    Train,
    Test,
    Validation,
}

/// Serves shuffled, split batches out of a decoded dataset.
pub struct DataLoader {
    dataset: Arc<DataSet>,
    dataset_indices: Vec<usize>,
    rng: Option<StdRng>,
    config: DataLoaderConfig,
}

impl DataLoader {
    pub fn new(dataset: impl Into<Arc<DataSet>>, config: Option<DataLoaderConfig>) -> Result<Self, DataLoaderError> {
        let dataset = dataset.into();
        if dataset.is_empty() {
            return Err(DataLoaderError::EmptyDataset);
        }

        let mut config = config.unwrap_or_default().build()?;

        let rng = if config.shuffle {
            let seed = *config
                .shuffle_seed
                .get_or_insert_with(|| rand::thread_rng().gen());
            Some(StdRng::seed_from_u64(seed))
        } else {
            None
        };

        let mut loader = DataLoader {
            dataset_indices: (0..dataset.len()).collect(),
            dataset,
            rng,
            config,
        };

        if loader.config.shuffle {
            loader.shuffle_whole_dataset()?;
        }
        debug!(
            samples = loader.len(),
            seed = ?loader.config.shuffle_seed,
            "created data loader"
        );

        Ok(loader)
    }

    pub fn len(&self) -> usize {
        self.dataset.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dataset.is_empty()
    }

    pub fn dataset(&self) -> &DataSet {
        &self.dataset
    }

    pub fn get_config(&self) -> &DataLoaderConfig {
        &self.config
    }

    pub fn get_split_sizes(&self) -> (usize, usize, usize) {
        let total_size = self.dataset.len();
        let train_size = (total_size as f32 * self.config.train_ratio) as usize;
        let test_size = (total_size as f32 * self.config.test_ratio) as usize;
        // Float rounding must never push the first two splits past the end.
        let train_size = train_size.min(total_size);
        let test_size = test_size.min(total_size - train_size);
        let val_size = total_size - train_size - test_size;
        (train_size, test_size, val_size)
    }

    fn split_range(&self, split: DatasetSplit) -> (usize, usize) {
        let (train_size, test_size, _) = self.get_split_sizes();
        match split {
            DatasetSplit::Train => (0, train_size),
            DatasetSplit::Test => (train_size, train_size + test_size),
            DatasetSplit::Validation => (train_size + test_size, self.dataset.len()),
        }
    }

    pub fn split_len(&self, split: DatasetSplit) -> usize {
        let (start, end) = self.split_range(split);
        end - start
    }

    pub fn num_batches(&self, split: DatasetSplit) -> usize {
        let split_size = self.split_len(split);
        if self.config.drop_last {
            split_size / self.config.batch_size
        } else {
            split_size.div_ceil(self.config.batch_size)
        }
    }

    /// Samples in the final batch served for `split`, 0 when it has none.
    pub fn last_batch_len(&self, split: DatasetSplit) -> usize {
        self.num_batches(split)
            .checked_sub(1)
            .and_then(|last| self.get_batch_indices(split, last))
            .map_or(0, <[usize]>::len)
    }

    /// Sample indices of one batch, or `None` past the end of the split.
    pub fn get_batch_indices(&self, split: DatasetSplit, batch_number: usize) -> Option<&[usize]> {
        let (start_index, end_index) = self.split_range(split);
        let split_size = end_index - start_index;
        let batch_start = batch_number.checked_mul(self.config.batch_size)?;

        if batch_start >= split_size {
            return None;
        }

        let batch_end = (batch_start + self.config.batch_size).min(split_size);
        let is_last_batch = batch_end == split_size;

        if self.config.drop_last
            && is_last_batch
            && (batch_end - batch_start) < self.config.batch_size
        {
            return None;
        }

        Some(&self.dataset_indices[start_index + batch_start..start_index + batch_end])
    }

    pub fn get_batch(&self, split: DatasetSplit, batch_number: usize) -> Option<DataBatch> {
        let indices = self.get_batch_indices(split, batch_number)?;
        Some(DataBatch::from_indices(&self.dataset, indices, batch_number))
    }

    pub fn shuffle_whole_dataset(&mut self) -> Result<(), DataLoaderError> {
        let rng = self.rng.as_mut().ok_or(DataLoaderError::RngNotSet)?;
        self.dataset_indices.shuffle(rng);
        Ok(())
    }

    /// Reshuffles within each split, keeping split membership fixed.
    pub fn shuffle_individual_datasets(&mut self) -> Result<(), DataLoaderError> {
        let (train_size, test_size, _) = self.get_split_sizes();
        let rng = self.rng.as_mut().ok_or(DataLoaderError::RngNotSet)?;

        self.dataset_indices[0..train_size].shuffle(rng);
        self.dataset_indices[train_size..train_size + test_size].shuffle(rng);
        self.dataset_indices[train_size + test_size..].shuffle(rng);
        Ok(())
    }

    pub fn iter(&self, split: DatasetSplit) -> BatchIterator<'_> {
        BatchIterator {
            loader: self,
            split,
            next_batch: 0,
        }
    }
}

pub struct BatchIterator<'a> {
    loader: &'a DataLoader,
    split: DatasetSplit,
    next_batch: usize,
}

impl Iterator for BatchIterator<'_> {
    type Item = DataBatch;

    fn next(&mut self) -> Option<Self::Item> {
        let batch = self.loader.get_batch(self.split, self.next_batch)?;
        self.next_batch += 1;
        Some(batch)
    }
}
