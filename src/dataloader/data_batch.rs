use super::dataset::{one_hot, DataSet};
use super::error::DataLoaderError;

/// A run of samples laid out back to back, ready to hand to a model.
#[derive(Clone, Debug, PartialEq)]
pub struct DataBatch {
    pub intensities: Vec<f64>,
    pub labels: Vec<u8>,
    pub samples_in_batch: usize,
    pub values_per_sample: usize,
    pub batch_number: usize,
}

impl DataBatch {
    pub fn from_indices(dataset: &DataSet, indices: &[usize], batch_number: usize) -> Self {
        let values_per_sample = dataset.image_len();
        let mut intensities = Vec::with_capacity(indices.len() * values_per_sample);
        let mut labels = Vec::with_capacity(indices.len());

        for &idx in indices {
            let sample = &dataset.samples[idx];
            intensities.extend_from_slice(&sample.intensities);
            labels.push(sample.label);
        }

        DataBatch {
            intensities,
            labels,
            samples_in_batch: indices.len(),
            values_per_sample,
            batch_number,
        }
    }

    /// Intensities of the `i`th sample, `None` past the end of the batch.
    pub fn sample(&self, i: usize) -> Option<&[f64]> {
        if i >= self.samples_in_batch {
            return None;
        }
        let start = i.checked_mul(self.values_per_sample)?;
        self.intensities.get(start..start.checked_add(self.values_per_sample)?)
    }

    /// Flat `samples_in_batch * num_classes` one-hot matrix.
    pub fn label_vectors(&self, num_classes: usize) -> Result<Vec<f64>, DataLoaderError> {
        let mut result = Vec::with_capacity(self.labels.len() * num_classes);
        for (index, &label) in self.labels.iter().enumerate() {
            let vector = one_hot(label, num_classes).ok_or(DataLoaderError::LabelOutOfRange {
                index,
                label,
                num_classes,
            })?;
            result.extend(vector);
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataloader::dataset::Sample;

    fn dataset() -> DataSet {
        DataSet {
            samples: (0..4u8)
                .map(|i| Sample {
                    intensities: vec![i as f64, i as f64 + 0.5],
                    label: i,
                })
                .collect(),
            width: 2,
            height: 1,
        }
    }

    #[test]
    fn gathers_samples_in_index_order() {
        let batch = DataBatch::from_indices(&dataset(), &[3, 1], 7);

        assert_eq!(batch.samples_in_batch, 2);
        assert_eq!(batch.values_per_sample, 2);
        assert_eq!(batch.batch_number, 7);
        assert_eq!(batch.labels, vec![3, 1]);
        assert_eq!(batch.sample(0), Some(&[3.0, 3.5][..]));
        assert_eq!(batch.sample(1), Some(&[1.0, 1.5][..]));
    }

    #[test]
    fn sample_past_end_is_none() {
        let batch = DataBatch::from_indices(&dataset(), &[3, 1], 0);

        assert_eq!(batch.sample(2), None);
        assert_eq!(batch.sample(usize::MAX), None);
        assert_eq!(DataBatch::from_indices(&dataset(), &[], 0).sample(0), None);
    }

    #[test]
    fn flat_one_hot_labels() {
        let batch = DataBatch::from_indices(&dataset(), &[0, 2], 0);

        let labels = batch.label_vectors(3).unwrap();

        assert_eq!(labels, vec![1.0, 0.0, 0.0, 0.0, 0.0, 1.0]);
        assert!(matches!(
            batch.label_vectors(2),
            Err(DataLoaderError::LabelOutOfRange { index: 1, label: 2, num_classes: 2 })
        ));
    }
}
