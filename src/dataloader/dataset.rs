use std::collections::BTreeMap;
use std::path::Path;

use image::GrayImage;
use rayon::iter::{IndexedParallelIterator, IntoParallelIterator, ParallelIterator};
use tracing::info;

use super::config::{DecoderConfig, DEFAULT_NUM_CLASSES};
use super::decompress::Decompressor;
use super::error::DataLoaderError;
use super::idx_images::{read_images, ImageSet};
use super::idx_labels::read_labels;

/// One handwritten digit.
#[derive(Clone, Debug, PartialEq)]
pub struct Sample {
    /// Row-major pixel intensities in `[0, 1]`, where 1 is black and 0 is white.
    pub intensities: Vec<f64>,
    /// Class index, expected in `0..=9` but not checked unless asked for.
    pub label: u8,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct DataSet {
    pub samples: Vec<Sample>,
    pub width: usize,
    pub height: usize,
}

pub fn normalize(block: &[u8]) -> Vec<f64> {
    block.iter().map(|&b| b as f64 / 255.0).collect()
}

/// Builds a one-hot vector, or `None` when `label` has no slot.
pub fn one_hot(label: u8, num_classes: usize) -> Option<Vec<f64>> {
    let index = label as usize;
    if index >= num_classes {
        return None;
    }
    let mut vector = vec![0.0; num_classes];
    vector[index] = 1.0;
    Some(vector)
}

impl DataSet {
    /// Decompresses and decodes an image stream and its label stream.
    ///
    /// The label count is taken from the image stream, so both always agree.
    pub fn decode(
        images_gz: &[u8],
        labels_gz: &[u8],
        config: &DecoderConfig,
    ) -> Result<Self, DataLoaderError> {
        let mut reader = Decompressor::new(images_gz)?;
        let images = read_images(&mut reader, config)?;
        if config.verify_checksum {
            reader.finish()?;
        }

        let mut reader = Decompressor::new(labels_gz)?;
        let labels = read_labels(&mut reader, images.len(), config)?;
        if config.verify_checksum {
            reader.finish()?;
        }

        Self::assemble(images, labels, config)
    }

    /// Pairs image blocks with labels index for index and normalizes intensities.
    pub fn assemble(
        images: ImageSet,
        labels: Vec<u8>,
        config: &DecoderConfig,
    ) -> Result<Self, DataLoaderError> {
        if images.len() != labels.len() {
            return Err(DataLoaderError::SampleCountMismatch {
                images: images.len(),
                labels: labels.len(),
            });
        }

        let width = images.width as usize;
        let height = images.height as usize;
        let image_len = width * height;
        if let Some((index, block)) = images
            .images
            .iter()
            .enumerate()
            .find(|(_, block)| block.len() != image_len)
        {
            return Err(DataLoaderError::TruncatedImageData {
                index,
                expected: image_len,
                found: block.len(),
            });
        }

        let samples: Vec<Sample> = if config.parallel_normalize {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(config.threads)
                .build()?;
            pool.install(|| {
                images
                    .images
                    .into_par_iter()
                    .zip(labels.into_par_iter())
                    .map(|(block, label)| Sample {
                        intensities: normalize(&block),
                        label,
                    })
                    .collect()
            })
        } else {
            images
                .images
                .iter()
                .zip(labels)
                .map(|(block, label)| Sample {
                    intensities: normalize(block),
                    label,
                })
                .collect()
        };

        let dataset = DataSet {
            samples,
            width,
            height,
        };
        if config.validate_labels {
            dataset.validate_labels(config.num_classes)?;
        }

        info!(samples = dataset.len(), width, height, "assembled dataset");
        Ok(dataset)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Values per sample, `width * height`.
    pub fn image_len(&self) -> usize {
        self.width * self.height
    }

    /// Intensity vectors in sample order, borrowed from the samples.
    pub fn intensity_vectors(&self) -> Vec<&[f64]> {
        self.samples
            .iter()
            .map(|sample| sample.intensities.as_slice())
            .collect()
    }

    /// One-hot vectors of length 10, one per sample. Fails on the first label
    /// outside `0..=9` instead of writing past the vector.
    pub fn label_vectors(&self) -> Result<Vec<Vec<f64>>, DataLoaderError> {
        self.label_vectors_with(DEFAULT_NUM_CLASSES)
    }

    pub fn label_vectors_with(&self, num_classes: usize) -> Result<Vec<Vec<f64>>, DataLoaderError> {
        self.samples
            .iter()
            .enumerate()
            .map(|(index, sample)| {
                one_hot(sample.label, num_classes).ok_or(DataLoaderError::LabelOutOfRange {
                    index,
                    label: sample.label,
                    num_classes,
                })
            })
            .collect()
    }

    pub fn validate_labels(&self, num_classes: usize) -> Result<(), DataLoaderError> {
        match self
            .samples
            .iter()
            .position(|sample| sample.label as usize >= num_classes)
        {
            Some(index) => Err(DataLoaderError::LabelOutOfRange {
                index,
                label: self.samples[index].label,
                num_classes,
            }),
            None => Ok(()),
        }
    }

    /// Number of samples per label value.
    pub fn label_counts(&self) -> BTreeMap<u8, usize> {
        let mut counts = BTreeMap::new();
        for sample in &self.samples {
            *counts.entry(sample.label).or_insert(0) += 1;
        }
        counts
    }

    /// Converts a sample back to an 8-bit greyscale image, rounding to the
    /// nearest byte.
    pub fn sample_image(&self, index: usize) -> Result<GrayImage, DataLoaderError> {
        let sample = self.samples.get(index).ok_or(DataLoaderError::SampleOutOfRange {
            index,
            len: self.len(),
        })?;
        let pixels = sample
            .intensities
            .iter()
            .map(|&v| (v.clamp(0.0, 1.0) * 255.0).round() as u8)
            .collect();

        GrayImage::from_raw(self.width as u32, self.height as u32, pixels).ok_or(
            DataLoaderError::TruncatedImageData {
                index,
                expected: self.image_len(),
                found: sample.intensities.len(),
            },
        )
    }

    pub fn save_sample_png(&self, index: usize, path: impl AsRef<Path>) -> Result<(), DataLoaderError> {
        self.sample_image(index)?
            .save_with_format(path, image::ImageFormat::Png)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataloader::fixtures::{gzip, image_stream, label_stream};

    fn two_by_two() -> DataSet {
        let images = gzip(&image_stream(2, 2, 2, &[0, 255, 128, 64, 255, 0, 0, 255]));
        let labels = gzip(&label_stream(&[3, 7]));
        DataSet::decode(&images, &labels, &DecoderConfig::default()).unwrap()
    }

    #[test]
    fn normalizes_every_byte_value_exactly() {
        let bytes: Vec<u8> = (0..=255).collect();

        let values = normalize(&bytes);

        for (b, v) in bytes.iter().zip(&values) {
            assert_eq!(*v, *b as f64 / 255.0);
            assert!((0.0..=1.0).contains(v));
        }
        assert_eq!(values[0], 0.0);
        assert_eq!(values[255], 1.0);
    }

    #[test]
    fn decodes_small_dataset() {
        let dataset = two_by_two();

        assert_eq!((dataset.width, dataset.height), (2, 2));
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.samples[0].label, 3);
        assert_eq!(dataset.samples[1].label, 7);
        let expected = [0.0, 1.0, 128.0 / 255.0, 64.0 / 255.0];
        for (got, want) in dataset.samples[0].intensities.iter().zip(expected) {
            assert!((got - want).abs() < 1e-12);
        }
        assert_eq!(dataset.samples[1].intensities, vec![1.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn assemble_rejects_count_mismatch() {
        let images = ImageSet {
            images: vec![vec![0; 4], vec![0; 4]],
            width: 2,
            height: 2,
        };

        assert!(matches!(
            DataSet::assemble(images, vec![1], &DecoderConfig::default()),
            Err(DataLoaderError::SampleCountMismatch { images: 2, labels: 1 })
        ));
    }

    #[test]
    fn assemble_rejects_wrong_block_length() {
        let images = ImageSet {
            images: vec![vec![0; 4], vec![0; 3]],
            width: 2,
            height: 2,
        };

        assert!(matches!(
            DataSet::assemble(images, vec![1, 2], &DecoderConfig::default()),
            Err(DataLoaderError::TruncatedImageData { index: 1, expected: 4, found: 3 })
        ));
    }

    #[test]
    fn parallel_normalization_matches_sequential() {
        let pixels: Vec<u8> = (0..64u32).map(|i| (i * 37 % 256) as u8).collect();
        let images = ImageSet {
            images: pixels.chunks(4).map(|c| c.to_vec()).collect(),
            width: 2,
            height: 2,
        };
        let labels: Vec<u8> = (0..16).map(|i| i % 10).collect();

        let sequential =
            DataSet::assemble(images.clone(), labels.clone(), &DecoderConfig::default()).unwrap();
        let parallel = DataSet::assemble(
            images,
            labels,
            &DecoderConfig {
                parallel_normalize: true,
                threads: 2,
                ..Default::default()
            },
        )
        .unwrap();

        assert_eq!(sequential, parallel);
    }

    #[test]
    fn intensity_vectors_follow_sample_order() {
        let dataset = two_by_two();

        let vectors = dataset.intensity_vectors();

        assert_eq!(vectors.len(), 2);
        assert_eq!(vectors[1], &[1.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn label_vectors_are_one_hot() {
        let dataset = DataSet {
            samples: (0..10)
                .map(|label| Sample {
                    intensities: vec![0.0],
                    label,
                })
                .collect(),
            width: 1,
            height: 1,
        };

        let vectors = dataset.label_vectors().unwrap();

        for (i, vector) in vectors.iter().enumerate() {
            assert_eq!(vector.len(), 10);
            assert_eq!(vector.iter().filter(|&&v| v == 1.0).count(), 1);
            assert_eq!(vector[dataset.samples[i].label as usize], 1.0);
            assert_eq!(vector.iter().sum::<f64>(), 1.0);
        }
    }

    #[test]
    fn out_of_range_label_fails() {
        let dataset = DataSet {
            samples: vec![
                Sample { intensities: vec![0.0], label: 2 },
                Sample { intensities: vec![0.0], label: 10 },
            ],
            width: 1,
            height: 1,
        };

        assert!(matches!(
            dataset.label_vectors(),
            Err(DataLoaderError::LabelOutOfRange { index: 1, label: 10, num_classes: 10 })
        ));
        assert!(dataset.label_vectors_with(11).is_ok());
        assert!(matches!(
            dataset.validate_labels(10),
            Err(DataLoaderError::LabelOutOfRange { index: 1, .. })
        ));
    }

    #[test]
    fn validate_labels_config_rejects_during_assembly() {
        let images = ImageSet {
            images: vec![vec![0]],
            width: 1,
            height: 1,
        };
        let config = DecoderConfig {
            validate_labels: true,
            ..Default::default()
        };

        assert!(matches!(
            DataSet::assemble(images.clone(), vec![12], &config),
            Err(DataLoaderError::LabelOutOfRange { label: 12, .. })
        ));
        assert!(DataSet::assemble(images, vec![12], &DecoderConfig::default()).is_ok());
    }

    #[test]
    fn label_counts_histogram() {
        let dataset = two_by_two();

        let counts = dataset.label_counts();

        assert_eq!(counts.get(&3), Some(&1));
        assert_eq!(counts.get(&7), Some(&1));
        assert_eq!(counts.len(), 2);
    }

    #[test]
    fn sample_image_restores_bytes() {
        let dataset = two_by_two();

        let img = dataset.sample_image(0).unwrap();

        assert_eq!(img.dimensions(), (2, 2));
        assert_eq!(img.into_raw(), vec![0, 255, 128, 64]);
        assert!(matches!(
            dataset.sample_image(5),
            Err(DataLoaderError::SampleOutOfRange { index: 5, len: 2 })
        ));
    }

    #[test]
    fn label_stream_shorter_than_images_fails() {
        let images = gzip(&image_stream(2, 1, 1, &[1, 2]));
        let labels = gzip(&label_stream(&[4]));

        assert!(matches!(
            DataSet::decode(&images, &labels, &DecoderConfig::default()),
            Err(DataLoaderError::UnexpectedEndOfLabels { expected: 2, found: 1 })
        ));
    }
}
