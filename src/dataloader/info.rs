use tracing::warn;

use super::config::DEFAULT_NUM_CLASSES;
use super::dataloader::{DataLoader, DatasetSplit};

pub fn print_dataset_info(dl: &DataLoader) {
    let dataset = dl.dataset();
    let config = dl.get_config();
    let (train_size, test_size, val_size) = dl.get_split_sizes();

    println!("Dataset Information:");
    println!("-------------------");
    println!("Total size: {}", dl.len());
    println!("Image size: {}x{} ({} values)", dataset.width, dataset.height, dataset.image_len());
    println!("Batch size: {}", config.batch_size);
    println!();
    for (name, split, size, ratio) in [
        ("Train", DatasetSplit::Train, train_size, config.train_ratio),
        ("Test", DatasetSplit::Test, test_size, config.test_ratio),
        (
            "Validation",
            DatasetSplit::Validation,
            val_size,
            1.0 - config.train_ratio - config.test_ratio,
        ),
    ] {
        println!("{} split:", name);
        println!("  Size: {} ({:.2}%)", size, ratio * 100.0);
        println!("  Batches: {}", dl.num_batches(split));
        println!("  Last batch size: {}", dl.last_batch_len(split));
        println!();
    }
    println!("Labels:");
    for (label, count) in dataset.label_counts() {
        println!("  {}: {}", label, count);
        if label as usize >= DEFAULT_NUM_CLASSES {
            warn!(label, count, "label outside the one-hot range");
        }
    }
    println!();
    println!("Shuffle: {}", config.shuffle);
    println!("Seed: {:?}", config.shuffle_seed);
}
