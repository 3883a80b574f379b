use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Receiver};

use super::data_batch::DataBatch;
use super::dataloader::{DataLoader, DatasetSplit};

/// Builds batches on a background thread, keeping up to `prefetch_count`
/// of them ready ahead of the consumer.
pub struct PrefetchBatchIterator {
    receiver: Receiver<DataBatch>,
    producer: JoinHandle<()>,
}

impl PrefetchBatchIterator {
    fn new(data_loader: Arc<DataLoader>, split: DatasetSplit) -> Self {
        let (sender, receiver) = bounded(data_loader.get_config().prefetch_count.max(1));

        let producer = thread::spawn(move || {
            let mut current_batch_index = 0;
            while let Some(batch) = data_loader.get_batch(split, current_batch_index) {
                // Receiver dropped, nobody wants the rest.
                if sender.send(batch).is_err() {
                    break;
                }
                current_batch_index += 1;
            }
        });

        PrefetchBatchIterator { receiver, producer }
    }

    /// Disconnects the channel and waits for the producer thread to exit.
    /// Returns the producer's panic payload if it panicked.
    pub fn stop(self) -> thread::Result<()> {
        let PrefetchBatchIterator { receiver, producer } = self;
        drop(receiver);
        producer.join()
    }
}

impl Iterator for PrefetchBatchIterator {
    type Item = DataBatch;

    fn next(&mut self) -> Option<Self::Item> {
        self.receiver.recv().ok()
    }
}

pub trait PrefetchDataLoaderIterator {
    fn par_iter(self: Arc<Self>, split: DatasetSplit) -> PrefetchBatchIterator;
}

impl PrefetchDataLoaderIterator for DataLoader {
    fn par_iter(self: Arc<Self>, split: DatasetSplit) -> PrefetchBatchIterator {
        PrefetchBatchIterator::new(self, split)
    }
}
