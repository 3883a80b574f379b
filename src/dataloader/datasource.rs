use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::config::DecoderConfig;
use super::dataset::DataSet;
use super::error::DataLoaderError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Asset {
    TrainImages,
    TrainLabels,
    TestImages,
    TestLabels,
}

impl Asset {
    pub fn file_name(self) -> &'static str {
        match self {
            Asset::TrainImages => "train-images-idx3-ubyte.gz",
            Asset::TrainLabels => "train-labels-idx1-ubyte.gz",
            Asset::TestImages => "t10k-images-idx3-ubyte.gz",
            Asset::TestLabels => "t10k-labels-idx1-ubyte.gz",
        }
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_name())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DatasetKind {
    Train,
    Test,
}

impl DatasetKind {
    pub fn images(self) -> Asset {
        match self {
            DatasetKind::Train => Asset::TrainImages,
            DatasetKind::Test => Asset::TestImages,
        }
    }

    pub fn labels(self) -> Asset {
        match self {
            DatasetKind::Train => Asset::TrainLabels,
            DatasetKind::Test => Asset::TestLabels,
        }
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatasetKind::Train => write!(f, "train"),
            DatasetKind::Test => write!(f, "test"),
        }
    }
}

/// Supplies the raw gzip bytes of each asset.
pub trait AssetSource {
    fn asset_bytes(&self, asset: Asset) -> Result<Cow<'_, [u8]>, DataLoaderError>;
}

/// Read-only buffers held in memory, e.g. `include_bytes!` data with
/// `'static` lifetime.
#[derive(Clone, Debug, Default)]
pub struct MemorySource {
    assets: HashMap<Asset, Cow<'static, [u8]>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_asset(mut self, asset: Asset, bytes: impl Into<Cow<'static, [u8]>>) -> Self {
        self.assets.insert(asset, bytes.into());
        self
    }
}

impl AssetSource for MemorySource {
    fn asset_bytes(&self, asset: Asset) -> Result<Cow<'_, [u8]>, DataLoaderError> {
        self.assets
            .get(&asset)
            .map(|bytes| Cow::Borrowed(bytes.as_ref()))
            .ok_or_else(|| DataLoaderError::AssetNotFound(asset.file_name().to_string()))
    }
}

/// Reads assets by their canonical file names from one directory.
#[derive(Clone, Debug)]
pub struct DirectorySource {
    dir: PathBuf,
}

impl DirectorySource {
    pub fn new(dir: impl AsRef<Path>) -> Result<Self, DataLoaderError> {
        let path = dir.as_ref();
        if !path.is_dir() {
            return Err(DataLoaderError::DirectoryNotFound(path.display().to_string()));
        }

        Ok(Self {
            dir: path.to_owned(),
        })
    }

    pub fn path_of(&self, asset: Asset) -> PathBuf {
        self.dir.join(asset.file_name())
    }
}

impl AssetSource for DirectorySource {
    fn asset_bytes(&self, asset: Asset) -> Result<Cow<'_, [u8]>, DataLoaderError> {
        let path = self.path_of(asset);
        if !path.is_file() {
            return Err(DataLoaderError::AssetNotFound(path.display().to_string()));
        }
        let bytes = std::fs::read(&path)?;
        debug!(asset = %asset, bytes = bytes.len(), "read asset");
        Ok(Cow::Owned(bytes))
    }
}

pub fn load_dataset<S: AssetSource + ?Sized>(
    source: &S,
    kind: DatasetKind,
    config: &DecoderConfig,
) -> Result<DataSet, DataLoaderError> {
    let images = source.asset_bytes(kind.images())?;
    let labels = source.asset_bytes(kind.labels())?;

    let dataset = DataSet::decode(&images, &labels, config)?;
    info!(
        kind = %kind,
        samples = dataset.len(),
        width = dataset.width,
        height = dataset.height,
        "loaded dataset"
    );
    Ok(dataset)
}

pub fn load_training_dataset<S: AssetSource + ?Sized>(source: &S) -> Result<DataSet, DataLoaderError> {
    load_dataset(source, DatasetKind::Train, &DecoderConfig::default())
}

pub fn load_testing_dataset<S: AssetSource + ?Sized>(source: &S) -> Result<DataSet, DataLoaderError> {
    load_dataset(source, DatasetKind::Test, &DecoderConfig::default())
}
