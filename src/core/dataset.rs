//! Locations of the MNIST files and the mirror download client.

use flate2::read::GzDecoder;
use reqwest::Client;
use serde::Serialize;
use std::fmt;
use std::io::Read;
use std::path::Path;

use crate::core::error::{ErrorCode, HandwriteError, Result};
use crate::core::mnist::{parse_u32_be, Dataset, ImageSet, LabelSet, IMAGE_MAGIC, LABEL_MAGIC};
use crate::core::output::DownloadEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Split {
    Train,
    Test,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatasetFile {
    /// File name under the assets directory.
    pub local: &'static str,
    /// Compressed file name on the mirrors.
    pub remote: &'static str,
    pub magic: u32,
}

pub const TRAIN_IMAGES: DatasetFile = DatasetFile {
    local: "train-images.idx3-ubyte",
    remote: "train-images-idx3-ubyte.gz",
    magic: IMAGE_MAGIC,
};
pub const TRAIN_LABELS: DatasetFile = DatasetFile {
    local: "train-labels.idx1-ubyte",
    remote: "train-labels-idx1-ubyte.gz",
    magic: LABEL_MAGIC,
};
pub const TEST_IMAGES: DatasetFile = DatasetFile {
    local: "t10k-images.idx3-ubyte",
    remote: "t10k-images-idx3-ubyte.gz",
    magic: IMAGE_MAGIC,
};
pub const TEST_LABELS: DatasetFile = DatasetFile {
    local: "t10k-labels.idx1-ubyte",
    remote: "t10k-labels-idx1-ubyte.gz",
    magic: LABEL_MAGIC,
};

pub const ALL_FILES: [DatasetFile; 4] = [TRAIN_IMAGES, TRAIN_LABELS, TEST_IMAGES, TEST_LABELS];

impl Split {
    pub fn files(self) -> (DatasetFile, DatasetFile) {
        match self {
            Split::Train => (TRAIN_IMAGES, TRAIN_LABELS),
            Split::Test => (TEST_IMAGES, TEST_LABELS),
        }
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Split::Train => "train",
            Split::Test => "test",
        };
        write!(f, "{label}")
    }
}

pub fn load_images(assets: &Path, split: Split) -> Result<ImageSet> {
    let (images, _) = split.files();
    ImageSet::open(&assets.join(images.local))
}

pub fn load_labels(assets: &Path, split: Split) -> Result<LabelSet> {
    let (_, labels) = split.files();
    LabelSet::open(&assets.join(labels.local))
}

pub fn load(assets: &Path, split: Split) -> Result<Dataset> {
    let images = load_images(assets, split)?;
    let labels = load_labels(assets, split)?;
    tracing::info!(%split, %images, %labels, "loaded dataset");
    Dataset::pair(images, labels)
}

#[derive(Clone)]
pub struct DatasetClient {
    http: Client,
    mirrors: Vec<String>,
}

impl DatasetClient {
    pub fn new(mirrors: Vec<String>) -> Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("handwrite/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http, mirrors })
    }

    /// Downloads every dataset file into `assets`, skipping files already present
    /// unless `force` is set.
    pub async fn download_all(&self, assets: &Path, force: bool) -> Result<Vec<DownloadEntry>> {
        tokio::fs::create_dir_all(assets).await.map_err(|err| {
            HandwriteError::context(
                ErrorCode::Io,
                format!("failed to create {}", assets.display()),
                err,
            )
        })?;

        let mut entries = Vec::with_capacity(ALL_FILES.len());
        for file in ALL_FILES {
            entries.push(self.download(file, assets, force).await?);
        }
        Ok(entries)
    }

    pub async fn download(
        &self,
        file: DatasetFile,
        assets: &Path,
        force: bool,
    ) -> Result<DownloadEntry> {
        let path = assets.join(file.local);
        if !force {
            if let Ok(metadata) = tokio::fs::metadata(&path).await {
                if metadata.is_file() {
                    tracing::info!(file = file.local, "already present, skipping");
                    return Ok(DownloadEntry {
                        file: file.local.to_string(),
                        path: path.display().to_string(),
                        bytes: metadata.len(),
                        mirror: None,
                        skipped: true,
                    });
                }
            }
        }

        let (mirror, data) = self.fetch(file).await?;
        tokio::fs::write(&path, &data).await.map_err(|err| {
            HandwriteError::context(
                ErrorCode::Io,
                format!("failed to write {}", path.display()),
                err,
            )
        })?;

        Ok(DownloadEntry {
            file: file.local.to_string(),
            path: path.display().to_string(),
            bytes: data.len() as u64,
            mirror: Some(mirror),
            skipped: false,
        })
    }

    /// Tries each mirror in order and returns the first valid, inflated payload.
    pub async fn fetch(&self, file: DatasetFile) -> Result<(String, Vec<u8>)> {
        let mut failures = Vec::new();
        for mirror in &self.mirrors {
            match self.fetch_from(mirror, file).await {
                Ok(data) => return Ok((mirror.clone(), data)),
                Err(err) => {
                    tracing::warn!(mirror = %mirror, file = file.remote, "download failed: {err}");
                    failures.push(format!("{mirror}: {err}"));
                }
            }
        }

        Err(HandwriteError::message(
            ErrorCode::Http,
            format!(
                "failed to download {} from every mirror ({})",
                file.remote,
                failures.join("; ")
            ),
        ))
    }

    async fn fetch_from(&self, mirror: &str, file: DatasetFile) -> Result<Vec<u8>> {
        let url = format!("{}/{}", mirror.trim_end_matches('/'), file.remote);
        tracing::info!(url = %url, "downloading");

        let response = self.http.get(&url).send().await.map_err(|err| {
            HandwriteError::context(ErrorCode::Http, format!("failed to fetch {url}"), err)
        })?;
        let compressed = response
            .error_for_status()
            .map_err(|err| {
                HandwriteError::context(ErrorCode::Http, format!("HTTP error fetching {url}"), err)
            })?
            .bytes()
            .await?;

        let data = inflate(&compressed)?;
        check_magic(file, &data)?;
        Ok(data)
    }
}

fn inflate(compressed: &[u8]) -> Result<Vec<u8>> {
    let mut data = Vec::new();
    GzDecoder::new(compressed)
        .read_to_end(&mut data)
        .map_err(|err| {
            HandwriteError::context(ErrorCode::InvalidData, "response is not valid gzip", err)
        })?;
    Ok(data)
}

fn check_magic(file: DatasetFile, data: &[u8]) -> Result<()> {
    let found = data.get(..4).map(parse_u32_be);
    if found != Some(file.magic) {
        return Err(HandwriteError::message(
            ErrorCode::InvalidData,
            format!("{} does not start with IDX magic {:#010x}", file.remote, file.magic),
        ));
    }
    Ok(())
}
