//! Layered settings: built-in defaults, then an optional TOML file, then CLI flags.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::core::error::{ErrorCode, HandwriteError, Result};

pub const DEFAULT_HIDDEN: usize = 100;
pub const DEFAULT_LEARNING_RATE: f64 = 0.1;
pub const DEFAULT_EPOCHS: usize = 1;
pub const DEFAULT_ASSETS: &str = "assets";
pub const DEFAULT_MIRRORS: [&str; 2] = [
    "https://storage.googleapis.com/cvdf-datasets/mnist/",
    "https://ossci-datasets.s3.amazonaws.com/mnist/",
];

const MAX_LEARNING_RATE: f64 = 10.0;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub network: NetworkSection,
    pub training: TrainingSection,
    pub paths: PathsSection,
    pub download: DownloadSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NetworkSection {
    pub hidden: Option<usize>,
    pub learning_rate: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TrainingSection {
    pub epochs: Option<usize>,
    pub seed: Option<u64>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsSection {
    pub assets: Option<PathBuf>,
    pub weights: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DownloadSection {
    pub mirrors: Option<Vec<String>>,
}

impl FileConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|err| {
            HandwriteError::context(
                ErrorCode::Config,
                format!("failed to read config {}", path.display()),
                err,
            )
        })?;
        Self::from_toml_str(&content).map_err(|err| {
            HandwriteError::context(
                ErrorCode::Config,
                format!("invalid config {}", path.display()),
                err,
            )
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

/// Values supplied on the command line; `None` defers to the file or default.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub hidden: Option<usize>,
    pub learning_rate: Option<f64>,
    pub epochs: Option<usize>,
    pub seed: Option<u64>,
    pub limit: Option<usize>,
    pub assets: Option<PathBuf>,
    pub weights: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub hidden: usize,
    pub learning_rate: f64,
    pub epochs: usize,
    pub seed: Option<u64>,
    pub limit: Option<usize>,
    pub assets: PathBuf,
    pub weights: PathBuf,
    pub mirrors: Vec<String>,
}

impl Settings {
    pub fn resolve(file: &FileConfig, overrides: &Overrides) -> Result<Self> {
        let assets = overrides
            .assets
            .clone()
            .or_else(|| file.paths.assets.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_ASSETS));
        let weights = overrides
            .weights
            .clone()
            .or_else(|| file.paths.weights.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_ASSETS));

        let settings = Self {
            hidden: overrides
                .hidden
                .or(file.network.hidden)
                .unwrap_or(DEFAULT_HIDDEN),
            learning_rate: overrides
                .learning_rate
                .or(file.network.learning_rate)
                .unwrap_or(DEFAULT_LEARNING_RATE),
            epochs: overrides
                .epochs
                .or(file.training.epochs)
                .unwrap_or(DEFAULT_EPOCHS),
            seed: overrides.seed.or(file.training.seed),
            limit: overrides.limit.or(file.training.limit),
            assets,
            weights,
            mirrors: file
                .download
                .mirrors
                .clone()
                .unwrap_or_else(|| DEFAULT_MIRRORS.iter().map(|m| m.to_string()).collect()),
        };
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.hidden == 0 {
            return Err(invalid("network.hidden must be greater than zero"));
        }
        if !(self.learning_rate > 0.0 && self.learning_rate <= MAX_LEARNING_RATE) {
            return Err(invalid(format!(
                "network.learning_rate must be in (0, {MAX_LEARNING_RATE}], got {}",
                self.learning_rate
            )));
        }
        if self.epochs == 0 {
            return Err(invalid("training.epochs must be greater than zero"));
        }
        check_limit("training.limit", self.limit)?;
        if self.mirrors.is_empty() {
            return Err(invalid("download.mirrors must list at least one URL"));
        }
        for mirror in &self.mirrors {
            let url = reqwest::Url::parse(mirror).map_err(|err| {
                HandwriteError::context(
                    ErrorCode::Config,
                    format!("download mirror {mirror:?} is not a valid URL"),
                    err,
                )
            })?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(invalid(format!(
                    "download mirror {mirror:?} must use http or https"
                )));
            }
        }
        Ok(())
    }
}

/// Rejects a sample limit of zero.
pub fn check_limit(name: &str, limit: Option<usize>) -> Result<()> {
    if limit == Some(0) {
        return Err(invalid(format!("{name} must be greater than zero")));
    }
    Ok(())
}

fn invalid(message: impl Into<String>) -> HandwriteError {
    HandwriteError::message(ErrorCode::Config, message)
}
