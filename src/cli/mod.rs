//! CLI parsing and logging setup.

pub mod commands;

use clap::{ArgGroup, Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use crate::core::canvas::Point;
use crate::core::dataset::Split;
use crate::core::error::{ErrorCode, HandwriteError, Result};

#[derive(Debug, Parser)]
#[command(
    name = "handwrite",
    version,
    about = "Handwritten digit recognition with a back-propagation network",
    arg_required_else_help = true
)]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,
    #[arg(long, global = true)]
    pub log_level: Option<String>,
    #[arg(long, global = true)]
    pub json: bool,
    /// TOML file with network, training, path and download settings
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Download the MNIST dataset files
    Download(DownloadArgs),
    /// Summarize an image/label set
    Inspect(InspectArgs),
    /// Train a network on the training set and save its weights
    Train(TrainArgs),
    /// Measure accuracy of saved weights on the test set
    Evaluate(EvaluateArgs),
    /// Recognize a single digit
    Predict(PredictArgs),
    /// Render one dataset sample as text
    Show(ShowArgs),
    /// Time serial against parallel matrix multiplication
    Bench(BenchArgs),
}

#[derive(Debug, Clone, Args)]
pub struct DownloadArgs {
    #[arg(long, value_name = "DIR")]
    pub assets: Option<PathBuf>,
    /// Download even when the file already exists
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, Clone, Args)]
pub struct InspectArgs {
    #[arg(long, value_name = "DIR")]
    pub assets: Option<PathBuf>,
    #[arg(long, value_enum, default_value_t = Split::Train)]
    pub set: Split,
}

#[derive(Debug, Clone, Args)]
pub struct TrainArgs {
    #[arg(long, value_name = "DIR")]
    pub assets: Option<PathBuf>,
    /// Directory the weight CSV files are written to
    #[arg(long, value_name = "DIR")]
    pub weights: Option<PathBuf>,
    #[arg(long)]
    pub epochs: Option<usize>,
    #[arg(long)]
    pub hidden: Option<usize>,
    #[arg(long)]
    pub learning_rate: Option<f64>,
    #[arg(long)]
    pub seed: Option<u64>,
    /// Train on at most this many samples per epoch
    #[arg(long)]
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Args)]
pub struct EvaluateArgs {
    #[arg(long, value_name = "DIR")]
    pub assets: Option<PathBuf>,
    #[arg(long, value_name = "DIR")]
    pub weights: Option<PathBuf>,
    /// Evaluate only the first N test samples
    #[arg(long)]
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Args)]
#[command(group(
    ArgGroup::new("input")
        .required(true)
        .args(["sample", "pixels", "stroke"])
))]
pub struct PredictArgs {
    #[arg(long, value_name = "DIR")]
    pub assets: Option<PathBuf>,
    #[arg(long, value_name = "DIR")]
    pub weights: Option<PathBuf>,
    /// Index of a test-set sample
    #[arg(long, value_name = "N")]
    pub sample: Option<usize>,
    /// CSV file holding a 28x28 grid of 0-255 pixel values
    #[arg(long, value_name = "FILE")]
    pub pixels: Option<PathBuf>,
    /// Pointer position on the 560x560 drawing surface; repeatable
    #[arg(long, value_name = "X,Y", allow_hyphen_values = true)]
    pub stroke: Vec<Point>,
}

#[derive(Debug, Clone, Args)]
pub struct ShowArgs {
    #[arg(long, value_name = "DIR")]
    pub assets: Option<PathBuf>,
    #[arg(long, value_enum, default_value_t = Split::Test)]
    pub set: Split,
    #[arg(long, value_name = "N")]
    pub index: usize,
}

#[derive(Debug, Clone, Args)]
pub struct BenchArgs {
    /// Edge length of the square matrices
    #[arg(long, default_value_t = 600)]
    pub size: usize,
    #[arg(long, default_value_t = 10)]
    pub rounds: usize,
    #[arg(long)]
    pub seed: Option<u64>,
}

pub fn init_logging(verbose: bool, log_level: Option<&str>) -> Result<()> {
    let filter = match log_level {
        Some(level) => EnvFilter::try_new(level).map_err(|err| {
            HandwriteError::context(ErrorCode::Config, format!("invalid log level {level:?}"), err)
        })?,
        None => {
            if verbose {
                EnvFilter::new("info")
            } else {
                EnvFilter::new("warn")
            }
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| HandwriteError::message(ErrorCode::Config, err.to_string()))?;

    Ok(())
}
