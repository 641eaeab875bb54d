//! Output types and serialization helpers.

use serde::Serialize;
use std::fmt;

use crate::core::dataset::Split;
use crate::core::error::Result;

#[derive(Debug, Serialize)]
pub struct DownloadOutput {
    pub assets: String,
    pub files: Vec<DownloadEntry>,
}

#[derive(Debug, Serialize)]
pub struct DownloadEntry {
    pub file: String,
    pub path: String,
    pub bytes: u64,
    pub mirror: Option<String>,
    pub skipped: bool,
}

#[derive(Debug, Serialize)]
pub struct InspectOutput {
    pub split: Split,
    pub images: usize,
    pub height: usize,
    pub width: usize,
    pub labels: usize,
    /// Number of samples per digit, indexed by digit.
    pub distribution: Vec<usize>,
}

#[derive(Debug, Serialize)]
pub struct TrainOutput {
    pub samples: usize,
    pub input_nodes: usize,
    pub hidden_nodes: usize,
    pub output_nodes: usize,
    pub learning_rate: f64,
    pub seed: Option<u64>,
    pub weights: String,
    pub epochs: Vec<EpochSummary>,
}

#[derive(Debug, Serialize)]
pub struct EpochSummary {
    pub epoch: usize,
    pub samples: usize,
    pub mean_loss: f64,
    pub elapsed_ms: u64,
}

#[derive(Debug, Serialize)]
pub struct EvaluateOutput {
    pub total: usize,
    pub correct: usize,
    pub accuracy: f64,
    pub per_digit: Vec<Option<f64>>,
    /// `confusion[label][predicted]`
    pub confusion: Vec<Vec<usize>>,
}

#[derive(Debug, Serialize)]
pub struct PredictOutput {
    pub source: String,
    pub digit: usize,
    pub ranking: Vec<usize>,
    pub confidences: Vec<f64>,
    pub elapsed_ms: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<u8>,
    #[serde(skip)]
    pub canvas: String,
}

#[derive(Debug, Serialize)]
pub struct ShowOutput {
    pub split: Split,
    pub index: usize,
    pub label: u8,
    pub pixels: Vec<Vec<u8>>,
    #[serde(skip)]
    pub canvas: String,
}

#[derive(Debug, Serialize)]
pub struct BenchOutput {
    pub size: usize,
    pub rounds: usize,
    pub threads: usize,
    pub serial_ms: Vec<f64>,
    pub parallel_ms: Vec<f64>,
    pub serial_mean_ms: f64,
    pub parallel_mean_ms: f64,
    pub speedup: f64,
}

pub fn print_json<T: Serialize>(output: &T) -> Result<()> {
    let payload = serde_json::to_string_pretty(output)?;
    println!("{payload}");
    Ok(())
}

impl fmt::Display for DownloadOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Assets: {}", self.assets)?;
        for entry in &self.files {
            let status = if entry.skipped {
                "present".to_string()
            } else {
                format!("downloaded from {}", entry.mirror.as_deref().unwrap_or("unknown"))
            };
            writeln!(f, "{}: {} bytes ({status})", entry.file, entry.bytes)?;
        }
        Ok(())
    }
}

impl fmt::Display for InspectOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Split: {}", self.split)?;
        writeln!(f, "Images: {}", self.images)?;
        writeln!(f, "Size: {}x{}", self.height, self.width)?;
        writeln!(f, "Labels: {}", self.labels)?;
        for (digit, count) in self.distribution.iter().enumerate() {
            writeln!(f, "  {digit}: {count}")?;
        }
        Ok(())
    }
}

impl fmt::Display for TrainOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Network: {}-{}-{}",
            self.input_nodes, self.hidden_nodes, self.output_nodes
        )?;
        writeln!(f, "Learning rate: {}", self.learning_rate)?;
        writeln!(f, "Samples: {}", self.samples)?;
        for epoch in &self.epochs {
            writeln!(
                f,
                "Epoch {}: loss {:.4} ({} samples, {} ms)",
                epoch.epoch, epoch.mean_loss, epoch.samples, epoch.elapsed_ms
            )?;
        }
        writeln!(f, "Weights: {}", self.weights)?;
        Ok(())
    }
}

impl fmt::Display for EvaluateOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Accuracy: {:.2}%", self.accuracy * 100.0)?;
        writeln!(f, "Correct: {}/{}", self.correct, self.total)?;
        for (digit, accuracy) in self.per_digit.iter().enumerate() {
            match accuracy {
                Some(accuracy) => writeln!(f, "  {digit}: {:.2}%", accuracy * 100.0)?,
                None => writeln!(f, "  {digit}: n/a")?,
            }
        }
        Ok(())
    }
}

impl fmt::Display for PredictOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.canvas)?;
        let ranking: Vec<String> = self.ranking.iter().map(|d| d.to_string()).collect();
        writeln!(f, "Source: {}", self.source)?;
        writeln!(f, "Digit: {}", self.digit)?;
        if let Some(label) = self.label {
            writeln!(f, "Label: {label}")?;
        }
        writeln!(f, "Ranking: [{}]", ranking.join(", "))?;
        let confidences: Vec<String> = self.confidences.iter().map(|c| format!("{c:.4}")).collect();
        writeln!(f, "Confidences: [{}]", confidences.join(", "))?;
        writeln!(f, "Time: {:.3} ms", self.elapsed_ms)?;
        Ok(())
    }
}

impl fmt::Display for ShowOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.canvas)?;
        writeln!(f, "Sample: {} #{}", self.split, self.index)?;
        writeln!(f, "Label: {}", self.label)?;
        Ok(())
    }
}

impl fmt::Display for BenchOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Size: {0}x{0}", self.size)?;
        writeln!(f, "Threads: {}", self.threads)?;
        for (round, (serial, parallel)) in self.serial_ms.iter().zip(&self.parallel_ms).enumerate()
        {
            writeln!(
                f,
                "Round {}: serial {serial:.1} ms, parallel {parallel:.1} ms",
                round + 1
            )?;
        }
        writeln!(f, "Serial mean: {:.1} ms", self.serial_mean_ms)?;
        writeln!(f, "Parallel mean: {:.1} ms", self.parallel_mean_ms)?;
        writeln!(f, "Speedup: {:.2}x", self.speedup)?;
        Ok(())
    }
}
