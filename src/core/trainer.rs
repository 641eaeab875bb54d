//! Training epochs and test-set evaluation.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::time::Instant;

use crate::core::encoding::{encode_image, encode_label, DIGITS};
use crate::core::error::{ErrorCode, HandwriteError, Result};
use crate::core::mnist::Dataset;
use crate::core::network::{rank, BpNetwork};

#[derive(Debug, Clone, PartialEq)]
pub struct TrainOptions {
    pub epochs: usize,
    pub learning_rate: f64,
    pub hidden: usize,
    pub seed: Option<u64>,
    /// Train on at most this many samples per epoch.
    pub limit: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct EpochReport {
    pub epoch: usize,
    pub samples: usize,
    pub mean_loss: f64,
    pub elapsed_ms: u128,
}

#[derive(Debug, Clone)]
pub struct Evaluation {
    pub total: usize,
    pub correct: usize,
    /// `confusion[label][predicted]`
    pub confusion: [[usize; DIGITS]; DIGITS],
}

impl Evaluation {
    pub fn accuracy(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.correct as f64 / self.total as f64
        }
    }

    /// Accuracy per label; `None` when the label never appeared.
    pub fn per_digit(&self) -> Vec<Option<f64>> {
        self.confusion
            .iter()
            .enumerate()
            .map(|(digit, row)| {
                let seen: usize = row.iter().sum();
                (seen > 0).then(|| row[digit] as f64 / seen as f64)
            })
            .collect()
    }
}

pub fn new_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

/// Builds a fresh network sized for the dataset and trains it.
pub fn train(dataset: &Dataset, options: &TrainOptions) -> Result<(BpNetwork, Vec<EpochReport>)> {
    if dataset.is_empty() {
        return Err(HandwriteError::message(
            ErrorCode::InvalidData,
            "training set is empty",
        ));
    }
    let mut rng = new_rng(options.seed);
    let input_nodes = dataset.images().height * dataset.images().width;
    let mut network = BpNetwork::new(
        input_nodes,
        options.hidden,
        DIGITS,
        options.learning_rate,
        &mut rng,
    );

    let samples = options
        .limit
        .map_or(dataset.len(), |limit| limit.min(dataset.len()));
    let mut order: Vec<usize> = (0..dataset.len()).collect();
    let mut reports = Vec::with_capacity(options.epochs);

    for epoch in 1..=options.epochs {
        let started = Instant::now();
        order.shuffle(&mut rng);

        let mut total_loss = 0.0;
        for &index in order.iter().take(samples) {
            let (image, label) = dataset.sample(index)?;
            total_loss += network.train(&encode_image(image)?, &encode_label(label)?)?;
        }

        let report = EpochReport {
            epoch,
            samples,
            mean_loss: total_loss / samples as f64,
            elapsed_ms: started.elapsed().as_millis(),
        };
        tracing::info!(
            epoch = report.epoch,
            samples = report.samples,
            mean_loss = report.mean_loss,
            elapsed_ms = report.elapsed_ms as u64,
            "epoch finished"
        );
        reports.push(report);
    }

    Ok((network, reports))
}

pub fn evaluate(network: &BpNetwork, dataset: &Dataset, limit: Option<usize>) -> Result<Evaluation> {
    let mut evaluation = Evaluation {
        total: 0,
        correct: 0,
        confusion: [[0; DIGITS]; DIGITS],
    };

    let take = limit.unwrap_or(usize::MAX);
    for (image, label) in dataset.iter().take(take) {
        let output = network.query(&encode_image(image)?)?;
        let predicted = rank(&output).first().copied().unwrap_or(0);
        let label = usize::from(label);
        if label >= DIGITS || predicted >= DIGITS {
            return Err(HandwriteError::message(
                ErrorCode::InvalidData,
                format!("label {label} or prediction {predicted} is not a digit"),
            ));
        }

        evaluation.total += 1;
        if predicted == label {
            evaluation.correct += 1;
        }
        evaluation.confusion[label][predicted] += 1;
    }

    tracing::info!(
        total = evaluation.total,
        correct = evaluation.correct,
        "evaluation finished"
    );
    Ok(evaluation)
}
