//! Three-layer back-propagation network with sigmoid activation.
//!
//! Vectors are rows: an input `1 x I` is pushed through `I x H` and `H x O`
//! weight matrices to produce a `1 x O` output.

#![allow(dead_code)]

use rand::Rng;
use std::path::Path;

use crate::core::error::{HandwriteError, Result};
use crate::core::matrix::loader::{load_csv, save_csv};
use crate::core::matrix::Matrix;

pub const INPUT_HIDDEN_FILE: &str = "inputHidden.csv";
pub const HIDDEN_OUTPUT_FILE: &str = "hiddenOutput.csv";

#[derive(Debug, Clone)]
pub struct BpNetwork {
    learning_rate: f64,
    input_hidden: Matrix,
    hidden_output: Matrix,
}

pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

impl BpNetwork {
    pub fn new<R: Rng + ?Sized>(
        input_nodes: usize,
        hidden_nodes: usize,
        output_nodes: usize,
        learning_rate: f64,
        rng: &mut R,
    ) -> Self {
        let input_hidden = Matrix::normals(
            input_nodes,
            hidden_nodes,
            0.0,
            (hidden_nodes as f64).powf(-0.5),
            rng,
        );
        let hidden_output = Matrix::normals(
            hidden_nodes,
            output_nodes,
            0.0,
            (output_nodes as f64).powf(-0.5),
            rng,
        );

        Self {
            learning_rate,
            input_hidden,
            hidden_output,
        }
    }

    pub fn from_weights(
        input_hidden: Matrix,
        hidden_output: Matrix,
        learning_rate: f64,
    ) -> Result<Self> {
        if input_hidden.cols() != hidden_output.rows() {
            return Err(HandwriteError::Shape {
                expected_rows: input_hidden.cols(),
                expected_cols: hidden_output.cols(),
                rows: hidden_output.rows(),
                cols: hidden_output.cols(),
            });
        }
        Ok(Self {
            learning_rate,
            input_hidden,
            hidden_output,
        })
    }

    /// Loads `inputHidden.csv` and `hiddenOutput.csv` from `dir`.
    pub fn load(dir: &Path, learning_rate: f64) -> Result<Self> {
        let input_hidden = load_csv(&dir.join(INPUT_HIDDEN_FILE))?;
        let hidden_output = load_csv(&dir.join(HIDDEN_OUTPUT_FILE))?;
        tracing::debug!(
            input_hidden = ?input_hidden.shape(),
            hidden_output = ?hidden_output.shape(),
            "loaded weights from {}",
            dir.display()
        );
        Self::from_weights(input_hidden, hidden_output, learning_rate)
    }

    pub fn save(&self, dir: &Path) -> Result<()> {
        std::fs::create_dir_all(dir)?;
        save_csv(&self.input_hidden, &dir.join(INPUT_HIDDEN_FILE))?;
        save_csv(&self.hidden_output, &dir.join(HIDDEN_OUTPUT_FILE))?;
        Ok(())
    }

    pub fn input_nodes(&self) -> usize {
        self.input_hidden.rows()
    }

    pub fn hidden_nodes(&self) -> usize {
        self.input_hidden.cols()
    }

    pub fn output_nodes(&self) -> usize {
        self.hidden_output.cols()
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    pub fn input_hidden(&self) -> &Matrix {
        &self.input_hidden
    }

    pub fn hidden_output(&self) -> &Matrix {
        &self.hidden_output
    }

    pub fn set_input_hidden(&mut self, weights: Matrix) -> Result<()> {
        check_shape(&self.input_hidden, &weights)?;
        self.input_hidden = weights;
        Ok(())
    }

    pub fn set_hidden_output(&mut self, weights: Matrix) -> Result<()> {
        check_shape(&self.hidden_output, &weights)?;
        self.hidden_output = weights;
        Ok(())
    }

    /// Forward pass; returns the `1 x O` output row.
    pub fn query(&self, input: &Matrix) -> Result<Matrix> {
        let (_, output) = self.forward(input)?;
        Ok(output)
    }

    /// One gradient-descent step on a single sample.
    ///
    /// Returns the summed squared error measured before the weights move.
    pub fn train(&mut self, input: &Matrix, target: &Matrix) -> Result<f64> {
        let (hidden, output) = self.forward(input)?;

        let output_errors = target.sub(&output)?;
        let loss: f64 = output_errors.as_slice().iter().map(|e| e * e).sum();
        // hidden errors use the weights from before this step
        let hidden_errors = output_errors.dot(&self.hidden_output.transpose())?;

        let output_gradient = output_errors
            .hadamard(&output)?
            .hadamard(&output.map(|x| 1.0 - x))?;
        let delta_hidden_output = hidden
            .transpose()
            .dot(&output_gradient)?
            .scale(self.learning_rate);

        let hidden_gradient = hidden_errors
            .hadamard(&hidden)?
            .hadamard(&hidden.map(|x| 1.0 - x))?;
        let delta_input_hidden = input
            .transpose()
            .dot(&hidden_gradient)?
            .scale(self.learning_rate);

        self.hidden_output.add_assign(&delta_hidden_output)?;
        self.input_hidden.add_assign(&delta_input_hidden)?;
        Ok(loss)
    }

    fn forward(&self, input: &Matrix) -> Result<(Matrix, Matrix)> {
        let mut hidden = input.dot(&self.input_hidden)?;
        hidden.map_assign(sigmoid);

        let mut output = hidden.dot(&self.hidden_output)?;
        output.map_assign(sigmoid);
        Ok((hidden, output))
    }
}

/// Output indices ordered from most to least confident. Ties keep index order.
pub fn rank(output: &Matrix) -> Vec<usize> {
    let confidences = output.as_slice();
    let mut order: Vec<usize> = (0..confidences.len()).collect();
    order.sort_by(|&a, &b| confidences[b].total_cmp(&confidences[a]));
    order
}

fn check_shape(current: &Matrix, replacement: &Matrix) -> Result<()> {
    if !current.same_shape(replacement) {
        return Err(HandwriteError::Shape {
            expected_rows: current.rows(),
            expected_cols: current.cols(),
            rows: replacement.rows(),
            cols: replacement.cols(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ErrorCode;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn network(seed: u64) -> BpNetwork {
        let mut rng = StdRng::seed_from_u64(seed);
        BpNetwork::new(4, 6, 2, 0.5, &mut rng)
    }

    #[test]
    fn new_allocates_layer_shapes() {
        let net = network(1);
        assert_eq!(net.input_hidden().shape(), (4, 6));
        assert_eq!(net.hidden_output().shape(), (6, 2));
        assert_eq!(
            (net.input_nodes(), net.hidden_nodes(), net.output_nodes()),
            (4, 6, 2)
        );
    }

    #[test]
    fn query_outputs_probabilities() {
        let net = network(2);
        let output = net
            .query(&Matrix::from_row(vec![0.1, 0.5, 0.9, 0.0]))
            .unwrap();
        assert_eq!(output.shape(), (1, 2));
        assert!(output.as_slice().iter().all(|v| *v > 0.0 && *v < 1.0));
    }

    #[test]
    fn query_rejects_wrong_input_width() {
        let net = network(3);
        let err = net.query(&Matrix::from_row(vec![1.0; 5])).unwrap_err();
        assert_eq!(err.code(), ErrorCode::Dot);
    }

    #[test]
    fn setters_enforce_shape() {
        let mut net = network(4);
        let err = net.set_input_hidden(Matrix::zeros(6, 4)).unwrap_err();
        assert_eq!(err.code(), ErrorCode::Shape);

        net.set_hidden_output(Matrix::ones(6, 2)).unwrap();
        assert_eq!(net.hidden_output(), &Matrix::ones(6, 2));
    }

    #[test]
    fn training_reduces_error_on_a_sample() {
        let mut net = network(5);
        let input = Matrix::from_row(vec![0.9, 0.1, 0.8, 0.2]);
        let target = Matrix::from_row(vec![0.99, 0.01]);

        let first = net.train(&input, &target).unwrap();
        let mut last = first;
        for _ in 0..200 {
            last = net.train(&input, &target).unwrap();
        }
        assert!(last < first / 10.0, "loss went from {first} to {last}");
    }

    #[test]
    fn training_updates_both_layers() {
        let mut net = network(6);
        let before_ih = net.input_hidden().clone();
        let before_ho = net.hidden_output().clone();

        net.train(
            &Matrix::from_row(vec![1.0, 0.5, 0.25, 0.0]),
            &Matrix::from_row(vec![0.01, 0.99]),
        )
        .unwrap();

        assert_ne!(net.input_hidden(), &before_ih);
        assert_ne!(net.hidden_output(), &before_ho);
    }

    #[test]
    fn rank_orders_by_confidence_and_keeps_ties_stable() {
        let output = Matrix::from_row(vec![0.1, 0.7, 0.3, 0.7, 0.05]);
        assert_eq!(rank(&output), vec![1, 3, 2, 0, 4]);
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let net = network(7);
        net.save(dir.path()).unwrap();

        let loaded = BpNetwork::load(dir.path(), 0.2).unwrap();
        assert_eq!(loaded.input_hidden(), net.input_hidden());
        assert_eq!(loaded.hidden_output(), net.hidden_output());
        assert_eq!(loaded.learning_rate(), 0.2);
    }

    #[test]
    fn from_weights_rejects_mismatched_layers() {
        let err = BpNetwork::from_weights(Matrix::zeros(4, 6), Matrix::zeros(5, 2), 0.1)
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::Shape);
    }

    #[test]
    fn sigmoid_is_centered() {
        assert_eq!(sigmoid(0.0), 0.5);
        assert!(sigmoid(10.0) > 0.99);
        assert!(sigmoid(-10.0) < 0.01);
    }
}
