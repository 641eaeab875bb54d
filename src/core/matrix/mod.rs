//! Dense row-major matrix used by the network and the dataset parser.

#![allow(dead_code)]

pub mod loader;

use rand::Rng;
use rand_distr::{Distribution, StandardNormal};
use rayon::prelude::*;
use std::fmt;

use crate::core::error::{HandwriteError, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    /// Builds a `1 x n` row vector.
    pub fn from_row(data: Vec<f64>) -> Self {
        Self {
            rows: 1,
            cols: data.len(),
            data,
        }
    }

    /// Builds a row vector from raw bytes, reading each one as unsigned.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self::from_row(bytes.iter().map(|&b| f64::from(b)).collect())
    }

    pub fn from_ints(values: &[i32]) -> Self {
        Self::from_row(values.iter().map(|&v| f64::from(v)).collect())
    }

    pub(crate) fn from_parts(rows: usize, cols: usize, data: Vec<f64>) -> Result<Self> {
        if rows * cols != data.len() {
            return Err(HandwriteError::Reshape {
                rows: 1,
                cols: data.len(),
                target_rows: rows,
                target_cols: cols,
            });
        }
        Ok(Self { rows, cols, data })
    }

    pub fn identity(dimension: usize) -> Self {
        let mut matrix = Self::zeros(dimension, dimension);
        for i in 0..dimension {
            matrix.data[i * dimension + i] = 1.0;
        }
        matrix
    }

    pub fn ones(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![1.0; rows * cols],
        }
    }

    /// Random matrix drawn from a normal distribution with mean `loc` and
    /// standard deviation `scale`.
    pub fn normals<R: Rng + ?Sized>(
        rows: usize,
        cols: usize,
        loc: f64,
        scale: f64,
        rng: &mut R,
    ) -> Self {
        let data = (0..rows * cols)
            .map(|_| {
                let z: f64 = StandardNormal.sample(rng);
                scale * z + loc
            })
            .collect();
        Self { rows, cols, data }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub fn get(&self, row: usize, col: usize) -> Result<f64> {
        let index = self.index(row, col)?;
        Ok(self.data[index])
    }

    pub fn set(&mut self, row: usize, col: usize, value: f64) -> Result<()> {
        let index = self.index(row, col)?;
        self.data[index] = value;
        Ok(())
    }

    pub fn row(&self, row: usize) -> Result<&[f64]> {
        if row >= self.rows {
            return Err(self.out_of_bounds(row, 0));
        }
        let start = row * self.cols;
        Ok(&self.data[start..start + self.cols])
    }

    pub fn reshape(&mut self, rows: usize, cols: usize) -> Result<()> {
        if rows * cols != self.data.len() {
            return Err(HandwriteError::Reshape {
                rows: self.rows,
                cols: self.cols,
                target_rows: rows,
                target_cols: cols,
            });
        }
        self.rows = rows;
        self.cols = cols;
        Ok(())
    }

    pub fn transpose(&self) -> Matrix {
        let mut matrix = Matrix::zeros(self.cols, self.rows);
        for row in 0..self.rows {
            for col in 0..self.cols {
                matrix.data[col * self.rows + row] = self.data[row * self.cols + col];
            }
        }
        matrix
    }

    pub fn same_shape(&self, other: &Matrix) -> bool {
        self.shape() == other.shape()
    }

    pub fn clear(&mut self) {
        self.data.fill(0.0);
    }

    /// Copies the elements of a matrix with the same element count.
    pub fn copy_from(&mut self, other: &Matrix) -> Result<()> {
        if self.len() != other.len() {
            return Err(self.shape_error(other));
        }
        self.data.copy_from_slice(&other.data);
        Ok(())
    }

    pub fn add_assign(&mut self, other: &Matrix) -> Result<()> {
        self.zip_assign(other, |a, b| a + b)
    }

    pub fn add(&self, other: &Matrix) -> Result<Matrix> {
        let mut matrix = self.clone();
        matrix.add_assign(other)?;
        Ok(matrix)
    }

    pub fn sub_assign(&mut self, other: &Matrix) -> Result<()> {
        self.zip_assign(other, |a, b| a - b)
    }

    pub fn sub(&self, other: &Matrix) -> Result<Matrix> {
        let mut matrix = self.clone();
        matrix.sub_assign(other)?;
        Ok(matrix)
    }

    /// Element-wise (Hadamard) product.
    pub fn hadamard_assign(&mut self, other: &Matrix) -> Result<()> {
        self.zip_assign(other, |a, b| a * b)
    }

    pub fn hadamard(&self, other: &Matrix) -> Result<Matrix> {
        let mut matrix = self.clone();
        matrix.hadamard_assign(other)?;
        Ok(matrix)
    }

    pub fn scale_assign(&mut self, factor: f64) {
        self.data.iter_mut().for_each(|value| *value *= factor);
    }

    pub fn scale(&self, factor: f64) -> Matrix {
        let mut matrix = self.clone();
        matrix.scale_assign(factor);
        matrix
    }

    pub fn map_assign<F>(&mut self, f: F)
    where
        F: Fn(f64) -> f64,
    {
        self.data.iter_mut().for_each(|value| *value = f(*value));
    }

    pub fn map<F>(&self, f: F) -> Matrix
    where
        F: Fn(f64) -> f64,
    {
        let mut matrix = self.clone();
        matrix.map_assign(f);
        matrix
    }

    /// Matrix product `self * other`.
    pub fn dot(&self, other: &Matrix) -> Result<Matrix> {
        self.check_dot(other)?;
        let mut matrix = Matrix::zeros(self.rows, other.cols);
        for (row, out) in matrix.data.chunks_mut(other.cols.max(1)).enumerate() {
            self.dot_row(other, row, out);
        }
        Ok(matrix)
    }

    /// Same result as [`Matrix::dot`], with output rows computed on the rayon pool.
    pub fn dot_parallel(&self, other: &Matrix) -> Result<Matrix> {
        self.check_dot(other)?;
        let mut matrix = Matrix::zeros(self.rows, other.cols);
        matrix
            .data
            .par_chunks_mut(other.cols.max(1))
            .enumerate()
            .for_each(|(row, out)| self.dot_row(other, row, out));
        Ok(matrix)
    }

    fn dot_row(&self, other: &Matrix, row: usize, out: &mut [f64]) {
        let lhs = &self.data[row * self.cols..(row + 1) * self.cols];
        for (k, &a) in lhs.iter().enumerate() {
            if a == 0.0 {
                continue;
            }
            let rhs = &other.data[k * other.cols..(k + 1) * other.cols];
            for (slot, &b) in out.iter_mut().zip(rhs) {
                *slot += a * b;
            }
        }
    }

    fn check_dot(&self, other: &Matrix) -> Result<()> {
        if self.cols != other.rows {
            return Err(HandwriteError::Dot {
                left_rows: self.rows,
                left_cols: self.cols,
                right_rows: other.rows,
                right_cols: other.cols,
            });
        }
        Ok(())
    }

    fn zip_assign<F>(&mut self, other: &Matrix, f: F) -> Result<()>
    where
        F: Fn(f64, f64) -> f64,
    {
        if !self.same_shape(other) {
            return Err(self.shape_error(other));
        }
        for (a, &b) in self.data.iter_mut().zip(&other.data) {
            *a = f(*a, b);
        }
        Ok(())
    }

    fn index(&self, row: usize, col: usize) -> Result<usize> {
        if row >= self.rows || col >= self.cols {
            return Err(self.out_of_bounds(row, col));
        }
        Ok(row * self.cols + col)
    }

    fn out_of_bounds(&self, row: usize, col: usize) -> HandwriteError {
        HandwriteError::IndexOutOfBounds {
            row,
            col,
            rows: self.rows,
            cols: self.cols,
        }
    }

    fn shape_error(&self, other: &Matrix) -> HandwriteError {
        HandwriteError::Shape {
            expected_rows: self.rows,
            expected_cols: self.cols,
            rows: other.rows,
            cols: other.cols,
        }
    }
}

impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for row in 0..self.rows {
            if row != 0 {
                write!(f, " ")?;
            }
            write!(f, "[")?;
            let values = &self.data[row * self.cols..(row + 1) * self.cols];
            for (col, value) in values.iter().enumerate() {
                if col != 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{value}")?;
            }
            write!(f, "]")?;
            if row + 1 != self.rows {
                writeln!(f, ",")?;
            }
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ErrorCode;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn matrix(rows: usize, cols: usize, data: &[f64]) -> Matrix {
        Matrix::from_parts(rows, cols, data.to_vec()).unwrap()
    }

    #[test]
    fn from_bytes_reads_unsigned() {
        let m = Matrix::from_bytes(&[0, 128, 255]);
        assert_eq!(m.shape(), (1, 3));
        assert_eq!(m.as_slice(), &[0.0, 128.0, 255.0]);
    }

    #[test]
    fn get_out_of_range_reports_position() {
        let m = Matrix::zeros(2, 3);
        let err = m.get(2, 0).unwrap_err();
        assert_eq!(err.code(), ErrorCode::IndexOutOfBounds);
        assert!(err.to_string().contains("row: 2"));
        assert!(m.get(0, 3).is_err());
    }

    #[test]
    fn set_then_get() {
        let mut m = Matrix::zeros(2, 2);
        m.set(1, 0, 4.5).unwrap();
        assert_eq!(m.get(1, 0).unwrap(), 4.5);
        assert_eq!(m.row(1).unwrap(), &[4.5, 0.0]);
    }

    #[test]
    fn reshape_keeps_data_and_rejects_mismatch() {
        let mut m = Matrix::from_ints(&[1, 2, 3, 4, 5, 6]);
        m.reshape(2, 3).unwrap();
        assert_eq!(m.get(1, 0).unwrap(), 4.0);

        let err = m.reshape(4, 2).unwrap_err();
        assert_eq!(err.code(), ErrorCode::Reshape);
        assert_eq!(m.shape(), (2, 3));
    }

    #[test]
    fn transpose_swaps_axes() {
        let m = matrix(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let t = m.transpose();
        assert_eq!(t.shape(), (3, 2));
        assert_eq!(t.as_slice(), &[1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);
    }

    #[test]
    fn elementwise_ops_require_same_shape() {
        let a = matrix(1, 2, &[1.0, 2.0]);
        let b = matrix(1, 2, &[3.0, 5.0]);
        assert_eq!(a.add(&b).unwrap().as_slice(), &[4.0, 7.0]);
        assert_eq!(b.sub(&a).unwrap().as_slice(), &[2.0, 3.0]);
        assert_eq!(a.hadamard(&b).unwrap().as_slice(), &[3.0, 10.0]);

        let err = a.add(&Matrix::zeros(2, 1)).unwrap_err();
        assert_eq!(err.code(), ErrorCode::Shape);
    }

    #[test]
    fn scale_and_map_leave_original_untouched() {
        let a = matrix(1, 2, &[1.0, -2.0]);
        assert_eq!(a.scale(2.0).as_slice(), &[2.0, -4.0]);
        assert_eq!(a.map(f64::abs).as_slice(), &[1.0, 2.0]);
        assert_eq!(a.as_slice(), &[1.0, -2.0]);
    }

    #[test]
    fn dot_multiplies_and_checks_dimensions() {
        let a = matrix(2, 2, &[1.0, 2.0, 3.0, 4.0]);
        let b = matrix(2, 1, &[5.0, 6.0]);
        assert_eq!(a.dot(&b).unwrap().as_slice(), &[17.0, 39.0]);
        assert_eq!(a.dot(&Matrix::identity(2)).unwrap(), a);

        let err = b.dot(&a).unwrap_err();
        assert_eq!(err.code(), ErrorCode::Dot);
    }

    #[test]
    fn dot_parallel_matches_serial() {
        let mut rng = StdRng::seed_from_u64(7);
        let a = Matrix::normals(17, 23, 0.0, 1.0, &mut rng);
        let b = Matrix::normals(23, 11, 0.0, 1.0, &mut rng);
        let serial = a.dot(&b).unwrap();
        let parallel = a.dot_parallel(&b).unwrap();
        for (x, y) in serial.as_slice().iter().zip(parallel.as_slice()) {
            assert!((x - y).abs() < 1e-12);
        }
    }

    #[test]
    fn normals_follow_requested_distribution() {
        let mut rng = StdRng::seed_from_u64(42);
        let m = Matrix::normals(100, 100, 3.0, 0.5, &mut rng);
        let n = m.len() as f64;
        let mean = m.as_slice().iter().sum::<f64>() / n;
        let var = m.as_slice().iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        assert!((mean - 3.0).abs() < 0.05, "mean {mean}");
        assert!((var.sqrt() - 0.5).abs() < 0.05, "std {}", var.sqrt());
    }

    #[test]
    fn copy_from_and_clear() {
        let mut a = Matrix::zeros(2, 2);
        let b = Matrix::ones(2, 2);
        a.copy_from(&b).unwrap();
        assert_eq!(a, b);
        a.clear();
        assert_eq!(a, Matrix::zeros(2, 2));
        assert!(a.copy_from(&Matrix::ones(1, 3)).is_err());
    }

    #[test]
    fn display_prints_nested_rows() {
        let m = matrix(2, 2, &[1.0, 2.0, 3.0, 4.5]);
        assert_eq!(m.to_string(), "[[1, 2],\n [3, 4.5]]");
    }
}
