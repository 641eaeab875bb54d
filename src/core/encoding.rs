//! Conversions between raw samples and network vectors.

use crate::core::error::{ErrorCode, HandwriteError, Result};
use crate::core::matrix::Matrix;

pub const DIGITS: usize = 10;
pub const TARGET_ON: f64 = 0.99;
pub const TARGET_OFF: f64 = 0.01;

const PIXEL_MAX: f64 = 255.0;

/// Flattens a pixel grid to a `1 x n` row scaled into `[0, 1]`.
pub fn encode_image(image: &Matrix) -> Result<Matrix> {
    let mut input = image.map(|pixel| pixel / PIXEL_MAX);
    input.reshape(1, image.len())?;
    Ok(input)
}

pub fn encode_label(label: u8) -> Result<Matrix> {
    let index = usize::from(label);
    if index >= DIGITS {
        return Err(HandwriteError::message(
            ErrorCode::InvalidData,
            format!("label {label} is not a digit"),
        ));
    }
    let mut target = Matrix::from_row(vec![TARGET_OFF; DIGITS]);
    target.set(0, index, TARGET_ON)?;
    Ok(target)
}
