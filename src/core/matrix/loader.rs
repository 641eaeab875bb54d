//! CSV persistence for matrices: one matrix row per line, no header.

use std::path::Path;

use crate::core::error::{ErrorCode, HandwriteError, Result};
use crate::core::matrix::Matrix;

pub fn load_csv(path: &Path) -> Result<Matrix> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|err| {
            HandwriteError::context(
                ErrorCode::Io,
                format!("failed to open {}", path.display()),
                err,
            )
        })?;

    let mut data = Vec::new();
    let mut rows = 0usize;
    let mut cols = None;
    for record in reader.records() {
        let record = record?;
        let line = rows + 1;
        match cols {
            None => cols = Some(record.len()),
            Some(expected) if expected != record.len() => {
                return Err(HandwriteError::message(
                    ErrorCode::InvalidData,
                    format!(
                        "{}: line {line} has {} values, expected {expected}",
                        path.display(),
                        record.len()
                    ),
                ));
            }
            Some(_) => {}
        }
        for field in record.iter() {
            let value = field.parse::<f64>().map_err(|err| {
                HandwriteError::context(
                    ErrorCode::InvalidData,
                    format!("{}: line {line} has invalid number {field:?}", path.display()),
                    err,
                )
            })?;
            data.push(value);
        }
        rows += 1;
    }

    let cols = match cols {
        Some(cols) if cols > 0 => cols,
        _ => {
            return Err(HandwriteError::message(
                ErrorCode::InvalidData,
                format!("{} contains no matrix data", path.display()),
            ))
        }
    };

    Matrix::from_parts(rows, cols, data)
}

pub fn save_csv(matrix: &Matrix, path: &Path) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(|err| {
            HandwriteError::context(
                ErrorCode::Io,
                format!("failed to create {}", path.display()),
                err,
            )
        })?;

    for row in 0..matrix.rows() {
        let values = matrix.row(row)?;
        writer.write_record(values.iter().map(|value| value.to_string()))?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn load_reads_rows_and_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("weights.csv");
        fs::write(&path, "1,2,3\n4.5,-5,6e-3\n").unwrap();

        let matrix = load_csv(&path).unwrap();
        assert_eq!(matrix.shape(), (2, 3));
        assert_eq!(matrix.get(1, 0).unwrap(), 4.5);
        assert_eq!(matrix.get(1, 2).unwrap(), 0.006);
    }

    #[test]
    fn save_then_load_preserves_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("weights.csv");
        let mut matrix = Matrix::from_row(vec![0.1, -1.0 / 3.0, 1e-17, 42.0]);
        matrix.reshape(2, 2).unwrap();

        save_csv(&matrix, &path).unwrap();
        assert_eq!(load_csv(&path).unwrap(), matrix);
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ragged.csv");
        fs::write(&path, "1,2\n3\n").unwrap();

        let err = load_csv(&path).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidData);
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn empty_and_missing_files_fail() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.csv");
        fs::write(&path, "").unwrap();
        assert_eq!(load_csv(&path).unwrap_err().code(), ErrorCode::InvalidData);

        let missing = dir.path().join("missing.csv");
        assert_eq!(load_csv(&missing).unwrap_err().code(), ErrorCode::Io);
    }

    #[test]
    fn non_numeric_field_is_invalid_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("text.csv");
        fs::write(&path, "1,abc\n").unwrap();
        assert_eq!(load_csv(&path).unwrap_err().code(), ErrorCode::InvalidData);
    }
}
