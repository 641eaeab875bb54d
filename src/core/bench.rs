//! Serial vs parallel matrix product timing.

use rand::Rng;
use std::time::Instant;

use crate::core::error::{ErrorCode, HandwriteError, Result};
use crate::core::matrix::Matrix;
use crate::core::output::BenchOutput;

pub fn run_bench<R: Rng + ?Sized>(size: usize, rounds: usize, rng: &mut R) -> Result<BenchOutput> {
    if size == 0 || rounds == 0 {
        return Err(HandwriteError::message(
            ErrorCode::InvalidInput,
            "bench size and rounds must be greater than zero",
        ));
    }

    let mut serial_ms = Vec::with_capacity(rounds);
    let mut parallel_ms = Vec::with_capacity(rounds);
    for round in 0..rounds {
        let a = Matrix::normals(size, size, 0.0, 1.0, rng);
        let b = Matrix::normals(size, size, 0.0, 1.0, rng);

        let started = Instant::now();
        a.dot(&b)?;
        serial_ms.push(started.elapsed().as_secs_f64() * 1000.0);

        let started = Instant::now();
        a.dot_parallel(&b)?;
        parallel_ms.push(started.elapsed().as_secs_f64() * 1000.0);

        tracing::debug!(
            round,
            serial_ms = serial_ms[round],
            parallel_ms = parallel_ms[round],
            "bench round"
        );
    }

    let serial_mean = mean(&serial_ms);
    let parallel_mean = mean(&parallel_ms);
    Ok(BenchOutput {
        size,
        rounds,
        threads: rayon::current_num_threads(),
        serial_ms,
        parallel_ms,
        serial_mean_ms: serial_mean,
        parallel_mean_ms: parallel_mean,
        speedup: if parallel_mean > 0.0 {
            serial_mean / parallel_mean
        } else {
            0.0
        },
    })
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn bench_records_every_round() {
        let mut rng = StdRng::seed_from_u64(3);
        let output = run_bench(16, 3, &mut rng).unwrap();
        assert_eq!(output.serial_ms.len(), 3);
        assert_eq!(output.parallel_ms.len(), 3);
        assert!(output.threads >= 1);
        assert!(output.serial_mean_ms >= 0.0);
    }

    #[test]
    fn bench_rejects_empty_runs() {
        let mut rng = StdRng::seed_from_u64(3);
        let err = run_bench(0, 1, &mut rng).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidInput);
        assert!(run_bench(4, 0, &mut rng).is_err());
    }
}
