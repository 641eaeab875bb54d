//! Command dispatch and handlers.

pub mod bench;
pub mod download;
pub mod evaluate;
pub mod inspect;
pub mod predict;
pub mod show;
pub mod train;

use serde::Serialize;
use std::fmt::Display;
use std::path::Path;

use crate::cli::Command;
use crate::core::config::{FileConfig, Overrides, Settings};
use crate::core::error::{ErrorCode, HandwriteError, Result};
use crate::core::output::print_json;

pub async fn handle(command: Command, json: bool, config: Option<&Path>) -> Result<()> {
    let file = match config {
        Some(path) => FileConfig::from_file(path)?,
        None => FileConfig::default(),
    };

    match command {
        Command::Download(args) => download::run(json, &file, args).await,
        Command::Inspect(args) => inspect::run(json, &file, args).await,
        Command::Train(args) => train::run(json, &file, args).await,
        Command::Evaluate(args) => evaluate::run(json, &file, args).await,
        Command::Predict(args) => predict::run(json, &file, args).await,
        Command::Show(args) => show::run(json, &file, args).await,
        Command::Bench(args) => bench::run(json, args).await,
    }
}

pub(crate) fn settings(file: &FileConfig, overrides: Overrides) -> Result<Settings> {
    let settings = Settings::resolve(file, &overrides)?;
    tracing::debug!(?settings, "resolved settings");
    Ok(settings)
}

pub(crate) fn emit<T>(json: bool, output: &T) -> Result<()>
where
    T: Serialize + Display,
{
    if json {
        print_json(output)
    } else {
        print!("{output}");
        Ok(())
    }
}

/// Runs CPU-bound work off the async executor.
pub(crate) async fn run_blocking<T, F>(label: &str, func: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(func).await.map_err(|err| {
        HandwriteError::message(ErrorCode::TaskFailed, format!("{label} task failed: {err}"))
    })?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn run_blocking_returns_ok_value() {
        let value = run_blocking("ok", || Ok(42)).await.unwrap();
        assert_eq!(value, 42);
    }

    #[tokio::test]
    async fn run_blocking_propagates_error() {
        let err = run_blocking::<(), _>("fail", || {
            Err(HandwriteError::message(ErrorCode::InvalidData, "boom"))
        })
        .await
        .unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidData);
    }

    #[tokio::test]
    async fn run_blocking_maps_panics_to_task_failed() {
        let err = run_blocking::<(), _>("panicky", || panic!("kaboom"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::TaskFailed);
        assert!(err.to_string().contains("panicky task failed"));
    }

    #[tokio::test]
    async fn handle_reports_missing_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("handwrite.toml");
        let command = Command::Bench(crate::cli::BenchArgs {
            size: 2,
            rounds: 1,
            seed: Some(1),
        });

        let err = handle(command, true, Some(&missing)).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::Config);
    }
}
