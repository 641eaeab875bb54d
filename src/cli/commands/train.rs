use crate::cli::commands::{emit, run_blocking, settings};
use crate::cli::TrainArgs;
use crate::core::config::{FileConfig, Overrides};
use crate::core::dataset::{self, Split};
use crate::core::error::Result;
use crate::core::output::{EpochSummary, TrainOutput};
use crate::core::trainer::{self, TrainOptions};

pub async fn run(json: bool, file: &FileConfig, args: TrainArgs) -> Result<()> {
    let settings = settings(
        file,
        Overrides {
            hidden: args.hidden,
            learning_rate: args.learning_rate,
            epochs: args.epochs,
            seed: args.seed,
            limit: args.limit,
            assets: args.assets,
            weights: args.weights,
        },
    )?;

    let options = TrainOptions {
        epochs: settings.epochs,
        learning_rate: settings.learning_rate,
        hidden: settings.hidden,
        seed: settings.seed,
        limit: settings.limit,
    };
    let assets = settings.assets.clone();
    let weights = settings.weights.clone();

    let output = run_blocking("train", move || {
        let dataset = dataset::load(&assets, Split::Train)?;
        let (network, reports) = trainer::train(&dataset, &options)?;
        network.save(&weights)?;
        tracing::info!("saved weights to {}", weights.display());

        Ok(TrainOutput {
            samples: dataset.len(),
            input_nodes: network.input_nodes(),
            hidden_nodes: network.hidden_nodes(),
            output_nodes: network.output_nodes(),
            learning_rate: network.learning_rate(),
            seed: options.seed,
            weights: weights.display().to_string(),
            epochs: reports
                .into_iter()
                .map(|report| EpochSummary {
                    epoch: report.epoch,
                    samples: report.samples,
                    mean_loss: report.mean_loss,
                    elapsed_ms: u64::try_from(report.elapsed_ms).unwrap_or(u64::MAX),
                })
                .collect(),
        })
    })
    .await?;

    emit(json, &output)
}
