use crate::cli::commands::{emit, run_blocking, settings};
use crate::cli::EvaluateArgs;
use crate::core::config::{check_limit, FileConfig, Overrides};
use crate::core::dataset::{self, Split};
use crate::core::error::Result;
use crate::core::network::BpNetwork;
use crate::core::output::EvaluateOutput;
use crate::core::trainer;

pub async fn run(json: bool, file: &FileConfig, args: EvaluateArgs) -> Result<()> {
    check_limit("--limit", args.limit)?;
    let settings = settings(
        file,
        Overrides {
            assets: args.assets,
            weights: args.weights,
            ..Overrides::default()
        },
    )?;

    let assets = settings.assets.clone();
    let weights = settings.weights.clone();
    let learning_rate = settings.learning_rate;
    let (test_set, network) = tokio::join!(
        run_blocking("load test set", move || dataset::load(&assets, Split::Test)),
        run_blocking("load weights", move || BpNetwork::load(&weights, learning_rate)),
    );
    let (test_set, network) = (test_set?, network?);

    let limit = args.limit;
    let evaluation =
        run_blocking("evaluate", move || trainer::evaluate(&network, &test_set, limit)).await?;

    let output = EvaluateOutput {
        total: evaluation.total,
        correct: evaluation.correct,
        accuracy: evaluation.accuracy(),
        per_digit: evaluation.per_digit(),
        confusion: evaluation.confusion.iter().map(|row| row.to_vec()).collect(),
    };
    emit(json, &output)
}
