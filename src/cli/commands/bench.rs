use crate::cli::commands::{emit, run_blocking};
use crate::cli::BenchArgs;
use crate::core::bench::run_bench;
use crate::core::error::Result;
use crate::core::trainer::new_rng;

pub async fn run(json: bool, args: BenchArgs) -> Result<()> {
    let output = run_blocking("bench", move || {
        let mut rng = new_rng(args.seed);
        run_bench(args.size, args.rounds, &mut rng)
    })
    .await?;
    emit(json, &output)
}
