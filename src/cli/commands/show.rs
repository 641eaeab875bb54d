use crate::cli::commands::{emit, run_blocking, settings};
use crate::cli::ShowArgs;
use crate::core::canvas::render_ascii;
use crate::core::config::{FileConfig, Overrides};
use crate::core::dataset;
use crate::core::error::Result;
use crate::core::output::ShowOutput;

pub async fn run(json: bool, file: &FileConfig, args: ShowArgs) -> Result<()> {
    let settings = settings(
        file,
        Overrides {
            assets: args.assets.clone(),
            ..Overrides::default()
        },
    )?;

    let output = run_blocking("show", move || {
        let samples = dataset::load(&settings.assets, args.set)?;
        let (image, label) = samples.sample(args.index)?;

        let mut pixels = Vec::with_capacity(image.rows());
        for row in 0..image.rows() {
            // values come from raw bytes, so the cast is lossless
            pixels.push(image.row(row)?.iter().map(|&v| v as u8).collect());
        }

        Ok(ShowOutput {
            split: args.set,
            index: args.index,
            label,
            pixels,
            canvas: render_ascii(image),
        })
    })
    .await?;

    emit(json, &output)
}
