use crate::cli::commands::{emit, run_blocking, settings};
use crate::cli::InspectArgs;
use crate::core::config::{FileConfig, Overrides};
use crate::core::dataset::{load_images, load_labels};
use crate::core::encoding::DIGITS;
use crate::core::error::Result;
use crate::core::output::InspectOutput;

pub async fn run(json: bool, file: &FileConfig, args: InspectArgs) -> Result<()> {
    let settings = settings(
        file,
        Overrides {
            assets: args.assets,
            ..Overrides::default()
        },
    )?;

    let split = args.set;
    let images_dir = settings.assets.clone();
    let labels_dir = settings.assets;
    let (images, labels) = tokio::join!(
        run_blocking("load images", move || load_images(&images_dir, split)),
        run_blocking("load labels", move || load_labels(&labels_dir, split)),
    );
    let (images, labels) = (images?, labels?);

    let mut distribution = vec![0usize; DIGITS];
    for &label in &labels.labels {
        if let Some(slot) = distribution.get_mut(usize::from(label)) {
            *slot += 1;
        }
    }

    let output = InspectOutput {
        split,
        images: images.count,
        height: images.height,
        width: images.width,
        labels: labels.count,
        distribution,
    };
    emit(json, &output)
}
