use crate::cli::commands::{emit, settings};
use crate::cli::DownloadArgs;
use crate::core::config::{FileConfig, Overrides};
use crate::core::dataset::DatasetClient;
use crate::core::error::Result;
use crate::core::output::DownloadOutput;

pub async fn run(json: bool, file: &FileConfig, args: DownloadArgs) -> Result<()> {
    let settings = settings(
        file,
        Overrides {
            assets: args.assets,
            ..Overrides::default()
        },
    )?;

    let client = DatasetClient::new(settings.mirrors.clone())?;
    let files = client.download_all(&settings.assets, args.force).await?;

    let output = DownloadOutput {
        assets: settings.assets.display().to_string(),
        files,
    };
    emit(json, &output)
}
