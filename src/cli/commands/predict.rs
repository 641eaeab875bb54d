use std::time::Instant;

use crate::cli::commands::{emit, run_blocking, settings};
use crate::cli::PredictArgs;
use crate::core::canvas::{Canvas, GRID};
use crate::core::config::{FileConfig, Overrides, Settings};
use crate::core::dataset::{self, Split};
use crate::core::error::{ErrorCode, HandwriteError, Result};
use crate::core::matrix::loader::load_csv;
use crate::core::network::{rank, BpNetwork};
use crate::core::output::PredictOutput;

struct Drawing {
    canvas: Canvas,
    source: String,
    label: Option<u8>,
}

pub async fn run(json: bool, file: &FileConfig, args: PredictArgs) -> Result<()> {
    let settings = settings(
        file,
        Overrides {
            assets: args.assets.clone(),
            weights: args.weights.clone(),
            ..Overrides::default()
        },
    )?;

    let output = run_blocking("predict", move || predict(&settings, &args)).await?;
    emit(json, &output)
}

fn predict(settings: &Settings, args: &PredictArgs) -> Result<PredictOutput> {
    let network = BpNetwork::load(&settings.weights, settings.learning_rate)?;
    let drawing = draw(settings, args)?;

    let started = Instant::now();
    let output = network.query(&drawing.canvas.to_input()?)?;
    let ranking = rank(&output);
    let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

    let digit = ranking.first().copied().ok_or_else(|| {
        HandwriteError::message(ErrorCode::InvalidData, "network has no output nodes")
    })?;
    tracing::info!(digit, source = %drawing.source, "prediction finished");

    Ok(PredictOutput {
        source: drawing.source,
        digit,
        ranking,
        confidences: output.as_slice().to_vec(),
        elapsed_ms,
        label: drawing.label,
        canvas: drawing.canvas.render_ascii(),
    })
}

fn draw(settings: &Settings, args: &PredictArgs) -> Result<Drawing> {
    let mut canvas = Canvas::default();

    if let Some(index) = args.sample {
        let test_set = dataset::load(&settings.assets, Split::Test)?;
        let (image, label) = test_set.sample(index)?;
        canvas.load(image)?;
        return Ok(Drawing {
            canvas,
            source: format!("test sample {index}"),
            label: Some(label),
        });
    }

    if let Some(path) = &args.pixels {
        let mut pixels = load_csv(path)?;
        if pixels.shape() == (1, GRID * GRID) {
            pixels.reshape(GRID, GRID)?;
        }
        canvas.load(&pixels)?;
        return Ok(Drawing {
            canvas,
            source: path.display().to_string(),
            label: None,
        });
    }

    let mut landed = 0usize;
    for &point in &args.stroke {
        if canvas.stroke(point)? {
            landed += 1;
        }
    }
    if landed == 0 {
        return Err(HandwriteError::message(
            ErrorCode::InvalidInput,
            "no stroke landed inside the drawing area",
        ));
    }
    Ok(Drawing {
        canvas,
        source: format!("{landed} of {} strokes", args.stroke.len()),
        label: None,
    })
}
