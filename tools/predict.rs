//! Batch prediction tool.
//!
//! Reads a CSV of CAN records, applies the same preprocessing and inference
//! contract as the service (with per-batch median imputation for D5-D7),
//! and writes the table back out with a Predicted_Class column appended.
//! Nothing is written on failure.

use anyhow::{Context, Result};
use can_prediction_service::batch::{predict_frame, Frame};
use can_prediction_service::models::loader::ArtifactLoader;
use clap::Parser;
use std::fs::File;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "predict")]
#[command(about = "Predict classes for new CAN data using the trained model")]
#[command(version)]
struct Args {
    /// Path to input CSV file with new data
    input_csv: PathBuf,

    /// Path to trained model file
    #[arg(long, default_value = "models/classifier.onnx")]
    model: PathBuf,

    /// Path to scaler file
    #[arg(long, default_value = "models/scaler.json")]
    scaler: PathBuf,

    /// Path to save predictions CSV
    #[arg(long = "output_csv", default_value = "predictions_output.csv")]
    output_csv: PathBuf,
}

fn main() {
    let args = Args::parse();

    // Failures are reported as plain messages; there is no exit-code
    // distinction between failure kinds.
    if let Err(e) = run(&args) {
        println!("Error during prediction: {:#}", e);
    }
}

fn run(args: &Args) -> Result<()> {
    let loader = ArtifactLoader::new()?;
    let bundle = loader.load_bundle("classifier", &args.model, &args.scaler)?;

    let input = File::open(&args.input_csv)
        .with_context(|| format!("Failed to open input CSV {}", args.input_csv.display()))?;
    let mut frame = Frame::from_reader(input)?;
    frame.impute_median();

    let predictions = predict_frame(&frame, &bundle)?;

    // All rows predicted; only now is the output file created.
    let output = File::create(&args.output_csv)
        .with_context(|| format!("Failed to create output CSV {}", args.output_csv.display()))?;
    frame.write_augmented(output, &predictions)?;

    println!("Predictions saved to {}", args.output_csv.display());
    Ok(())
}
