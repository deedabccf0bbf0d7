//! Feature extraction without inference.

use clap::Args;
use moodlink_audio::mfcc::FeatureMatrix;
use moodlink_pipeline::{CycleReport, FeatureStage};
use serde::Serialize;

use super::{open_recording, pipeline_config, print_conditioning, print_json};
use crate::Cli;

/// Condition a recording and print its MFCC feature matrix.
#[derive(Args)]
pub struct FeaturesCommand {
    /// Input PCM16 recording ("-" for stdin)
    #[arg(short = 'i', long)]
    input: String,

    /// Normalization target in dBFS (overrides config file)
    #[arg(long, allow_hyphen_values = true)]
    target_db: Option<f32>,
}

#[derive(Serialize)]
struct FeaturesOutput<'a> {
    report: &'a CycleReport,
    n_mfcc: usize,
    n_frames: usize,
    /// One row per coefficient.
    features: Vec<&'a [f32]>,
}

impl FeaturesCommand {
    pub fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let cfg = pipeline_config(cli, self.target_db)?;
        let mut stage = FeatureStage::new(cfg)?;
        let mut source = open_recording(&self.input)?;

        let report = stage.condition(&mut source)?;
        let features = stage.features();

        if cli.json {
            return print_json(&FeaturesOutput {
                report: &report,
                n_mfcc: features.n_mfcc(),
                n_frames: features.n_frames(),
                features: (0..features.n_mfcc()).map(|c| features.row(c)).collect(),
            });
        }

        print_conditioning(&report, stage.samples().len());
        println!();
        print_summary(features);
        println!();
        println!("timings:");
        println!("{}", report.timings);
        Ok(())
    }
}

fn print_summary(features: &FeatureMatrix) {
    println!(
        "features:   {} coefficients x {} frames",
        features.n_mfcc(),
        features.n_frames()
    );
    println!("  coeff      min       mean        max");
    for c in 0..features.n_mfcc() {
        let row = features.row(c);
        let (min, max) = row
            .iter()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
        let mean = row.iter().sum::<f32>() / row.len().max(1) as f32;
        println!("  {c:>5} {min:>9.4} {mean:>10.4} {max:>10.4}");
    }
}
