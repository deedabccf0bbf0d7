//! Full capture-to-classification cycle.

use anyhow::Context as _;
use clap::Args;
use moodlink_inference::{ClassificationResult, DenseEngine, Emotion, ModelInfo};
use moodlink_pipeline::{CycleReport, PipelineContext};
use serde::Serialize;

use super::{open_recording, pipeline_config, print_conditioning, print_json};
use crate::Cli;

/// Classify the emotion of a recording.
#[derive(Args)]
pub struct ClassifyCommand {
    /// Input PCM16 recording ("-" for stdin)
    #[arg(short = 'i', long)]
    input: String,

    /// Dense model document (JSON)
    #[arg(short = 'm', long)]
    model: String,

    /// Normalization target in dBFS (overrides config file)
    #[arg(long, allow_hyphen_values = true)]
    target_db: Option<f32>,
}

#[derive(Serialize)]
struct ClassifyOutput<'a> {
    model: &'a ModelInfo,
    report: &'a CycleReport,
}

impl ClassifyCommand {
    pub fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let cfg = pipeline_config(cli, self.target_db)?;
        let model = std::fs::read(&self.model)
            .with_context(|| format!("read model {}", self.model))?;
        let mut ctx = PipelineContext::new(cfg, DenseEngine::new(), &model)?;
        let mut source = open_recording(&self.input)?;

        let report = ctx.run_cycle(&mut source)?;

        if cli.json {
            return print_json(&ClassifyOutput {
                model: ctx.model_info(),
                report: &report,
            });
        }

        print_conditioning(&report, ctx.samples().len());
        println!();
        if let Some(result) = &report.result {
            print_result(result);
            println!();
        }
        println!("timings:");
        println!("{}", report.timings);
        Ok(())
    }
}

fn print_result(result: &ClassificationResult) {
    if let Some(reason) = result.failure {
        println!("result:     error ({reason})");
        return;
    }

    println!("  emotion        score");
    for (emotion, score) in Emotion::ALL.iter().zip(result.probabilities) {
        let mark = if emotion.index() == result.index { ">" } else { " " };
        println!("{mark} {:<10} {score:>9.4}", emotion.as_str());
    }
    println!();
    println!("result:     {result}");
}
