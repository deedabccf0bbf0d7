//! Utility functions for CLI commands.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use anyhow::Context as _;
use moodlink_pipeline::{CycleReport, PipelineConfig, ReaderCapture};

use crate::Cli;

/// Loads the pipeline config from `--config`, or the defaults.
pub fn pipeline_config(cli: &Cli, target_db: Option<f32>) -> anyhow::Result<PipelineConfig> {
    let mut cfg = match cli.config.as_deref() {
        Some(path) => PipelineConfig::load(Path::new(path))?,
        None => PipelineConfig::default(),
    };
    if let Some(db) = target_db {
        cfg.target_db = db;
    }
    Ok(cfg)
}

/// Opens a PCM16 recording; "-" is stdin.
pub fn open_recording(path: &str) -> anyhow::Result<ReaderCapture<Box<dyn Read>>> {
    let reader: Box<dyn Read> = if path == "-" {
        Box::new(io::stdin().lock())
    } else {
        let file = File::open(path).with_context(|| format!("open recording {path}"))?;
        Box::new(BufReader::new(file))
    };
    Ok(ReaderCapture::new(reader))
}

/// Prints a value as pretty JSON on stdout.
pub fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Prints the conditioning half of a cycle report.
pub fn print_conditioning(report: &CycleReport, buffer_len: usize) {
    println!(
        "captured:   {} / {} samples ({:.1}%)",
        report.captured,
        buffer_len,
        report.capture_ratio(buffer_len) * 100.0
    );
    println!("before:     {}", report.before);
    if report.silent {
        println!("normalize:  silent input, left untouched");
    } else {
        println!(
            "normalize:  gain {:.3} (peak {} -> {})",
            report.normalization.gain,
            report.normalization.source_peak,
            report.normalization.target_peak
        );
    }
    println!("after:      {}", report.after);
}
