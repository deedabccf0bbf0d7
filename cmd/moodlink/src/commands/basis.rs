use clap::Args;
use moodlink_audio::mfcc::{MfccConfig, SpectralBasis};
use moodlink_audio::pool::PoolAllocator;
use serde::Serialize;

use super::{pipeline_config, print_json};
use crate::Cli;

/// Print the MFCC configuration and mel filter placement.
#[derive(Args)]
pub struct BasisCommand {}

#[derive(Serialize)]
struct FilterInfo {
    index: usize,
    left_bin: usize,
    center_bin: usize,
    right_bin: usize,
    left_hz: f64,
    center_hz: f64,
    right_hz: f64,
}

#[derive(Serialize)]
struct BasisOutput<'a> {
    config: &'a MfccConfig,
    n_bins: usize,
    filters: Vec<FilterInfo>,
}

impl BasisCommand {
    pub fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let cfg = pipeline_config(cli, None)?;
        let mfcc = MfccConfig::default();
        let mut alloc = PoolAllocator::new(cfg.pool);
        let basis = SpectralBasis::new(&mfcc, &mut alloc)?;

        let bin_hz = |bin: usize| bin as f64 * mfcc.sample_rate as f64 / (mfcc.n_fft + 1) as f64;
        let filters: Vec<FilterInfo> = basis
            .filter_edges()
            .windows(3)
            .enumerate()
            .map(|(index, w)| FilterInfo {
                index,
                left_bin: w[0],
                center_bin: w[1],
                right_bin: w[2],
                left_hz: bin_hz(w[0]),
                center_hz: bin_hz(w[1]),
                right_hz: bin_hz(w[2]),
            })
            .collect();

        if cli.json {
            return print_json(&BasisOutput {
                config: &mfcc,
                n_bins: basis.n_bins(),
                filters,
            });
        }

        println!("sample rate:  {} Hz", mfcc.sample_rate);
        println!(
            "recording:    {} samples ({:.2} s)",
            mfcc.num_samples,
            mfcc.num_samples as f64 / mfcc.sample_rate as f64
        );
        println!("fft:          {} points, {} bins, Hamming window", mfcc.n_fft, basis.n_bins());
        println!("hop:          {} samples, {} frames", mfcc.hop_length, mfcc.n_frames);
        println!("mels:         {}", mfcc.n_mels);
        println!("mfcc:         {} (mean {}, std {})", mfcc.n_mfcc, mfcc.mean, mfcc.std);
        println!(
            "memory:       {} bytes internal, {} bytes external",
            alloc.usage().internal,
            alloc.usage().external
        );
        println!();
        println!("  mel   left  centre  right      left Hz    centre Hz     right Hz");
        for f in &filters {
            println!(
                "  {:>3} {:>6} {:>7} {:>6} {:>12.1} {:>12.1} {:>12.1}",
                f.index, f.left_bin, f.center_bin, f.right_bin, f.left_hz, f.center_hz, f.right_hz
            );
        }
        Ok(())
    }
}
