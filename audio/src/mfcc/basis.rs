//! Precomputed analysis matrices: Hamming window, mel filterbank, DCT-II.

use std::f64::consts::PI;

use tracing::info;

use super::config::MfccConfig;
use super::fft::Fft;
use crate::error::AudioError;
use crate::pool::PoolAllocator;

/// Converts frequency in Hz to mel scale.
pub fn hz_to_mel(hz: f64) -> f64 {
    2595.0 * (1.0 + hz / 700.0).log10()
}

/// Converts mel scale frequency back to Hz.
pub fn mel_to_hz(mel: f64) -> f64 {
    700.0 * (10.0_f64.powf(mel / 2595.0) - 1.0)
}

/// Immutable matrices shared by every frame of every recording.
///
/// Built once at startup from an [`MfccConfig`]; all storage is placed through
/// the [`PoolAllocator`] so that a failed allocation surfaces here rather than
/// mid-extraction.
#[derive(Debug)]
pub struct SpectralBasis {
    cfg: MfccConfig,
    window: Vec<f32>,
    filterbank: Vec<f32>,     // [n_mels * n_bins]
    filter_edges: Vec<usize>, // n_mels + 2 bin indices
    dct: Vec<f32>,            // [n_mfcc * n_mels]
    fft: Fft,
}

impl SpectralBasis {
    pub fn new(cfg: &MfccConfig, alloc: &mut PoolAllocator) -> Result<Self, AudioError> {
        cfg.validate()?;
        let n_bins = cfg.n_bins();

        let mut window = alloc.alloc::<f32>("hamming window", cfg.n_fft)?;
        fill_hamming(&mut window);

        let filter_edges = mel_filter_edges(cfg.n_mels, cfg.n_fft, cfg.sample_rate);
        let mut filterbank = alloc.alloc::<f32>("mel filterbank", cfg.n_mels * n_bins)?;
        fill_filterbank(&mut filterbank, &filter_edges, n_bins);

        let mut dct = alloc.alloc::<f32>("dct matrix", cfg.n_mfcc * cfg.n_mels)?;
        fill_dct(&mut dct, cfg.n_mfcc, cfg.n_mels);

        let fft = Fft::new(cfg.n_fft, alloc)?;

        info!(
            n_fft = cfg.n_fft,
            n_mels = cfg.n_mels,
            n_mfcc = cfg.n_mfcc,
            n_frames = cfg.n_frames,
            hop = cfg.hop_length,
            "mfcc: spectral basis ready"
        );

        Ok(Self {
            cfg: cfg.clone(),
            window,
            filterbank,
            filter_edges,
            dct,
            fft,
        })
    }

    pub fn config(&self) -> &MfccConfig {
        &self.cfg
    }

    pub fn n_bins(&self) -> usize {
        self.cfg.n_bins()
    }

    pub fn window(&self) -> &[f32] {
        &self.window
    }

    /// Weights of mel filter `m` over the one-sided spectrum.
    pub fn filter(&self, m: usize) -> &[f32] {
        let n_bins = self.n_bins();
        &self.filterbank[m * n_bins..(m + 1) * n_bins]
    }

    /// Bin indices of the `n_mels + 2` filter break points. Filter `m` spans
    /// `edges[m]..=edges[m + 2]` and peaks at `edges[m + 1]`.
    pub fn filter_edges(&self) -> &[usize] {
        &self.filter_edges
    }

    /// Row `i` of the DCT-II matrix (length `n_mels`).
    pub fn dct_row(&self, i: usize) -> &[f32] {
        let n_mels = self.cfg.n_mels;
        &self.dct[i * n_mels..(i + 1) * n_mels]
    }

    pub fn fft(&self) -> &Fft {
        &self.fft
    }
}

/// `w[i] = 0.54 - 0.46 cos(2 pi i / (n - 1))`
fn fill_hamming(window: &mut [f32]) {
    let n = window.len();
    if n <= 1 {
        window.fill(1.0);
        return;
    }
    for (i, w) in window.iter_mut().enumerate() {
        *w = (0.54 - 0.46 * (2.0 * PI * i as f64 / (n - 1) as f64).cos()) as f32;
    }
}

/// `num_mels + 2` points equally spaced in mel between 0 Hz and Nyquist,
/// mapped to bins with `floor((fft_size + 1) * hz / sample_rate)`.
fn mel_filter_edges(num_mels: usize, fft_size: usize, sample_rate: usize) -> Vec<usize> {
    let low_mel = hz_to_mel(0.0);
    let high_mel = hz_to_mel(sample_rate as f64 / 2.0);
    let step = (high_mel - low_mel) / (num_mels + 1) as f64;

    (0..num_mels + 2)
        .map(|i| {
            let hz = mel_to_hz(low_mel + i as f64 * step);
            ((fft_size + 1) as f64 * hz / sample_rate as f64).floor().max(0.0) as usize
        })
        .collect()
}

fn fill_filterbank(bank: &mut [f32], edges: &[usize], n_bins: usize) {
    bank.fill(0.0);
    for (m, row) in bank.chunks_exact_mut(n_bins).enumerate() {
        let left = edges[m];
        let center = edges[m + 1];
        let right = edges[m + 2];

        for k in left..center.min(n_bins) {
            row[k] = (k - left) as f32 / (center - left) as f32;
        }
        for k in center..right.min(n_bins) {
            row[k] = (right - k) as f32 / (right - center) as f32;
        }
    }
}

/// `D[i][j] = cos(pi i (j + 0.5) / n_mels) * sqrt(2 / n_mels)`
fn fill_dct(dct: &mut [f32], n_mfcc: usize, n_mels: usize) {
    let scale = (2.0 / n_mels as f64).sqrt();
    for i in 0..n_mfcc {
        for j in 0..n_mels {
            let angle = PI * i as f64 * (j as f64 + 0.5) / n_mels as f64;
            dct[i * n_mels + j] = (angle.cos() * scale) as f32;
        }
    }
}
