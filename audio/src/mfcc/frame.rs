//! Single-frame MFCC computation.

use super::basis::SpectralBasis;
use super::config::LOG_EPSILON;
use crate::error::AudioError;
use crate::pool::PoolAllocator;

/// Scratch space for turning one frame of audio into MFCCs.
///
/// The extractor holds no state between frames; every call is a pure function
/// of the audio, the frame index and the (immutable) [`SpectralBasis`]. Only
/// the buffers are reused.
#[derive(Debug)]
pub struct FrameExtractor {
    real: Vec<f32>,
    imag: Vec<f32>,
    mel: Vec<f32>,
}

impl FrameExtractor {
    /// Allocates scratch sized for `basis` through the pool allocator.
    pub fn new(basis: &SpectralBasis, alloc: &mut PoolAllocator) -> Result<Self, AudioError> {
        let cfg = basis.config();
        Ok(Self {
            real: alloc.alloc("frame scratch (real)", cfg.n_fft)?,
            imag: alloc.alloc("frame scratch (imag)", cfg.n_fft)?,
            mel: alloc.alloc("frame scratch (mel)", cfg.n_mels)?,
        })
    }

    /// Heap-allocated scratch for short-lived workers.
    pub fn for_basis(basis: &SpectralBasis) -> Self {
        let cfg = basis.config();
        Self {
            real: vec![0.0; cfg.n_fft],
            imag: vec![0.0; cfg.n_fft],
            mel: vec![0.0; cfg.n_mels],
        }
    }

    /// Mel filterbank energies of frame `frame_index`, before log and DCT.
    pub fn mel_energies(
        &mut self,
        basis: &SpectralBasis,
        audio: &[i16],
        frame_index: usize,
    ) -> &[f32] {
        self.magnitude_spectrum(basis, audio, frame_index);

        let n_bins = basis.n_bins();
        let magnitudes = &self.real[..n_bins];
        for (m, energy) in self.mel.iter_mut().enumerate() {
            *energy = basis
                .filter(m)
                .iter()
                .zip(magnitudes)
                .map(|(w, mag)| w * mag)
                .sum();
        }
        &self.mel
    }

    /// Writes the `n_mfcc` coefficients of frame `frame_index` into `out`.
    pub fn extract(
        &mut self,
        basis: &SpectralBasis,
        audio: &[i16],
        frame_index: usize,
        out: &mut [f32],
    ) {
        debug_assert_eq!(out.len(), basis.config().n_mfcc);

        self.mel_energies(basis, audio, frame_index);
        for e in self.mel.iter_mut() {
            *e = (*e + LOG_EPSILON).ln();
        }

        for (i, coeff) in out.iter_mut().enumerate() {
            *coeff = basis
                .dct_row(i)
                .iter()
                .zip(&self.mel)
                .map(|(d, e)| d * e)
                .sum();
        }
    }

    /// Windowed FFT magnitude of one frame, left in `real[..n_bins]`.
    /// Samples past the end of `audio` are zero.
    fn magnitude_spectrum(&mut self, basis: &SpectralBasis, audio: &[i16], frame_index: usize) {
        let cfg = basis.config();
        let offset = frame_index.saturating_mul(cfg.hop_length);
        let tail = audio.get(offset..).unwrap_or(&[]);

        for (i, (re, w)) in self.real.iter_mut().zip(basis.window()).enumerate() {
            let s = tail.get(i).map_or(0.0, |&s| f32::from(s));
            *re = s * w;
        }
        self.imag.fill(0.0);

        basis.fft().forward(&mut self.real, &mut self.imag);

        for (re, im) in self.real.iter_mut().zip(&self.imag).take(cfg.n_bins()) {
            *re = (*re * *re + im * im).sqrt();
        }
    }
}
