//! MFCC feature extraction for fixed-length PCM16 recordings.
//!
//! Output is an `[n_mfcc, n_frames]` f32 matrix, row-major by coefficient,
//! normalized with the dataset mean and standard deviation the model was
//! trained with.
//!
//! Default parameters match the deployed emotion model:
//! - SampleRate: 44100
//! - Recording: 4 s (176400 samples)
//! - FFTSize: 2048, Hamming window
//! - Hop: 1761 (100 frames)
//! - NumMels: 40, 0 Hz to Nyquist
//! - NumMFCC: 40 (DCT-II)
//!
//! Per frame: window -> FFT -> magnitude -> mel filterbank -> ln(e + 1e-10)
//! -> DCT. With the `rayon` feature frames are computed in parallel; the
//! output is identical to the serial path.

mod basis;
mod config;
pub mod fft;
mod frame;

#[cfg(feature = "rayon")]
use rayon::prelude::*;
use tracing::debug;

pub use basis::{hz_to_mel, mel_to_hz, SpectralBasis};
pub use config::{
    MfccConfig, AUDIO_DURATION_SECS, AUDIO_SAMPLES, HOP_LENGTH, LOG_EPSILON, MFCC_MEAN, MFCC_STD,
    N_FFT, N_FRAMES, N_MELS, N_MFCC, SAMPLE_RATE,
};
pub use frame::FrameExtractor;

use crate::error::AudioError;
use crate::pool::PoolAllocator;

/// Normalized MFCC matrix, `[n_mfcc][n_frames]` flattened row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    data: Vec<f32>,
    n_mfcc: usize,
    n_frames: usize,
}

impl FeatureMatrix {
    /// Allocates a zeroed matrix shaped for `cfg`.
    pub fn new(cfg: &MfccConfig, alloc: &mut PoolAllocator) -> Result<Self, AudioError> {
        Ok(Self {
            data: alloc.alloc("feature matrix", cfg.feature_len())?,
            n_mfcc: cfg.n_mfcc,
            n_frames: cfg.n_frames,
        })
    }

    /// Wraps existing coefficient-major data.
    pub fn from_vec(n_mfcc: usize, n_frames: usize, data: Vec<f32>) -> Result<Self, AudioError> {
        if data.len() != n_mfcc * n_frames {
            return Err(AudioError::ShapeMismatch {
                what: "feature matrix",
                expected: n_mfcc * n_frames,
                got: data.len(),
            });
        }
        Ok(Self {
            data,
            n_mfcc,
            n_frames,
        })
    }

    pub fn n_mfcc(&self) -> usize {
        self.n_mfcc
    }

    pub fn n_frames(&self) -> usize {
        self.n_frames
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Coefficient `c` at frame `f`.
    pub fn get(&self, c: usize, f: usize) -> f32 {
        self.data[c * self.n_frames + f]
    }

    /// All frames of coefficient `c`.
    pub fn row(&self, c: usize) -> &[f32] {
        &self.data[c * self.n_frames..(c + 1) * self.n_frames]
    }

    fn store_frame(&mut self, f: usize, coeffs: &[f32], mean: f32, std: f32) {
        for (c, &v) in coeffs.iter().enumerate() {
            self.data[c * self.n_frames + f] = (v - mean) / std;
        }
    }
}

/// Slides frames across a whole recording and fills a [`FeatureMatrix`].
#[derive(Debug)]
pub struct FeatureExtractor {
    basis: SpectralBasis,
    frame: FrameExtractor,
    coeffs: Vec<f32>,
}

impl FeatureExtractor {
    /// Creates an extractor owning `basis`; scratch is placed via `alloc`.
    pub fn new(basis: SpectralBasis, alloc: &mut PoolAllocator) -> Result<Self, AudioError> {
        let frame = FrameExtractor::new(&basis, alloc)?;
        let coeffs = alloc.alloc("frame coefficients", basis.config().n_mfcc)?;
        Ok(Self {
            basis,
            frame,
            coeffs,
        })
    }

    pub fn basis(&self) -> &SpectralBasis {
        &self.basis
    }

    pub fn config(&self) -> &MfccConfig {
        self.basis.config()
    }

    /// Raw (un-normalized) MFCCs of one frame.
    pub fn frame_coefficients(&mut self, audio: &[i16], frame_index: usize) -> &[f32] {
        self.frame
            .extract(&self.basis, audio, frame_index, &mut self.coeffs);
        &self.coeffs
    }

    /// Mel filterbank energies of one frame, before log and DCT.
    pub fn mel_energies(&mut self, audio: &[i16], frame_index: usize) -> &[f32] {
        self.frame.mel_energies(&self.basis, audio, frame_index)
    }

    /// Extracts the full normalized feature matrix of `audio` into `out`.
    ///
    /// `audio` must hold exactly `num_samples` samples and `out` must be
    /// shaped `[n_mfcc, n_frames]`.
    pub fn extract_into(&mut self, audio: &[i16], out: &mut FeatureMatrix) -> Result<(), AudioError> {
        self.check_shapes(audio, out)?;

        #[cfg(feature = "rayon")]
        self.extract_parallel(audio, out);
        #[cfg(not(feature = "rayon"))]
        self.extract_serial(audio, out);

        debug!(frames = out.n_frames, "mfcc: extraction complete");
        Ok(())
    }

    /// Frame-by-frame extraction reusing a single scratch buffer.
    pub fn extract_serial(&mut self, audio: &[i16], out: &mut FeatureMatrix) {
        let cfg = self.basis.config();
        let (n_frames, mean, std) = (cfg.n_frames, cfg.mean, cfg.std);

        for f in 0..n_frames {
            self.frame.extract(&self.basis, audio, f, &mut self.coeffs);
            out.store_frame(f, &self.coeffs, mean, std);

            if f % 25 == 0 {
                debug!(frame = f, total = n_frames, "mfcc: progress");
            }
        }
    }

    /// Fans frames out over the rayon pool, one scratch buffer per worker.
    #[cfg(feature = "rayon")]
    pub fn extract_parallel(&self, audio: &[i16], out: &mut FeatureMatrix) {
        let basis = &self.basis;
        let cfg = basis.config();

        let frames: Vec<Vec<f32>> = (0..cfg.n_frames)
            .into_par_iter()
            .map_init(
                || FrameExtractor::for_basis(basis),
                |fx, f| {
                    let mut coeffs = vec![0.0f32; cfg.n_mfcc];
                    fx.extract(basis, audio, f, &mut coeffs);
                    coeffs
                },
            )
            .collect();

        for (f, coeffs) in frames.iter().enumerate() {
            out.store_frame(f, coeffs, cfg.mean, cfg.std);
        }
    }

    fn check_shapes(&self, audio: &[i16], out: &FeatureMatrix) -> Result<(), AudioError> {
        let cfg = self.basis.config();
        if audio.len() != cfg.num_samples {
            return Err(AudioError::ShapeMismatch {
                what: "sample buffer",
                expected: cfg.num_samples,
                got: audio.len(),
            });
        }
        if out.n_mfcc != cfg.n_mfcc || out.n_frames != cfg.n_frames {
            return Err(AudioError::ShapeMismatch {
                what: "feature matrix",
                expected: cfg.feature_len(),
                got: out.len(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::PI;

    use super::*;

    fn setup() -> (FeatureExtractor, FeatureMatrix) {
        let cfg = MfccConfig::default();
        let mut alloc = PoolAllocator::default();
        let basis = SpectralBasis::new(&cfg, &mut alloc).unwrap();
        let extractor = FeatureExtractor::new(basis, &mut alloc).unwrap();
        let features = FeatureMatrix::new(&cfg, &mut alloc).unwrap();
        (extractor, features)
    }

    fn tone(freq: f64, amplitude: f64) -> Vec<i16> {
        (0..AUDIO_SAMPLES)
            .map(|i| {
                (amplitude * (2.0 * PI * freq * i as f64 / SAMPLE_RATE as f64).sin()).round() as i16
            })
            .collect()
    }

    #[test]
    fn extract_sine_wave() {
        let (mut ex, mut features) = setup();
        let audio = tone(440.0, 16_000.0);

        ex.extract_into(&audio, &mut features).unwrap();

        assert_eq!(features.len(), 4000);
        assert_eq!(features.n_mfcc(), 40);
        assert_eq!(features.n_frames(), 100);
        for &v in features.as_slice() {
            assert!(v.is_finite(), "feature value must be finite, got {v}");
        }
    }

    #[test]
    fn layout_is_coefficient_major() {
        let (mut ex, mut features) = setup();
        let audio = tone(1000.0, 8000.0);
        ex.extract_into(&audio, &mut features).unwrap();

        let raw = ex.frame_coefficients(&audio, 7).to_vec();
        for (c, &v) in raw.iter().enumerate() {
            let expected = (v - MFCC_MEAN) / MFCC_STD;
            assert_eq!(features.get(c, 7), expected);
            assert_eq!(features.as_slice()[c * N_FRAMES + 7], expected);
            assert_eq!(features.row(c)[7], expected);
        }
    }

    #[test]
    fn bit_identical_across_runs() {
        let (mut ex, mut first) = setup();
        let audio: Vec<i16> = (0..AUDIO_SAMPLES)
            .map(|i| ((i * 7919 % 20011) as i32 - 10005) as i16)
            .collect();

        ex.extract_into(&audio, &mut first).unwrap();
        let mut second = first.clone();
        ex.extract_serial(&tone(200.0, 500.0), &mut second); // dirty the scratch
        ex.extract_into(&audio, &mut second).unwrap();

        let a: Vec<u32> = first.as_slice().iter().map(|v| v.to_bits()).collect();
        let b: Vec<u32> = second.as_slice().iter().map(|v| v.to_bits()).collect();
        assert_eq!(a, b);
    }

    #[cfg(feature = "rayon")]
    #[test]
    fn parallel_matches_serial() {
        let (mut ex, mut serial) = setup();
        let audio = tone(700.0, 12_000.0);
        let mut parallel = serial.clone();

        ex.extract_serial(&audio, &mut serial);
        ex.extract_parallel(&audio, &mut parallel);
        assert_eq!(serial, parallel);
    }

    #[test]
    fn silence_is_finite() {
        let (mut ex, mut features) = setup();
        ex.extract_into(&vec![0i16; AUDIO_SAMPLES], &mut features).unwrap();
        assert!(features.as_slice().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn rejects_wrong_buffer_length() {
        let (mut ex, mut features) = setup();
        let err = ex.extract_into(&[0i16; 100], &mut features).unwrap_err();
        assert!(matches!(
            err,
            AudioError::ShapeMismatch { what: "sample buffer", expected: 176_400, got: 100 }
        ));
    }

    #[test]
    fn rejects_wrong_matrix_shape() {
        let (mut ex, _) = setup();
        let mut wrong = FeatureMatrix::from_vec(100, 40, vec![0.0; 4000]).unwrap();
        let err = ex
            .extract_into(&vec![0i16; AUDIO_SAMPLES], &mut wrong)
            .unwrap_err();
        assert!(matches!(err, AudioError::ShapeMismatch { what: "feature matrix", .. }));
    }

    #[test]
    fn from_vec_checks_length() {
        assert!(FeatureMatrix::from_vec(2, 3, vec![0.0; 5]).is_err());
        let m = FeatureMatrix::from_vec(2, 3, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        assert_eq!(m.row(1), &[4.0, 5.0, 6.0]);
        assert_eq!(m.get(0, 2), 3.0);
    }
}
