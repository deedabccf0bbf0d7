use serde::Serialize;

use crate::error::AudioError;

// These values are fixed by the training pipeline of the deployed model.
// Changing any of them requires retraining.

pub const SAMPLE_RATE: usize = 44_100;
pub const AUDIO_DURATION_SECS: usize = 4;
pub const AUDIO_SAMPLES: usize = SAMPLE_RATE * AUDIO_DURATION_SECS; // 176400

pub const N_MFCC: usize = 40;
pub const N_FRAMES: usize = 100;
pub const N_MELS: usize = 40;
pub const N_FFT: usize = 2048;
pub const HOP_LENGTH: usize = (AUDIO_SAMPLES - N_FFT) / (N_FRAMES - 1); // 1761

/// Dataset-wide MFCC mean used for normalization.
pub const MFCC_MEAN: f32 = -8.0306;
/// Dataset-wide MFCC standard deviation used for normalization.
pub const MFCC_STD: f32 = 82.2183;

/// Added to mel energies before the log.
pub const LOG_EPSILON: f32 = 1e-10;

const _: () = assert!((N_FRAMES - 1) * HOP_LENGTH + N_FFT <= AUDIO_SAMPLES + HOP_LENGTH);
const _: () = assert!(N_FFT.is_power_of_two());

/// Configuration for MFCC extraction.
///
/// [`MfccConfig::default`] returns the model constants above. Other values are
/// only meaningful for models trained with matching preprocessing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MfccConfig {
    pub sample_rate: usize,
    /// Samples per recording.
    pub num_samples: usize,
    pub n_fft: usize,
    pub hop_length: usize,
    pub n_mels: usize,
    pub n_mfcc: usize,
    pub n_frames: usize,
    pub mean: f32,
    pub std: f32,
}

impl Default for MfccConfig {
    fn default() -> Self {
        Self {
            sample_rate: SAMPLE_RATE,
            num_samples: AUDIO_SAMPLES,
            n_fft: N_FFT,
            hop_length: HOP_LENGTH,
            n_mels: N_MELS,
            n_mfcc: N_MFCC,
            n_frames: N_FRAMES,
            mean: MFCC_MEAN,
            std: MFCC_STD,
        }
    }
}

impl MfccConfig {
    /// Magnitude bins of the one-sided spectrum.
    pub fn n_bins(&self) -> usize {
        self.n_fft / 2 + 1
    }

    /// Elements in a feature matrix.
    pub fn feature_len(&self) -> usize {
        self.n_mfcc * self.n_frames
    }

    /// Checks the configuration, including the framing invariant
    /// `(n_frames - 1) * hop + n_fft <= num_samples + hop`.
    pub fn validate(&self) -> Result<(), AudioError> {
        let invalid = |msg: String| -> Result<(), AudioError> { Err(AudioError::InvalidConfig(msg)) };

        if self.sample_rate == 0 || self.num_samples == 0 || self.hop_length == 0 {
            return invalid("sample_rate, num_samples and hop_length must be positive".into());
        }
        if self.n_fft < 2 || !self.n_fft.is_power_of_two() {
            return invalid(format!("n_fft must be a power of two >= 2, got {}", self.n_fft));
        }
        if self.n_mels == 0 || self.n_mfcc == 0 || self.n_frames == 0 {
            return invalid("n_mels, n_mfcc and n_frames must be positive".into());
        }
        if !self.mean.is_finite() || !self.std.is_finite() || self.std == 0.0 {
            return invalid(format!("bad normalization mean={} std={}", self.mean, self.std));
        }

        let span = (self.n_frames - 1)
            .checked_mul(self.hop_length)
            .and_then(|v| v.checked_add(self.n_fft));
        let limit = self.num_samples.checked_add(self.hop_length);
        match (span, limit) {
            (Some(span), Some(limit)) if span <= limit => Ok(()),
            _ => invalid(format!(
                "{} frames of {} with hop {} do not fit {} samples",
                self.n_frames, self.n_fft, self.hop_length, self.num_samples
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_constants() {
        assert_eq!(AUDIO_SAMPLES, 176_400);
        assert_eq!(HOP_LENGTH, 1761);
        let cfg = MfccConfig::default();
        assert_eq!(cfg.n_bins(), 1025);
        assert_eq!(cfg.feature_len(), 4000);
        cfg.validate().unwrap();
    }

    #[test]
    fn rejects_non_power_of_two_fft() {
        let cfg = MfccConfig {
            n_fft: 2000,
            ..MfccConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(AudioError::InvalidConfig(_))));
    }

    #[test]
    fn rejects_frames_past_the_tolerance() {
        let cfg = MfccConfig {
            hop_length: 1800,
            ..MfccConfig::default()
        };
        // 99 * 1800 + 2048 = 180248 > 176400 + 1800
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn final_frame_may_overhang_by_one_hop() {
        let cfg = MfccConfig {
            num_samples: 1000,
            n_fft: 256,
            hop_length: 100,
            n_frames: 10,
            ..MfccConfig::default()
        };
        // 9 * 100 + 256 = 1156 <= 1100? no
        assert!(cfg.validate().is_err());

        let cfg = MfccConfig {
            n_frames: 9,
            ..cfg
        };
        // 8 * 100 + 256 = 1056 <= 1100
        cfg.validate().unwrap();
    }

    #[test]
    fn rejects_zero_std() {
        let cfg = MfccConfig {
            std: 0.0,
            ..MfccConfig::default()
        };
        assert!(cfg.validate().is_err());
    }
}
