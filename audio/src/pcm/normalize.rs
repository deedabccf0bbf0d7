use serde::Serialize;
use tracing::{debug, warn};

/// Digital full scale for PCM16 (0 dBFS).
pub const FULL_SCALE: f64 = 32767.0;

/// Outcome of [`normalize`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Normalization {
    /// Gain applied to every sample (1.0 for silence).
    pub gain: f32,
    /// Largest absolute sample before normalization.
    pub source_peak: i32,
    /// Peak the buffer was scaled towards.
    pub target_peak: i32,
}

impl Normalization {
    /// True when the buffer was all zeros and left untouched.
    pub fn is_silent(&self) -> bool {
        self.source_peak == 0
    }
}

/// Scales `samples` in place so the largest absolute sample reaches
/// `target_db` relative to full scale.
///
/// Samples are rescaled with rounding and clamped to the i16 range. A silent
/// buffer is left unmodified and reported with a gain of 1.0.
pub fn normalize(samples: &mut [i16], target_db: f32) -> Normalization {
    let target_peak = target_peak(target_db);
    let source_peak = samples
        .iter()
        .map(|&s| i32::from(s).abs())
        .max()
        .unwrap_or(0);

    if source_peak == 0 {
        warn!("normalize: buffer is silent, leaving it untouched");
        return Normalization {
            gain: 1.0,
            source_peak,
            target_peak,
        };
    }

    let gain = f64::from(target_peak) / f64::from(source_peak);
    for s in samples.iter_mut() {
        let scaled = (f64::from(*s) * gain).round();
        *s = scaled.clamp(f64::from(i16::MIN), f64::from(i16::MAX)) as i16;
    }

    debug!(source_peak, target_peak, gain, "normalize: applied gain");
    Normalization {
        gain: gain as f32,
        source_peak,
        target_peak,
    }
}

/// `round(10^(db/20) * 32767)`, saturated to the i32 range.
fn target_peak(target_db: f32) -> i32 {
    let linear = 10f64.powf(f64::from(target_db) / 20.0);
    (linear * FULL_SCALE).round().clamp(0.0, f64::from(i32::MAX)) as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn max_abs(samples: &[i16]) -> i32 {
        samples.iter().map(|&s| i32::from(s).abs()).max().unwrap_or(0)
    }

    #[test]
    fn silence_is_left_untouched() {
        let mut samples = vec![0i16; 1024];
        let n = normalize(&mut samples, -1.0);
        assert_eq!(n.gain, 1.0);
        assert!(n.is_silent());
        assert!(samples.iter().all(|&s| s == 0));
    }

    #[test]
    fn reaches_target_peak() {
        for &db in &[-1.0f32, -3.0, -6.0, -20.0, 0.0] {
            let mut samples: Vec<i16> = (0..4096)
                .map(|i| ((i as f64 * 0.05).sin() * 1234.0) as i16)
                .collect();
            let n = normalize(&mut samples, db);
            let expected = (10f64.powf(db as f64 / 20.0) * 32767.0).round() as i32;
            assert_eq!(n.target_peak, expected);
            assert!(
                (max_abs(&samples) - expected).abs() <= 1,
                "db={db}: peak {} vs {expected}",
                max_abs(&samples)
            );
        }
    }

    #[test]
    fn minus_one_db_target() {
        let mut samples = vec![100i16, -200, 50];
        let n = normalize(&mut samples, -1.0);
        assert_eq!(n.target_peak, 29204);
        assert_eq!(n.source_peak, 200);
        assert_eq!(samples, vec![14602, -29204, 7301]);
    }

    #[test]
    fn most_negative_sample_does_not_overflow() {
        let mut samples = vec![i16::MIN, 0, 16384];
        let n = normalize(&mut samples, 0.0);
        assert_eq!(n.source_peak, 32768);
        assert_eq!(samples[0], -32767);
        assert_eq!(samples[1], 0);
    }

    #[test]
    fn positive_target_clamps() {
        let mut samples = vec![1000i16, -1000, 10];
        normalize(&mut samples, 6.0);
        assert_eq!(samples[0], i16::MAX);
        assert_eq!(samples[1], i16::MIN);
    }

    #[test]
    fn deterministic() {
        let base: Vec<i16> = (0..512).map(|i| (i * 7 % 300 - 150) as i16).collect();
        let mut a = base.clone();
        let mut b = base;
        assert_eq!(normalize(&mut a, -1.0), normalize(&mut b, -1.0));
        assert_eq!(a, b);
    }
}
