use std::fmt;

use serde::Serialize;

/// Summary statistics of a PCM16 buffer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SignalStats {
    /// Root mean square amplitude, in sample units.
    pub rms: f32,
    /// Largest sample value.
    pub peak_pos: i16,
    /// Smallest sample value.
    pub peak_neg: i16,
    /// Adjacent pairs whose signs differ. Zero counts as non-negative.
    pub zero_crossings: usize,
}

impl SignalStats {
    /// Computes statistics in a single pass. An empty buffer yields zeros.
    pub fn compute(samples: &[i16]) -> Self {
        let Some((&first, _)) = samples.split_first() else {
            return Self::default();
        };

        let mut sum_sq: i64 = 0;
        let mut peak_pos = first;
        let mut peak_neg = first;
        let mut zero_crossings = 0usize;
        let mut prev_negative = first < 0;

        for &s in samples {
            sum_sq += i64::from(s) * i64::from(s);
            peak_pos = peak_pos.max(s);
            peak_neg = peak_neg.min(s);

            let negative = s < 0;
            if negative != prev_negative {
                zero_crossings += 1;
            }
            prev_negative = negative;
        }

        let rms = (sum_sq as f64 / samples.len() as f64).sqrt() as f32;
        Self {
            rms,
            peak_pos,
            peak_neg,
            zero_crossings,
        }
    }
}

impl fmt::Display for SignalStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "rms={:.1} peaks=[{}, {}] zc={}",
            self.rms, self.peak_neg, self.peak_pos, self.zero_crossings
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_buffer() {
        assert_eq!(SignalStats::compute(&[]), SignalStats::default());
    }

    #[test]
    fn alternating_signs_cross_every_pair() {
        let n = 176_400;
        let samples: Vec<i16> = (0..n).map(|i| if i % 2 == 0 { 100 } else { -100 }).collect();
        let stats = SignalStats::compute(&samples);
        assert_eq!(stats.zero_crossings, n - 1);
        assert_eq!(stats.peak_pos, 100);
        assert_eq!(stats.peak_neg, -100);
        assert!((stats.rms - 100.0).abs() < 1e-3);
    }

    #[test]
    fn zero_is_non_negative() {
        // 0 -> 5 is not a crossing; 5 -> -1 and -1 -> 0 are.
        let stats = SignalStats::compute(&[0, 5, -1, 0]);
        assert_eq!(stats.zero_crossings, 2);
    }

    #[test]
    fn full_scale_does_not_overflow() {
        let samples = vec![i16::MIN; 1000];
        let stats = SignalStats::compute(&samples);
        assert!((stats.rms - 32768.0).abs() < 1e-2);
        assert_eq!(stats.peak_pos, i16::MIN);
        assert_eq!(stats.peak_neg, i16::MIN);
        assert_eq!(stats.zero_crossings, 0);
    }

    #[test]
    fn does_not_mutate_and_is_repeatable() {
        let samples: Vec<i16> = (0..64).map(|i| (i * 37 % 200 - 100) as i16).collect();
        let copy = samples.clone();
        let a = SignalStats::compute(&samples);
        let b = SignalStats::compute(&samples);
        assert_eq!(a, b);
        assert_eq!(samples, copy);
    }

    #[test]
    fn display_format() {
        let stats = SignalStats {
            rms: 12.345,
            peak_pos: 30,
            peak_neg: -20,
            zero_crossings: 4,
        };
        assert_eq!(stats.to_string(), "rms=12.3 peaks=[-20, 30] zc=4");
    }
}
