//! In-place radix-2 Cooley-Tukey FFT with a precomputed twiddle table.

use std::f64::consts::PI;

use crate::error::AudioError;
use crate::pool::PoolAllocator;

/// Forward FFT plan for a fixed power-of-two length.
#[derive(Debug)]
pub struct Fft {
    n: usize,
    // exp(-2*pi*i*k/n) for k in 0..n/2
    cos: Vec<f32>,
    sin: Vec<f32>,
}

impl Fft {
    /// Builds a plan for length `n`, placing the twiddle table via `alloc`.
    pub fn new(n: usize, alloc: &mut PoolAllocator) -> Result<Self, AudioError> {
        if n < 2 || !n.is_power_of_two() {
            return Err(AudioError::InvalidConfig(format!(
                "fft length must be a power of two >= 2, got {n}"
            )));
        }

        let half = n / 2;
        let mut cos = alloc.alloc::<f32>("fft twiddles (cos)", half)?;
        let mut sin = alloc.alloc::<f32>("fft twiddles (sin)", half)?;
        for k in 0..half {
            let angle = -2.0 * PI * k as f64 / n as f64;
            cos[k] = angle.cos() as f32;
            sin[k] = angle.sin() as f32;
        }

        Ok(Self { n, cos, sin })
    }

    pub fn len(&self) -> usize {
        self.n
    }

    /// Forward transform in place. `real` and `imag` must both have length
    /// [`Fft::len`].
    pub fn forward(&self, real: &mut [f32], imag: &mut [f32]) {
        let n = self.n;
        debug_assert_eq!(real.len(), n);
        debug_assert_eq!(imag.len(), n);

        // Bit-reversal permutation
        let mut j = 0usize;
        for i in 0..n - 1 {
            if i < j {
                real.swap(i, j);
                imag.swap(i, j);
            }
            let mut k = n >> 1;
            while k <= j {
                j -= k;
                k >>= 1;
            }
            j += k;
        }

        // Butterflies
        let mut size = 2;
        while size <= n {
            let half = size >> 1;
            let stride = n / size;

            for start in (0..n).step_by(size) {
                for k in 0..half {
                    let w_r = self.cos[k * stride];
                    let w_i = self.sin[k * stride];
                    let u = start + k;
                    let v = u + half;

                    let t_r = w_r * real[v] - w_i * imag[v];
                    let t_i = w_r * imag[v] + w_i * real[v];

                    real[v] = real[u] - t_r;
                    imag[v] = imag[u] - t_i;
                    real[u] += t_r;
                    imag[u] += t_i;
                }
            }
            size <<= 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan(n: usize) -> Fft {
        Fft::new(n, &mut PoolAllocator::default()).unwrap()
    }

    #[test]
    fn rejects_bad_length() {
        let mut alloc = PoolAllocator::default();
        assert!(Fft::new(0, &mut alloc).is_err());
        assert!(Fft::new(1, &mut alloc).is_err());
        assert!(Fft::new(12, &mut alloc).is_err());
    }

    #[test]
    fn impulse_is_flat() {
        let fft = plan(8);
        let mut real = vec![0.0f32; 8];
        let mut imag = vec![0.0f32; 8];
        real[0] = 1.0;

        fft.forward(&mut real, &mut imag);

        for &v in &real {
            assert!((v - 1.0).abs() < 1e-6);
        }
        for &v in &imag {
            assert!(v.abs() < 1e-6);
        }
    }

    #[test]
    fn matches_naive_dft() {
        let n = 64;
        let fft = plan(n);
        let input: Vec<f32> = (0..n).map(|i| ((i * 13 % 17) as f32 - 8.0) * 0.25).collect();

        let mut real = input.clone();
        let mut imag = vec![0.0f32; n];
        fft.forward(&mut real, &mut imag);

        for k in 0..n {
            let (mut re, mut im) = (0.0f64, 0.0f64);
            for (t, &x) in input.iter().enumerate() {
                let angle = -2.0 * PI * (k * t) as f64 / n as f64;
                re += x as f64 * angle.cos();
                im += x as f64 * angle.sin();
            }
            assert!((real[k] as f64 - re).abs() < 1e-3, "bin {k} real: {} vs {re}", real[k]);
            assert!((imag[k] as f64 - im).abs() < 1e-3, "bin {k} imag: {} vs {im}", imag[k]);
        }
    }

    #[test]
    fn cosine_lands_in_its_bin() {
        let n = 256;
        let fft = plan(n);
        let mut real: Vec<f32> = (0..n)
            .map(|i| (2.0 * PI * 10.0 * i as f64 / n as f64).cos() as f32)
            .collect();
        let mut imag = vec![0.0f32; n];
        fft.forward(&mut real, &mut imag);

        let mag = |k: usize| (real[k] * real[k] + imag[k] * imag[k]).sqrt();
        assert!((mag(10) - n as f32 / 2.0).abs() < 1e-2);
        assert!(mag(11) < 1e-2);
        assert!(mag(0) < 1e-2);
    }
}
