//! PCM16 buffer conditioning.
//!
//! - [`SignalStats`]: RMS, signed peaks and zero-crossing count
//! - [`normalize`]: in-place peak normalization to a dBFS target
//! - [`samples_from_le_bytes`]: little-endian PCM16 decoding

mod normalize;
mod stats;

pub use normalize::{normalize, Normalization, FULL_SCALE};
pub use stats::SignalStats;

/// Decodes little-endian PCM16 bytes into `out`, returning the number of
/// samples written. A trailing odd byte is ignored.
pub fn samples_from_le_bytes(bytes: &[u8], out: &mut [i16]) -> usize {
    let mut n = 0;
    for (dst, pair) in out.iter_mut().zip(bytes.chunks_exact(2)) {
        *dst = i16::from_le_bytes([pair[0], pair[1]]);
        n += 1;
    }
    n
}
