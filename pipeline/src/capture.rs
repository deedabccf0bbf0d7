//! Audio acquisition boundary.

use std::io::{self, Read};

use moodlink_audio::pcm::samples_from_le_bytes;

use crate::error::CaptureError;

/// A source of fixed-length PCM16 recordings.
///
/// `capture` fills as much of `buf` as it can and returns the number of
/// samples written. Returning `Ok(0)` means nothing was captured.
pub trait Capture {
    fn capture(&mut self, buf: &mut [i16]) -> Result<usize, CaptureError>;
}

impl<C: Capture + ?Sized> Capture for &mut C {
    fn capture(&mut self, buf: &mut [i16]) -> Result<usize, CaptureError> {
        (**self).capture(buf)
    }
}

/// A function that implements the Capture trait.
pub struct CaptureFunc<F>(pub F);

impl<F> Capture for CaptureFunc<F>
where
    F: FnMut(&mut [i16]) -> Result<usize, CaptureError>,
{
    fn capture(&mut self, buf: &mut [i16]) -> Result<usize, CaptureError> {
        (self.0)(buf)
    }
}

/// Reads little-endian PCM16 from any `io::Read` (file, pipe, socket).
///
/// Each capture reads until the buffer is full or the reader is exhausted.
pub struct ReaderCapture<R> {
    reader: R,
    bytes: Vec<u8>,
}

impl<R: Read> ReaderCapture<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            bytes: Vec::new(),
        }
    }

    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: Read> Capture for ReaderCapture<R> {
    fn capture(&mut self, buf: &mut [i16]) -> Result<usize, CaptureError> {
        self.bytes.resize(buf.len() * 2, 0);

        let mut filled = 0;
        while filled < self.bytes.len() {
            match self.reader.read(&mut self.bytes[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }

        Ok(samples_from_le_bytes(&self.bytes[..filled], buf))
    }
}
