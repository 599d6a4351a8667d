//! Sample rate conversion using rubato
//!
//! Decoded lectures are converted to the output device's sample rate while
//! they are decoded, so the playback cursor maps frames to seconds directly.
//! Input arrives in packets of any size and is fed to rubato in fixed-size
//! chunks; only one chunk of planar input is held at a time.

use crate::error::{Error, Result};
use rubato::{FastFixedIn, PolynomialDegree, Resampler as RubatoResampler};
use tracing::debug;

/// Incremental resampler for interleaved audio
pub struct StreamResampler {
    /// `None` when input and output rates match
    inner: Option<FastFixedIn<f32>>,
    /// Output frames per input frame
    ratio: f64,
    channels: usize,
    chunk_frames: usize,
    /// Planar input waiting for a full chunk
    pending: Vec<Vec<f32>>,
}

impl StreamResampler {
    /// Resample from `input_rate` to `output_rate` in chunks of
    /// `chunk_frames` frames.
    pub fn new(input_rate: u32, output_rate: u32, channels: u16, chunk_frames: usize) -> Result<Self> {
        if input_rate == 0 || output_rate == 0 || channels == 0 || chunk_frames == 0 {
            return Err(Error::Decode(format!(
                "Cannot resample {}Hz -> {}Hz with {} channels in {}-frame chunks",
                input_rate, output_rate, channels, chunk_frames
            )));
        }

        let channels = channels as usize;
        let ratio = output_rate as f64 / input_rate as f64;
        let inner = if input_rate == output_rate {
            None
        } else {
            debug!(
                "Resampling from {}Hz to {}Hz ({} channels)",
                input_rate, output_rate, channels
            );
            let resampler = FastFixedIn::<f32>::new(
                ratio,
                1.0,
                PolynomialDegree::Septic,
                chunk_frames,
                channels,
            )
            .map_err(|e| Error::Decode(format!("Failed to create resampler: {}", e)))?;
            Some(resampler)
        };

        Ok(Self {
            inner,
            ratio,
            channels,
            chunk_frames,
            pending: vec![Vec::with_capacity(chunk_frames); channels],
        })
    }

    /// Feed interleaved samples, appending every completed chunk to `output`.
    pub fn push(&mut self, interleaved: &[f32], output: &mut Vec<f32>) -> Result<()> {
        if self.inner.is_none() {
            output.extend_from_slice(interleaved);
            return Ok(());
        }

        for frame in interleaved.chunks_exact(self.channels) {
            for (ch, &sample) in frame.iter().enumerate() {
                self.pending[ch].push(sample);
            }
            if self.pending[0].len() == self.chunk_frames {
                self.process_pending(output)?;
            }
        }
        Ok(())
    }

    /// Flush the final partial chunk.
    pub fn finish(&mut self, output: &mut Vec<f32>) -> Result<()> {
        let Some(resampler) = self.inner.as_mut() else {
            return Ok(());
        };
        if self.pending[0].is_empty() {
            return Ok(());
        }

        // The partial chunk is zero-padded; keep only the frames it maps to
        let expected = (self.pending[0].len() as f64 * self.ratio).ceil() as usize;
        let planar = resampler
            .process_partial(Some(self.pending.as_slice()), None)
            .map_err(|e| Error::Decode(format!("Resampling failed: {}", e)))?;
        interleave_into(&planar, expected, output);
        for channel in &mut self.pending {
            channel.clear();
        }
        Ok(())
    }

    fn process_pending(&mut self, output: &mut Vec<f32>) -> Result<()> {
        let Some(resampler) = self.inner.as_mut() else {
            return Ok(());
        };
        let planar = resampler
            .process(&self.pending, None)
            .map_err(|e| Error::Decode(format!("Resampling failed: {}", e)))?;
        let frames = planar.first().map_or(0, Vec::len);
        interleave_into(&planar, frames, output);
        for channel in &mut self.pending {
            channel.clear();
        }
        Ok(())
    }
}

/// Append the first `frames` frames of `planar` to `output` interleaved.
fn interleave_into(planar: &[Vec<f32>], frames: usize, output: &mut Vec<f32>) {
    let frames = planar.iter().map(Vec::len).fold(frames, usize::min);
    output.reserve(frames * planar.len());
    for frame_idx in 0..frames {
        for channel in planar {
            output.push(channel[frame_idx]);
        }
    }
}
