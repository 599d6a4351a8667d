//! Audio decoder using symphonia
//!
//! Decodes a lecture recording (MP3, FLAC, AAC, Vorbis, WAV) into interleaved
//! stereo f32 samples, one packet at a time.

use super::resampler::StreamResampler;
use crate::error::{Error, Result};
use std::fs::File;
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{Decoder, DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, warn};

/// Output channel layout of [`decode_file`]
pub const OUTPUT_CHANNELS: u16 = 2;

/// Decoded PCM ready for playback
#[derive(Debug, Clone)]
pub struct DecodedAudio {
    /// Interleaved stereo samples
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl DecodedAudio {
    pub fn frames(&self) -> usize {
        self.samples.len() / OUTPUT_CHANNELS as usize
    }

    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f64 / self.sample_rate as f64
    }
}

/// Frames handed to the resampler per call while decoding to a new rate
const RESAMPLE_CHUNK_FRAMES: usize = 4096;

fn open_format(path: &Path) -> Result<Box<dyn FormatReader>> {
    let file = File::open(path)
        .map_err(|e| Error::Decode(format!("Failed to open file {}: {}", path.display(), e)))?;

    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| Error::Decode(format!("Failed to probe format: {}", e)))?;

    Ok(probed.format)
}

/// Read the track duration from container metadata without decoding.
///
/// Falls back to a full decode when the container does not declare a frame count.
pub fn probe_duration(path: &Path) -> Result<f64> {
    let format = open_format(path)?;
    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| Error::Decode("No audio track found".to_string()))?;

    let params = &track.codec_params;
    if let (Some(frames), Some(rate)) = (params.n_frames, params.sample_rate) {
        if rate > 0 {
            return Ok(frames as f64 / rate as f64);
        }
    }

    debug!("No frame count in {}, decoding to measure", path.display());
    let mut stream = DecoderStream::open(path)?;
    let mut packet = Vec::new();
    let mut frames = 0usize;
    while stream.next_packet(&mut packet)? {
        frames += packet.len() / OUTPUT_CHANNELS as usize;
        packet.clear();
    }
    Ok(frames as f64 / stream.sample_rate() as f64)
}

/// Packet-at-a-time decoder producing interleaved stereo f32
pub struct DecoderStream {
    format: Box<dyn FormatReader>,
    decoder: Box<dyn Decoder>,
    track_id: u32,
    sample_rate: u32,
    n_frames: Option<u64>,
    buffer: Option<SampleBuffer<f32>>,
}

impl DecoderStream {
    pub fn open(path: &Path) -> Result<Self> {
        debug!("Opening decoder for {}", path.display());
        let format = open_format(path)?;

        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| Error::Decode("No audio track found".to_string()))?;

        let track_id = track.id;
        let n_frames = track.codec_params.n_frames;
        let sample_rate = track
            .codec_params
            .sample_rate
            .filter(|rate| *rate > 0)
            .ok_or_else(|| Error::Decode("Sample rate not found".to_string()))?;

        let decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .map_err(|e| Error::Decode(format!("Failed to create decoder: {}", e)))?;

        Ok(Self {
            format,
            decoder,
            track_id,
            sample_rate,
            n_frames,
            buffer: None,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Frame count declared by the container, if any.
    pub fn n_frames(&self) -> Option<u64> {
        self.n_frames
    }

    /// Decode the next packet of the track and append it to `output` as
    /// stereo. Returns `false` once the stream is exhausted.
    pub fn next_packet(&mut self, output: &mut Vec<f32>) -> Result<bool> {
        loop {
            let packet = match self.format.next_packet() {
                Ok(packet) => packet,
                Err(symphonia::core::errors::Error::IoError(ref e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    return Ok(false);
                }
                Err(e) => {
                    warn!("Error reading packet: {}", e);
                    return Ok(false);
                }
            };

            if packet.track_id() != self.track_id {
                continue;
            }

            let decoded = match self.decoder.decode(&packet) {
                Ok(decoded) => decoded,
                Err(symphonia::core::errors::Error::DecodeError(e)) => {
                    warn!("Skipping corrupt packet: {}", e);
                    continue;
                }
                Err(e) => return Err(Error::Decode(format!("Decode failed: {}", e))),
            };

            let spec = *decoded.spec();
            let channels = spec.channels.count();
            let capacity = decoded.capacity();
            if self
                .buffer
                .as_ref()
                .is_some_and(|buf| buf.capacity() < capacity * channels)
            {
                self.buffer = None;
            }
            let buf = self
                .buffer
                .get_or_insert_with(|| SampleBuffer::<f32>::new(capacity as u64, spec));
            buf.copy_interleaved_ref(decoded);
            push_stereo(buf.samples(), channels, output);
            return Ok(true);
        }
    }
}

/// Decode an entire file to interleaved stereo f32 at its own rate.
///
/// Mono sources are duplicated to both channels; sources with more than two
/// channels keep their first two.
pub fn decode_file(path: &Path) -> Result<DecodedAudio> {
    let mut stream = DecoderStream::open(path)?;
    let mut samples = Vec::with_capacity(estimated_len(stream.n_frames(), 1.0));
    while stream.next_packet(&mut samples)? {}
    finish(path, samples, stream.sample_rate())
}

/// Decode an entire file to interleaved stereo f32 at `output_rate`.
///
/// Packets are resampled in fixed-size chunks as they are decoded, so the
/// returned buffer is the only full-length copy of the track.
pub fn decode_file_at_rate(path: &Path, output_rate: u32) -> Result<DecodedAudio> {
    let mut stream = DecoderStream::open(path)?;
    let ratio = output_rate as f64 / stream.sample_rate() as f64;
    let mut resampler = StreamResampler::new(
        stream.sample_rate(),
        output_rate,
        OUTPUT_CHANNELS,
        RESAMPLE_CHUNK_FRAMES,
    )?;

    let mut samples = Vec::with_capacity(estimated_len(stream.n_frames(), ratio));
    let mut packet = Vec::new();
    while stream.next_packet(&mut packet)? {
        resampler.push(&packet, &mut samples)?;
        packet.clear();
    }
    resampler.finish(&mut samples)?;
    finish(path, samples, output_rate)
}

fn estimated_len(n_frames: Option<u64>, ratio: f64) -> usize {
    n_frames
        .map(|frames| (frames as f64 * ratio).ceil() as usize * OUTPUT_CHANNELS as usize)
        .unwrap_or(0)
}

fn finish(path: &Path, mut samples: Vec<f32>, sample_rate: u32) -> Result<DecodedAudio> {
    if samples.is_empty() {
        return Err(Error::Decode(format!(
            "No audio decoded from {}",
            path.display()
        )));
    }
    samples.shrink_to_fit();

    let audio = DecodedAudio {
        samples,
        sample_rate,
    };
    debug!(
        "Decoded {} frames at {}Hz ({:.1}s)",
        audio.frames(),
        sample_rate,
        audio.duration_secs()
    );
    Ok(audio)
}

/// Append interleaved `channels`-wide samples to `output` as stereo.
fn push_stereo(interleaved: &[f32], channels: usize, output: &mut Vec<f32>) {
    match channels {
        0 => {}
        1 => {
            for &s in interleaved {
                output.push(s);
                output.push(s);
            }
        }
        _ => {
            for frame in interleaved.chunks_exact(channels) {
                output.push(frame[0]);
                output.push(frame[1]);
            }
        }
    }
}
