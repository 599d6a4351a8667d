//! Engine playing through a real audio device
//!
//! Decoding runs on a worker thread, converting to the device rate as it
//! goes; its result is picked up by [`AudioEngine::poll_events`] on the
//! controller's thread. The audio callback and the controller share only the
//! [`PlaybackCursor`], which the callback locks once per buffer.

use super::decoder::{self, OUTPUT_CHANNELS};
use super::output::{self, AudioFrame, AudioOutput, SharedVolume};
use super::{source_path, AudioEngine, EngineEvent, EngineState};
use crate::error::Result;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::oneshot;
use tracing::{debug, error, info};

/// Decoded track and play head, shared with the audio thread
#[derive(Debug, Default)]
struct PlaybackCursor {
    /// Interleaved stereo samples at the output rate
    samples: Vec<f32>,
    frame: usize,
    playing: bool,
    /// Set by the audio thread on natural end, cleared by `poll_events`
    ended: bool,
}

impl PlaybackCursor {
    fn frames(&self) -> usize {
        self.samples.len() / OUTPUT_CHANNELS as usize
    }

    fn next_frame(&mut self) -> AudioFrame {
        if !self.playing {
            return AudioFrame::zero();
        }
        if self.frame >= self.frames() {
            self.playing = false;
            self.frame = 0;
            self.ended = true;
            return AudioFrame::zero();
        }
        let i = self.frame * OUTPUT_CHANNELS as usize;
        self.frame += 1;
        AudioFrame::from_stereo(self.samples[i], self.samples[i + 1])
    }

    /// Fill one output buffer.
    fn fill(&mut self, frames: &mut [AudioFrame]) {
        for frame in frames {
            *frame = self.next_frame();
        }
    }
}

type LoadResult = Result<Vec<f32>>;

/// cpal/symphonia backed engine
pub struct DeviceEngine {
    device_name: Option<String>,
    state: EngineState,
    cursor: Arc<Mutex<PlaybackCursor>>,
    volume: SharedVolume,
    output: Option<AudioOutput>,
    pending: Option<oneshot::Receiver<LoadResult>>,
    events: VecDeque<EngineEvent>,
    sample_rate: u32,
}

impl DeviceEngine {
    /// Engine that will play on `device_name` (default device when `None`).
    pub fn new(device_name: Option<String>) -> Self {
        Self {
            device_name,
            state: EngineState::Unloaded,
            cursor: Arc::new(Mutex::new(PlaybackCursor::default())),
            volume: Arc::new(Mutex::new(1.0)),
            output: None,
            pending: None,
            events: VecDeque::new(),
            sample_rate: 0,
        }
    }

    fn cursor(&self) -> MutexGuard<'_, PlaybackCursor> {
        match self.cursor.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn fail_load(&mut self, reason: String) {
        error!("Failed to load audio source: {}", reason);
        self.state = EngineState::Unloaded;
        self.output = None;
        self.events.push_back(EngineEvent::LoadFailed { reason });
    }

    /// Check on the decode worker and finish loading if it is done.
    fn finish_pending_load(&mut self) {
        let Some(rx) = self.pending.as_mut() else {
            return;
        };
        let result = match rx.try_recv() {
            Ok(result) => result,
            Err(oneshot::error::TryRecvError::Empty) => return,
            Err(oneshot::error::TryRecvError::Closed) => {
                self.pending = None;
                self.fail_load("decode worker exited without a result".to_string());
                return;
            }
        };
        self.pending = None;

        let samples = match result {
            Ok(samples) => samples,
            Err(e) => {
                self.fail_load(e.to_string());
                return;
            }
        };

        {
            let mut cursor = self.cursor();
            cursor.samples = samples;
            cursor.frame = 0;
            cursor.playing = false;
            cursor.ended = false;
        }

        let cursor = Arc::clone(&self.cursor);
        let started = match self.output.as_mut() {
            Some(out) => out.start(move |frames: &mut [AudioFrame]| match cursor.lock() {
                Ok(mut c) => c.fill(frames),
                Err(_) => frames.fill(AudioFrame::zero()),
            }),
            None => Err(crate::error::Error::AudioOutput(
                "output device released during load".to_string(),
            )),
        };
        if let Err(e) = started {
            self.fail_load(e.to_string());
            return;
        }

        let duration = self.duration_of_loaded();
        info!("Track loaded ({:.1}s)", duration);
        self.state = EngineState::Loaded;
        self.events.push_back(EngineEvent::Loaded { duration });
    }

    fn duration_of_loaded(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.cursor().frames() as f64 / self.sample_rate as f64
    }
}

impl AudioEngine for DeviceEngine {
    fn load(&mut self, source: &str) {
        self.unload();
        self.state = EngineState::Loading;

        let output = match AudioOutput::open(self.device_name.as_deref(), Arc::clone(&self.volume)) {
            Ok(output) => output,
            Err(e) => {
                self.fail_load(e.to_string());
                return;
            }
        };
        let target_rate = output.sample_rate();
        self.sample_rate = target_rate;
        self.output = Some(output);

        let path = PathBuf::from(source_path(source));
        let (tx, rx) = oneshot::channel();
        self.pending = Some(rx);

        debug!("Decoding {} on worker thread", path.display());
        std::thread::spawn(move || {
            let result = decoder::decode_file_at_rate(&path, target_rate).map(|audio| audio.samples);
            // Receiver gone means the engine was unloaded mid-decode
            let _ = tx.send(result);
        });
    }

    fn state(&self) -> EngineState {
        self.state
    }

    fn position(&self) -> f64 {
        if !self.is_loaded() || self.sample_rate == 0 {
            return 0.0;
        }
        self.cursor().frame as f64 / self.sample_rate as f64
    }

    fn duration(&self) -> Option<f64> {
        self.is_loaded().then(|| self.duration_of_loaded())
    }

    fn seek(&mut self, seconds: f64) {
        if !self.is_loaded() {
            return;
        }
        let rate = self.sample_rate as f64;
        let mut cursor = self.cursor();
        let target = (seconds.max(0.0) * rate) as usize;
        cursor.frame = target.min(cursor.frames());
    }

    fn play(&mut self) {
        if !self.is_loaded() {
            return;
        }
        self.cursor().playing = true;
    }

    fn pause(&mut self) {
        if !self.is_loaded() {
            return;
        }
        self.cursor().playing = false;
    }

    fn is_playing(&self) -> bool {
        self.cursor().playing
    }

    fn set_volume(&mut self, volume: f32) {
        output::write_volume(&self.volume, volume);
    }

    fn volume(&self) -> f32 {
        output::read_volume(&self.volume)
    }

    fn poll_events(&mut self) -> Vec<EngineEvent> {
        if self.state == EngineState::Loading {
            self.finish_pending_load();
        }
        if self.is_loaded() {
            let ended = std::mem::take(&mut self.cursor().ended);
            if ended {
                debug!("Track reached natural end");
                self.events.push_back(EngineEvent::Ended);
            }
        }
        self.events.drain(..).collect()
    }

    fn unload(&mut self) {
        self.pending = None;
        if let Some(mut out) = self.output.take() {
            out.stop();
        }
        *self.cursor() = PlaybackCursor::default();
        self.state = EngineState::Unloaded;
        self.events.clear();
    }
}

impl Drop for DeviceEngine {
    fn drop(&mut self) {
        self.unload();
    }
}
