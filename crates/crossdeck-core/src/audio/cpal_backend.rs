//! CPAL audio backend
//!
//! Builds the single stereo output stream and wires it to the engine:
//!
//! ```text
//! ┌──────────────────┐                     ┌─────────────────────┐
//! │     UI Thread    │───push()───────────►│   Command Queue     │
//! │                  │                     │  (lock-free SPSC)   │
//! └──────────────────┘                     └──────────┬──────────┘
//!         │                                           │
//!         │ Relaxed atomics                           │ pop()
//!         ▼                                           ▼
//! ┌──────────────────┐                     ┌─────────────────────┐
//! │   DeckAtomics    │◄────────────────────│  CPAL Audio Thread  │
//! │   (lock-free)    │     sync writes     │  (owns AudioEngine) │
//! └──────────────────┘                     └─────────────────────┘
//! ```
//!
//! The stream is built in a SUSPENDED state: host audio policy wants
//! output started from an explicit user action, so the console calls
//! [`CpalAudioHandle::resume`] on the first play rather than at
//! startup.

use std::sync::Arc;

use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{BufferSize as CpalBufferSize, SampleFormat, Stream, StreamConfig};

use super::config::{AudioConfig, BufferSize, DEFAULT_BUFFER_SIZE, DEFAULT_SAMPLE_RATE, MAX_BUFFER_SIZE};
use super::device::{find_device_by_id, get_cpal_default_device};
use super::error::{AudioError, AudioResult};
use crate::engine::{command_channel, AudioEngine, DeckAtomics, EngineCommand};
use crate::types::{StereoBuffer, NUM_DECKS};

/// Handle that keeps the audio stream alive
///
/// Dropping this stops audio entirely. The stream starts suspended;
/// call [`resume`](Self::resume) to make it audible.
pub struct CpalAudioHandle {
    stream: Stream,
    sample_rate: u32,
    buffer_size: u32,
    running: bool,
}

impl CpalAudioHandle {
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Actual buffer size in frames, as negotiated with the device
    pub fn buffer_size(&self) -> u32 {
        self.buffer_size
    }

    /// Audio latency in milliseconds (one-way, output only)
    pub fn latency_ms(&self) -> f32 {
        (self.buffer_size as f32 / self.sample_rate as f32) * 1000.0
    }

    /// Whether the stream has been resumed
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Start the suspended stream; idempotent once running
    pub fn resume(&mut self) -> AudioResult<()> {
        if self.running {
            return Ok(());
        }
        self.stream
            .play()
            .map_err(|e| AudioError::StreamPlayError(e.to_string()))?;
        self.running = true;
        log::info!("audio stream resumed");
        Ok(())
    }
}

/// Send side of the command queue, owned by the UI thread
pub struct CommandSender {
    producer: rtrb::Producer<EngineCommand>,
}

impl CommandSender {
    /// Queue a command for the audio thread (non-blocking)
    pub fn send(&mut self, cmd: EngineCommand) -> AudioResult<()> {
        self.producer
            .push(cmd)
            .map_err(|_| AudioError::CommandQueueFull)
    }

    pub fn has_space(&self) -> bool {
        self.producer.slots() > 0
    }
}

/// Everything the UI needs after the audio system starts
pub struct AudioSystemResult {
    /// Handle to keep audio alive (drop to stop)
    pub handle: CpalAudioHandle,
    /// Command sender for the UI thread (lock-free)
    pub command_sender: CommandSender,
    /// Deck atomics for lock-free UI reads
    pub deck_atomics: [Arc<DeckAtomics>; NUM_DECKS],
    /// Sample rate of the audio system
    pub sample_rate: u32,
    /// Actual buffer size in frames
    pub buffer_size: u32,
    /// Audio latency in milliseconds
    pub latency_ms: f32,
}

/// Audio callback state, owned exclusively by the stream callback
struct AudioCallbackState {
    engine: AudioEngine,
    command_rx: rtrb::Consumer<EngineCommand>,
    master_buffer: StereoBuffer,
}

impl AudioCallbackState {
    fn new(engine: AudioEngine, command_rx: rtrb::Consumer<EngineCommand>) -> Self {
        Self {
            engine,
            command_rx,
            master_buffer: StereoBuffer::silence(MAX_BUFFER_SIZE),
        }
    }

    fn process(&mut self, n_frames: usize) {
        // Set working buffer length (RT-safe: no allocation)
        self.master_buffer.set_len_from_capacity(n_frames.min(MAX_BUFFER_SIZE));
        self.engine.process_commands(&mut self.command_rx);
        self.engine.process(&mut self.master_buffer);
    }
}

/// Build the audio system with the given configuration
///
/// The engine and command queue are created, the output stream is
/// built, and the stream is left suspended until the first resume.
pub fn start_audio_system(config: &AudioConfig) -> AudioResult<AudioSystemResult> {
    let device = match &config.output_device {
        Some(id) => find_device_by_id(id)?,
        None => get_cpal_default_device()?,
    };

    let device_name = device.name().unwrap_or_else(|_| "Unknown".to_string());
    log::info!("using audio device: {}", device_name);

    let (supported_config, buffer_size) = get_output_config(&device, config)?;
    let sample_rate = supported_config.sample_rate().0;

    let stream_config = StreamConfig {
        channels: supported_config.channels(),
        sample_rate: supported_config.sample_rate(),
        buffer_size: CpalBufferSize::Fixed(buffer_size),
    };

    let latency_ms = (buffer_size as f32 / sample_rate as f32) * 1000.0;
    log::info!(
        "audio config: {} channels, {}Hz, {} frames (~{:.1}ms latency)",
        stream_config.channels,
        sample_rate,
        buffer_size,
        latency_ms
    );

    let engine = AudioEngine::new(sample_rate as f32);
    let deck_atomics = engine.deck_atomics();

    let (command_tx, command_rx) = command_channel();
    let state = AudioCallbackState::new(engine, command_rx);

    let stream = build_output_stream(&device, &stream_config, state)?;
    // Leave the stream suspended; the first play command resumes it
    if let Err(e) = stream.pause() {
        log::debug!("could not suspend stream at startup: {}", e);
    }

    log::info!("audio stream built (suspended until first play)");

    Ok(AudioSystemResult {
        handle: CpalAudioHandle {
            stream,
            sample_rate,
            buffer_size,
            running: false,
        },
        command_sender: CommandSender {
            producer: command_tx,
        },
        deck_atomics,
        sample_rate,
        buffer_size,
        latency_ms,
    })
}

/// Pick the best output configuration for a device
///
/// Prefers f32 stereo at the requested rate (default 48 kHz); falls
/// back to whatever the device offers.
fn get_output_config(
    device: &cpal::Device,
    config: &AudioConfig,
) -> AudioResult<(cpal::SupportedStreamConfig, u32)> {
    let supported_configs: Vec<_> = device
        .supported_output_configs()
        .map_err(|e| AudioError::ConfigError(e.to_string()))?
        .collect();

    if supported_configs.is_empty() {
        return Err(AudioError::ConfigError(
            "No supported output configurations".to_string(),
        ));
    }

    let target_sample_rate = config.sample_rate.unwrap_or(DEFAULT_SAMPLE_RATE);

    let best_config = supported_configs
        .iter()
        .filter(|c| c.sample_format() == SampleFormat::F32)
        .filter(|c| c.channels() >= 2)
        .find(|c| {
            target_sample_rate >= c.min_sample_rate().0
                && target_sample_rate <= c.max_sample_rate().0
        })
        .or_else(|| supported_configs.iter().find(|c| c.channels() >= 2))
        .or_else(|| supported_configs.first())
        .ok_or_else(|| {
            AudioError::ConfigError("No suitable output configuration found".to_string())
        })?;

    let sample_rate = if target_sample_rate >= best_config.min_sample_rate().0
        && target_sample_rate <= best_config.max_sample_rate().0
    {
        cpal::SampleRate(target_sample_rate)
    } else {
        let fallback = best_config.max_sample_rate();
        log::warn!(
            "audio device doesn't support {}Hz, falling back to {}Hz (tracks will be resampled)",
            target_sample_rate,
            fallback.0
        );
        fallback
    };

    let stream_config = best_config.clone().with_sample_rate(sample_rate);

    let buffer_size = match config.buffer_size {
        BufferSize::Default => DEFAULT_BUFFER_SIZE,
        BufferSize::Fixed(frames) => frames.clamp(64, MAX_BUFFER_SIZE as u32),
    };

    Ok((stream_config, buffer_size))
}

/// Build the output stream; the callback takes ownership of the engine
fn build_output_stream(
    device: &cpal::Device,
    config: &StreamConfig,
    mut state: AudioCallbackState,
) -> AudioResult<Stream> {
    let channels = config.channels as usize;

    let stream = device
        .build_output_stream(
            config,
            move |data: &mut [f32], _info: &cpal::OutputCallbackInfo| {
                let n_frames = data.len() / channels;
                state.process(n_frames);

                let samples = state.master_buffer.as_slice();
                for (i, frame) in data.chunks_mut(channels).enumerate() {
                    if i < samples.len() {
                        let sample = samples[i];
                        frame[0] = sample.left;
                        if channels > 1 {
                            frame[1] = sample.right;
                        }
                        for ch in frame.iter_mut().skip(2) {
                            *ch = 0.0;
                        }
                    } else {
                        for ch in frame.iter_mut() {
                            *ch = 0.0;
                        }
                    }
                }
            },
            move |err| {
                log::error!("audio stream error: {}", err);
            },
            None,
        )
        .map_err(|e| AudioError::StreamBuildError(e.to_string()))?;

    Ok(stream)
}
