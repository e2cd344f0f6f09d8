//! Audio output backend
//!
//! Lock-free bridge between the UI and the real-time stream:
//!
//! - **UI thread**: sends [`crate::engine::EngineCommand`]s through a
//!   lock-free ringbuffer and polls playback state via relaxed atomics
//! - **Audio thread**: owns the [`crate::engine::AudioEngine`]
//!   exclusively inside the cpal callback
//!
//! The stream is created suspended and resumed by the first play
//! action, matching host autoplay policies.

mod config;
mod cpal_backend;
mod device;
mod error;

pub use config::{
    AudioConfig, BufferSize, DeviceId, DEFAULT_BUFFER_SIZE, DEFAULT_SAMPLE_RATE, MAX_BUFFER_SIZE,
};
pub use cpal_backend::{
    start_audio_system, AudioSystemResult, CommandSender, CpalAudioHandle,
};
pub use device::{find_device_by_id, get_cpal_default_device, get_output_devices, AudioDevice};
pub use error::{AudioError, AudioResult};
