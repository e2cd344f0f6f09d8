//! Session recording - tap the master bus into a WAV file
//!
//! The audio callback pushes master samples into a lock-free ring; a
//! dedicated writer thread drains the ring into a 32-bit float WAV.
//! The callback side never blocks and never touches the filesystem; if
//! the writer falls behind, samples are dropped rather than stalling
//! the stream.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use chrono::Local;
use thiserror::Error;

use crate::types::{StereoBuffer, StereoSample};

/// Ring capacity in samples (~4 seconds at 48 kHz, far more than the
/// writer thread ever needs)
const RECORD_RING_CAPACITY: usize = 192_000;

/// How long the writer sleeps when the ring is empty
const WRITER_IDLE: Duration = Duration::from_millis(2);

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("failed to create recording directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to spawn recorder writer thread: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("WAV writer error: {0}")]
    Wav(#[from] hound::Error),

    #[error("recorder writer thread panicked")]
    WriterPanicked,
}

/// Producer half of the recording ring, owned by the audio engine
///
/// Writing is wait-free; overflow drops samples and is counted so the
/// shortfall can be reported when the tap is removed.
pub struct RecorderSink {
    producer: rtrb::Producer<StereoSample>,
    dropped: u64,
}

impl RecorderSink {
    /// Push one block of master output into the ring
    pub fn write(&mut self, buffer: &StereoBuffer) {
        for &sample in buffer.iter() {
            if self.producer.push(sample).is_err() {
                self.dropped += 1;
            }
        }
    }
}

impl Drop for RecorderSink {
    fn drop(&mut self) {
        if self.dropped > 0 {
            log::warn!("recording dropped {} samples (writer too slow)", self.dropped);
        }
    }
}

/// Background WAV writer for one recording session
///
/// Created together with its [`RecorderSink`]; the sink travels to the
/// audio thread through the command queue while this half stays with
/// the UI. The writer thread exits once the stop flag is set (or the
/// sink is dropped) and the ring has been drained.
pub struct SessionRecorder {
    path: PathBuf,
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<Result<(), RecordError>>>,
}

impl SessionRecorder {
    /// Start a new recording in `dir` at the given sample rate
    ///
    /// The file is named with a local timestamp, e.g.
    /// `session-2026-08-27_21-30-05.wav`.
    pub fn start(dir: &Path, sample_rate: u32) -> Result<(Self, RecorderSink), RecordError> {
        std::fs::create_dir_all(dir).map_err(|e| RecordError::CreateDir {
            path: dir.to_path_buf(),
            source: e,
        })?;

        let filename = Local::now()
            .format("session-%Y-%m-%d_%H-%M-%S.wav")
            .to_string();
        let path = dir.join(filename);

        let spec = hound::WavSpec {
            channels: 2,
            sample_rate,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let mut writer = hound::WavWriter::create(&path, spec)?;

        let (producer, mut consumer) = rtrb::RingBuffer::<StereoSample>::new(RECORD_RING_CAPACITY);
        let stop = Arc::new(AtomicBool::new(false));
        let thread_stop = Arc::clone(&stop);

        let handle = std::thread::Builder::new()
            .name("recorder-writer".into())
            .spawn(move || -> Result<(), RecordError> {
                loop {
                    let mut wrote = false;
                    while let Ok(sample) = consumer.pop() {
                        writer.write_sample(sample.left)?;
                        writer.write_sample(sample.right)?;
                        wrote = true;
                    }
                    if !wrote {
                        if thread_stop.load(Ordering::Relaxed) || consumer.is_abandoned() {
                            break;
                        }
                        std::thread::sleep(WRITER_IDLE);
                    }
                }
                writer.finalize()?;
                Ok(())
            })
            .map_err(RecordError::Spawn)?;

        log::info!("recording to {}", path.display());

        let sink = RecorderSink {
            producer,
            dropped: 0,
        };
        Ok((
            Self {
                path,
                stop,
                handle: Some(handle),
            },
            sink,
        ))
    }

    /// Path of the file being written
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stop the recording, drain the ring, and finalize the file
    ///
    /// Safe to call even if the sink is still alive on the audio thread;
    /// the stop flag makes the writer exit after draining whatever is
    /// already in the ring.
    pub fn finish(mut self) -> Result<PathBuf, RecordError> {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            handle.join().map_err(|_| RecordError::WriterPanicked)??;
        }
        log::info!("recording finished: {}", self.path.display());
        Ok(self.path.clone())
    }
}

impl Drop for SessionRecorder {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let (recorder, mut sink) = SessionRecorder::start(dir.path(), 48000).unwrap();

        let mut buffer = StereoBuffer::silence(256);
        for (i, s) in buffer.iter_mut().enumerate() {
            *s = StereoSample::new(i as f32 / 256.0, -(i as f32) / 256.0);
        }
        sink.write(&buffer);
        drop(sink);

        let path = recorder.finish().unwrap();
        assert!(path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with("session-") && n.ends_with(".wav")));

        let mut reader = hound::WavReader::open(&path).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 2);
        assert_eq!(spec.sample_rate, 48000);
        assert_eq!(spec.sample_format, hound::SampleFormat::Float);

        let samples: Vec<f32> = reader.samples::<f32>().map(|s| s.unwrap()).collect();
        assert_eq!(samples.len(), 512);
        assert_eq!(samples[2], 1.0 / 256.0);
        assert_eq!(samples[3], -1.0 / 256.0);
    }

    #[test]
    fn test_finish_without_samples_produces_valid_file() {
        let dir = tempfile::tempdir().unwrap();
        let (recorder, sink) = SessionRecorder::start(dir.path(), 44100).unwrap();
        drop(sink);
        let path = recorder.finish().unwrap();

        let reader = hound::WavReader::open(&path).unwrap();
        assert_eq!(reader.len(), 0);
    }
}
