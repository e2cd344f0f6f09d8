//! Track loading - decode audio files into engine-rate PCM
//!
//! Decoding happens off the audio thread: a file is probed and decoded
//! with Symphonia, adapted to stereo, resampled to the engine rate with
//! rubato if needed, and only then handed to the engine as a boxed
//! [`LoadedTrack`] through the command queue.

use std::path::{Path, PathBuf};

use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};
use thiserror::Error;

use crate::library::Track;
use crate::types::StereoBuffer;

/// Frames fed to the resampler per iteration
const RESAMPLE_CHUNK: usize = 1024;

/// A fully decoded track, ready for a deck
///
/// `samples` is stereo PCM at `sample_rate`, which always equals the
/// engine's output rate by the time this struct exists.
#[derive(Debug)]
pub struct LoadedTrack {
    pub track: Track,
    pub samples: StereoBuffer,
    pub sample_rate: u32,
}

impl LoadedTrack {
    /// Duration in seconds
    pub fn duration_seconds(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Errors that can occur while loading a track
#[derive(Debug, Error)]
pub enum TrackLoadError {
    #[error("failed to open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported audio format: {0}")]
    UnsupportedFormat(String),

    #[error("file contains no audio: {0}")]
    EmptyFile(PathBuf),

    #[error("resampler construction failed: {0}")]
    ResamplerConstruction(#[from] rubato::ResamplerConstructionError),

    #[error("resampling failed: {0}")]
    Resample(#[from] rubato::ResampleError),
}

/// Decode a library track's file and convert it to engine-rate stereo
pub fn load_track(track: &Track, engine_sample_rate: u32) -> Result<LoadedTrack, TrackLoadError> {
    let (interleaved, file_rate, channels) = decode_audio(&track.path)?;
    if interleaved.is_empty() {
        return Err(TrackLoadError::EmptyFile(track.path.clone()));
    }

    let mut planar = interleaved_to_planar_stereo(&interleaved, channels);

    if file_rate != engine_sample_rate {
        log::debug!(
            "resampling '{}' from {} Hz to {} Hz",
            track.title,
            file_rate,
            engine_sample_rate
        );
        planar = resample_stereo(planar, file_rate, engine_sample_rate)?;
    }

    let samples = StereoBuffer::from_channels(&planar[0], &planar[1]);
    log::info!(
        "loaded '{}' ({} frames at {} Hz)",
        track.title,
        samples.len(),
        engine_sample_rate
    );

    Ok(LoadedTrack {
        track: track.clone(),
        samples,
        sample_rate: engine_sample_rate,
    })
}

/// Decode an audio file to interleaved f32 samples using Symphonia
fn decode_audio(path: &Path) -> Result<(Vec<f32>, u32, u16), TrackLoadError> {
    use std::fs::File;
    use symphonia::core::audio::SampleBuffer;
    use symphonia::core::codecs::DecoderOptions;
    use symphonia::core::formats::FormatOptions;
    use symphonia::core::io::MediaSourceStream;
    use symphonia::core::meta::MetadataOptions;
    use symphonia::core::probe::Hint;

    let file = File::open(path).map_err(|e| TrackLoadError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| TrackLoadError::UnsupportedFormat(e.to_string()))?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != symphonia::core::codecs::CODEC_TYPE_NULL)
        .ok_or_else(|| TrackLoadError::UnsupportedFormat("no audio track found".to_string()))?;

    let track_id = track.id;

    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| TrackLoadError::UnsupportedFormat("unknown sample rate".to_string()))?;

    let channels = track
        .codec_params
        .channels
        .map(|c| c.count() as u16)
        .unwrap_or(2);

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| TrackLoadError::UnsupportedFormat(e.to_string()))?;

    let mut samples: Vec<f32> = Vec::new();
    let mut sample_buf: Option<SampleBuffer<f32>> = None;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(symphonia::core::errors::Error::IoError(e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => {
                log::warn!("error reading packet: {}", e);
                break;
            }
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(e) => {
                log::warn!("error decoding packet: {}", e);
                continue;
            }
        };

        if sample_buf.is_none() {
            let spec = *decoded.spec();
            let duration = decoded.capacity() as u64;
            sample_buf = Some(SampleBuffer::new(duration, spec));
        }

        if let Some(ref mut buf) = sample_buf {
            buf.copy_interleaved_ref(decoded);
            samples.extend_from_slice(buf.samples());
        }
    }

    Ok((samples, sample_rate, channels))
}

/// Adapt interleaved samples of any channel count to planar stereo
///
/// Mono is duplicated to both channels; with more than two channels the
/// first pair is taken and the rest dropped.
fn interleaved_to_planar_stereo(interleaved: &[f32], channels: u16) -> [Vec<f32>; 2] {
    let channels = channels.max(1) as usize;
    let frames = interleaved.len() / channels;
    let mut left = Vec::with_capacity(frames);
    let mut right = Vec::with_capacity(frames);

    for frame in interleaved.chunks_exact(channels) {
        left.push(frame[0]);
        right.push(if channels > 1 { frame[1] } else { frame[0] });
    }
    [left, right]
}

/// Resample planar stereo PCM with a windowed-sinc resampler
fn resample_stereo(
    input: [Vec<f32>; 2],
    from_rate: u32,
    to_rate: u32,
) -> Result<[Vec<f32>; 2], TrackLoadError> {
    let ratio = to_rate as f64 / from_rate as f64;
    let params = SincInterpolationParameters {
        sinc_len: 128,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 128,
        window: WindowFunction::BlackmanHarris2,
    };
    let mut resampler = SincFixedIn::<f32>::new(ratio, 2.0, params, RESAMPLE_CHUNK, 2)?;
    let delay = resampler.output_delay();

    let frames = input[0].len();
    let mut out_left = Vec::with_capacity((frames as f64 * ratio) as usize + RESAMPLE_CHUNK);
    let mut out_right = Vec::with_capacity(out_left.capacity());

    let mut pos = 0;
    while pos + RESAMPLE_CHUNK <= frames {
        let chunk = [
            input[0][pos..pos + RESAMPLE_CHUNK].to_vec(),
            input[1][pos..pos + RESAMPLE_CHUNK].to_vec(),
        ];
        let output = resampler.process(&chunk, None)?;
        out_left.extend_from_slice(&output[0]);
        out_right.extend_from_slice(&output[1]);
        pos += RESAMPLE_CHUNK;
    }

    // Tail shorter than one chunk, then flush the resampler's delay line
    if pos < frames {
        let tail = [input[0][pos..].to_vec(), input[1][pos..].to_vec()];
        let output = resampler.process_partial(Some(&tail), None)?;
        out_left.extend_from_slice(&output[0]);
        out_right.extend_from_slice(&output[1]);
    }
    let output = resampler.process_partial::<Vec<f32>>(None, None)?;
    out_left.extend_from_slice(&output[0]);
    out_right.extend_from_slice(&output[1]);

    // Strip the sinc filter's group delay from the front and the tail
    // padding from the back, so the output is exactly the input length
    // scaled by the rate ratio and loops without a silent seam
    let expected = (frames as f64 * ratio).round() as usize;
    for channel in [&mut out_left, &mut out_right] {
        let delay = delay.min(channel.len());
        channel.drain(..delay);
        channel.truncate(expected);
    }

    Ok([out_left, out_right])
}
