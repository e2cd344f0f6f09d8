//! Deck - single track player with transport and signal chain

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use crate::loader::LoadedTrack;
use crate::mapping::{MAX_PLAYBACK_RATE, MIN_PLAYBACK_RATE};
use crate::types::{DeckId, PlayState, StereoBuffer, StereoSample};

use super::DeckChain;

/// Lock-free playback state for UI access
///
/// The audio thread writes these after each processed block; the UI
/// thread polls them for playhead display without any locking. All
/// operations use `Ordering::Relaxed` since only visibility is needed.
pub struct DeckAtomics {
    /// Current playhead position in frames
    pub position: AtomicU64,
    /// Loaded track length in frames (0 = nothing loaded / unknown)
    pub duration: AtomicU64,
    /// Whether the deck is playing
    pub playing: AtomicBool,
}

impl DeckAtomics {
    pub fn new() -> Self {
        Self {
            position: AtomicU64::new(0),
            duration: AtomicU64::new(0),
            playing: AtomicBool::new(false),
        }
    }

    /// Current playhead position in frames (lock-free)
    #[inline]
    pub fn position(&self) -> u64 {
        self.position.load(Ordering::Relaxed)
    }

    /// Track duration in frames, 0 if unknown (lock-free)
    #[inline]
    pub fn duration(&self) -> u64 {
        self.duration.load(Ordering::Relaxed)
    }

    /// Whether the deck is playing (lock-free)
    #[inline]
    pub fn is_playing(&self) -> bool {
        self.playing.load(Ordering::Relaxed)
    }
}

impl Default for DeckAtomics {
    fn default() -> Self {
        Self::new()
    }
}

/// A single deck in the mixing console
///
/// Holds the decoded track, the fractional playhead, and the deck's
/// signal chain. The playhead is fractional because playback rate is
/// continuously variable (0.92x to 1.08x); output samples are produced
/// by linear interpolation between adjacent frames.
pub struct Deck {
    id: DeckId,
    /// Currently loaded track (None = deck is empty)
    track: Option<LoadedTrack>,
    /// Fractional playhead position in frames
    position: f64,
    state: PlayState,
    /// Playback rate multiplier, applied immediately (not smoothed)
    rate: f64,
    /// Stem isolation / EQ / gain pipeline
    chain: DeckChain,
    /// Lock-free state for UI polling
    atomics: Arc<DeckAtomics>,
}

impl Deck {
    /// Create a new empty deck
    pub fn new(id: DeckId) -> Self {
        Self {
            id,
            track: None,
            position: 0.0,
            state: PlayState::Stopped,
            rate: 1.0,
            chain: DeckChain::new(),
            atomics: Arc::new(DeckAtomics::new()),
        }
    }

    /// Get a reference to the lock-free atomic state
    ///
    /// The UI clones this Arc and reads position/state without touching
    /// the audio thread.
    pub fn atomics(&self) -> Arc<DeckAtomics> {
        Arc::clone(&self.atomics)
    }

    #[inline]
    fn sync_state_atomic(&self) {
        self.atomics
            .playing
            .store(self.state == PlayState::Playing, Ordering::Relaxed);
    }

    #[inline]
    fn sync_position_atomic(&self) {
        self.atomics
            .position
            .store(self.position as u64, Ordering::Relaxed);
    }

    pub fn id(&self) -> DeckId {
        self.id
    }

    /// Load a track into this deck
    ///
    /// Replaces any previous track. Loading always stops the deck and
    /// rewinds the playhead, even if it was playing; playback never
    /// auto-starts on load.
    pub fn load_track(&mut self, track: LoadedTrack) {
        let duration = track.samples.len() as u64;
        self.track = Some(track);
        self.position = 0.0;
        self.state = PlayState::Stopped;
        self.chain.reset();

        self.atomics.duration.store(duration, Ordering::Relaxed);
        self.sync_position_atomic();
        self.sync_state_atomic();
    }

    /// Unload the current track
    pub fn unload_track(&mut self) {
        self.track = None;
        self.position = 0.0;
        self.state = PlayState::Stopped;
        self.chain.reset();

        self.atomics.duration.store(0, Ordering::Relaxed);
        self.sync_position_atomic();
        self.sync_state_atomic();
    }

    pub fn has_track(&self) -> bool {
        self.track.is_some()
    }

    pub fn track(&self) -> Option<&LoadedTrack> {
        self.track.as_ref()
    }

    pub fn state(&self) -> PlayState {
        self.state
    }

    /// Current playhead position in frames
    pub fn position(&self) -> u64 {
        self.position as u64
    }

    /// Start/resume playback; no-op on an empty deck
    pub fn play(&mut self) {
        if self.track.is_some() {
            self.state = PlayState::Playing;
            self.sync_state_atomic();
        }
    }

    /// Pause playback, keeping the playhead where it is
    pub fn pause(&mut self) {
        self.state = PlayState::Stopped;
        self.sync_state_atomic();
    }

    /// Set the playback rate multiplier
    ///
    /// Clamped to the tempo fader range. Takes effect at the next block
    /// with no smoothing; a rate change mid-playback is an audible
    /// pitch/tempo shift by design of the control.
    pub fn set_playback_rate(&mut self, rate: f64) {
        self.rate = rate.clamp(MIN_PLAYBACK_RATE as f64, MAX_PLAYBACK_RATE as f64);
    }

    pub fn playback_rate(&self) -> f64 {
        self.rate
    }

    /// Access the deck's signal chain
    pub fn chain_mut(&mut self) -> &mut DeckChain {
        &mut self.chain
    }

    pub fn chain(&self) -> &DeckChain {
        &self.chain
    }

    /// Fill the output buffer with this deck's processed audio
    ///
    /// Reads from the loaded track at the fractional playhead with
    /// linear interpolation, wraps at the end of the track (tracks loop
    /// seamlessly), and runs the result through the signal chain.
    pub fn process(&mut self, output: &mut StereoBuffer, sample_rate: f32) {
        let Some(track) = &self.track else {
            output.fill_silence();
            return;
        };

        if self.state == PlayState::Stopped {
            output.fill_silence();
            return;
        }

        let samples = track.samples.as_slice();
        let duration = samples.len() as f64;
        if samples.is_empty() {
            output.fill_silence();
            return;
        }

        let mut pos = self.position;
        for out in output.iter_mut() {
            let base = pos as usize;
            let frac = (pos - base as f64) as f32;
            let a = samples[base];
            // Interpolate across the loop seam as well
            let b = samples[(base + 1) % samples.len()];
            *out = StereoSample::new(
                a.left + (b.left - a.left) * frac,
                a.right + (b.right - a.right) * frac,
            );

            pos += self.rate;
            // Modulo, not a single subtraction: a rate above 1.0 can
            // overshoot a very short track by more than one length
            if pos >= duration {
                pos %= duration;
            }
        }
        self.position = pos;

        self.chain.process(output, sample_rate);
        self.sync_position_atomic();
    }
}
