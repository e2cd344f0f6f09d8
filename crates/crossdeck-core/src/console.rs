//! MixerConsole - the control surface facade
//!
//! One object the UI talks to. Control methods are fire-and-forget:
//! they clamp, update the mirrored [`DeckControls`]/[`MixerControls`]
//! state, and queue a command for the audio thread. Failures inside the
//! audio layer are logged, never surfaced as panics; the console keeps
//! working as a silent control surface if no audio device exists.
//!
//! The audio system is brought up lazily by [`ensure_initialized`]
//! (idempotent), and the output stream stays suspended until the first
//! play action resumes it.
//!
//! [`ensure_initialized`]: MixerConsole::ensure_initialized

use std::path::PathBuf;
use std::sync::Arc;

use crate::audio::{start_audio_system, CommandSender, CpalAudioHandle};
use crate::config::ConsoleConfig;
use crate::control::{DeckControls, MixerControls};
use crate::engine::{DeckAtomics, EngineCommand};
use crate::library::Track;
use crate::loader;
use crate::mapping;
use crate::recorder::SessionRecorder;
use crate::types::{DeckId, EqBand, IsolationStem, NUM_DECKS};

/// Live audio system state, present once initialization succeeded
struct Rig {
    handle: CpalAudioHandle,
    commands: CommandSender,
    deck_atomics: [Arc<DeckAtomics>; NUM_DECKS],
    sample_rate: u32,
}

/// The dual-deck mixing console
pub struct MixerConsole {
    config: ConsoleConfig,
    rig: Option<Rig>,
    decks: [DeckControls; NUM_DECKS],
    mixer: MixerControls,
    recorder: Option<SessionRecorder>,
}

impl MixerConsole {
    /// Create a console; no audio resources are touched yet
    pub fn new(config: ConsoleConfig) -> Self {
        Self {
            config,
            rig: None,
            decks: std::array::from_fn(|_| DeckControls::default()),
            mixer: MixerControls::default(),
            recorder: None,
        }
    }

    /// Bring up the audio system if it isn't running yet
    ///
    /// Idempotent: a second call with the rig alive does nothing. On
    /// failure the error is logged and the console stays uninitialized,
    /// so the next user action retries.
    pub fn ensure_initialized(&mut self) {
        if self.rig.is_some() {
            return;
        }
        match start_audio_system(&self.config.audio) {
            Ok(result) => {
                self.rig = Some(Rig {
                    handle: result.handle,
                    commands: result.command_sender,
                    deck_atomics: result.deck_atomics,
                    sample_rate: result.sample_rate,
                });
            }
            Err(e) => {
                log::error!("audio system init failed: {}", e);
            }
        }
    }

    /// Whether the audio system is up
    pub fn is_initialized(&self) -> bool {
        self.rig.is_some()
    }

    fn send(&mut self, cmd: EngineCommand) {
        if let Some(rig) = &mut self.rig {
            if let Err(e) = rig.commands.send(cmd) {
                log::warn!("engine command dropped: {}", e);
            }
        }
    }

    /// Mirrored control state for a deck
    pub fn deck_controls(&self, deck: DeckId) -> &DeckControls {
        &self.decks[deck.index()]
    }

    /// Mirrored control state for the mix bus
    pub fn mixer_controls(&self) -> &MixerControls {
        &self.mixer
    }

    // --- Transport ---

    /// Decode a track and load it onto a deck
    ///
    /// Decoding runs synchronously on the caller's thread; only the
    /// finished PCM crosses to the audio thread. Loading never
    /// auto-starts playback.
    pub fn load_track(&mut self, deck: DeckId, track: &Track) {
        self.ensure_initialized();
        let Some(rig) = &self.rig else {
            log::warn!("cannot load '{}': audio system unavailable", track.title);
            return;
        };

        let loaded = match loader::load_track(track, rig.sample_rate) {
            Ok(loaded) => loaded,
            Err(e) => {
                log::error!("failed to load '{}': {}", track.title, e);
                return;
            }
        };

        self.decks[deck.index()].track = Some(loaded.track.clone());
        self.decks[deck.index()].playing = false;
        self.send(EngineCommand::LoadTrack {
            deck,
            track: Box::new(loaded),
        });
    }

    /// Remove the track from a deck
    pub fn unload_track(&mut self, deck: DeckId) {
        self.decks[deck.index()].track = None;
        self.decks[deck.index()].playing = false;
        self.send(EngineCommand::UnloadTrack { deck });
    }

    /// Start playback on a deck; no-op while the deck is empty
    ///
    /// The first play also resumes the suspended output stream. If the
    /// resume fails it is logged and retried by the next play.
    pub fn play(&mut self, deck: DeckId) {
        self.ensure_initialized();
        if self.decks[deck.index()].track.is_none() {
            return;
        }

        if let Some(rig) = &mut self.rig {
            if let Err(e) = rig.handle.resume() {
                log::error!("could not resume audio stream: {}", e);
                return;
            }
        } else {
            return;
        }

        self.decks[deck.index()].playing = true;
        self.send(EngineCommand::Play { deck });
    }

    /// Pause a deck, keeping the playhead
    pub fn pause(&mut self, deck: DeckId) {
        self.decks[deck.index()].playing = false;
        self.send(EngineCommand::Pause { deck });
    }

    /// Current playhead position in seconds
    pub fn current_time(&self, deck: DeckId) -> f64 {
        match &self.rig {
            Some(rig) => {
                rig.deck_atomics[deck.index()].position() as f64 / rig.sample_rate as f64
            }
            None => 0.0,
        }
    }

    /// Loaded track duration in seconds, 0.0 if unknown
    pub fn duration(&self, deck: DeckId) -> f64 {
        match &self.rig {
            Some(rig) => {
                rig.deck_atomics[deck.index()].duration() as f64 / rig.sample_rate as f64
            }
            None => 0.0,
        }
    }

    // --- Deck controls ---

    /// Set a deck's volume fader (clamped to 0 - 1)
    pub fn set_deck_volume(&mut self, deck: DeckId, volume: f32) {
        let volume = volume.clamp(0.0, 1.0);
        self.decks[deck.index()].volume = volume;
        self.send(EngineCommand::SetDeckGain {
            deck,
            value: volume,
        });
    }

    /// Set an EQ band from a normalized value (-1 - 1, 0 = flat)
    pub fn set_eq(&mut self, deck: DeckId, band: EqBand, value: f32) {
        let value = value.clamp(-1.0, 1.0);
        self.decks[deck.index()].eq[band as usize] = value;
        self.send(EngineCommand::SetEqBand { deck, band, value });
    }

    /// Set an EQ band from a 0-1 knob position (0.5 = flat)
    pub fn set_eq_knob(&mut self, deck: DeckId, band: EqBand, knob: f32) {
        self.set_eq(deck, band, mapping::eq_knob_to_value(knob));
    }

    /// Set stem isolation (0 = silenced, 1 = pass-through)
    pub fn set_stem_isolation(&mut self, deck: DeckId, stem: IsolationStem, value: f32) {
        let value = value.clamp(0.0, 1.0);
        self.decks[deck.index()].stems[stem as usize] = value;
        self.send(EngineCommand::SetStemIsolation { deck, stem, value });
    }

    /// Set the playback rate directly (clamped to 0.92 - 1.08)
    pub fn set_playback_rate(&mut self, deck: DeckId, rate: f64) {
        let rate = rate.clamp(
            mapping::MIN_PLAYBACK_RATE as f64,
            mapping::MAX_PLAYBACK_RATE as f64,
        );
        self.decks[deck.index()].speed = rate;
        self.send(EngineCommand::SetPlaybackRate { deck, rate });
    }

    /// Set the playback rate from the 0-1 tempo fader (0.5 = 1.0x)
    pub fn set_tempo_fader(&mut self, deck: DeckId, fader: f32) {
        self.set_playback_rate(deck, mapping::tempo_fader_to_rate(fader) as f64);
    }

    // --- Mix bus ---

    /// Set the crossfader position (-1 = deck A, +1 = deck B)
    pub fn set_crossfader(&mut self, position: f32) {
        let position = position.clamp(-1.0, 1.0);
        self.mixer.crossfader = position;
        self.send(EngineCommand::SetCrossfader { position });
    }

    /// Set the crossfader from a 0-1 slider (0.5 = center)
    pub fn set_crossfader_ui(&mut self, slider: f32) {
        self.set_crossfader(mapping::crossfader_ui_to_position(slider));
    }

    /// Set master volume (clamped to 0 - 1)
    pub fn set_master_volume(&mut self, volume: f32) {
        let volume = volume.clamp(0.0, 1.0);
        self.mixer.master_volume = volume;
        self.send(EngineCommand::SetMasterGain { gain: volume });
    }

    // --- Recording ---

    /// Whether a session recording is running
    pub fn is_recording(&self) -> bool {
        self.recorder.is_some()
    }

    /// Start recording the master bus to a timestamped WAV
    ///
    /// No-op if a recording is already running or the audio system is
    /// unavailable.
    pub fn start_recording(&mut self) {
        if self.recorder.is_some() {
            return;
        }
        self.ensure_initialized();
        let Some(rig) = &self.rig else {
            log::warn!("cannot record: audio system unavailable");
            return;
        };

        let dir = self.config.recording_dir();
        match SessionRecorder::start(&dir, rig.sample_rate) {
            Ok((recorder, sink)) => {
                self.recorder = Some(recorder);
                self.send(EngineCommand::StartRecording {
                    sink: Box::new(sink),
                });
            }
            Err(e) => {
                log::error!("failed to start recording: {}", e);
            }
        }
    }

    /// Stop the running recording and return the finished file path
    pub fn stop_recording(&mut self) -> Option<PathBuf> {
        let recorder = self.recorder.take()?;
        self.send(EngineCommand::StopRecording);
        match recorder.finish() {
            Ok(path) => Some(path),
            Err(e) => {
                log::error!("failed to finalize recording: {}", e);
                None
            }
        }
    }
}
