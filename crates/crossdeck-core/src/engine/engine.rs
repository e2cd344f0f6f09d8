//! AudioEngine - top-level audio processor owned by the audio callback
//!
//! The engine is moved into the audio callback at stream creation and
//! never shared: the callback drains the command queue, renders both
//! decks, runs the crossfade bus, and optionally taps the master into a
//! recorder sink. The UI observes playback through [`DeckAtomics`] only.

use crate::recorder::RecorderSink;
use crate::types::{DeckId, StereoBuffer, NUM_DECKS};

use super::{CrossfadeBus, Deck, DeckAtomics, EngineCommand};
use crate::audio::MAX_BUFFER_SIZE;

use std::sync::Arc;

pub struct AudioEngine {
    decks: [Deck; NUM_DECKS],
    bus: CrossfadeBus,
    /// Pre-allocated per-deck render buffers; only the length field
    /// changes per callback, never the capacity
    deck_buffers: [StereoBuffer; NUM_DECKS],
    sample_rate: f32,
    /// Active master bus tap, if a recording is running
    recorder: Option<Box<RecorderSink>>,
}

impl AudioEngine {
    /// Create an engine rendering at the given sample rate
    pub fn new(sample_rate: f32) -> Self {
        Self {
            decks: [Deck::new(DeckId::A), Deck::new(DeckId::B)],
            bus: CrossfadeBus::new(),
            deck_buffers: std::array::from_fn(|_| StereoBuffer::silence(MAX_BUFFER_SIZE)),
            sample_rate,
            recorder: None,
        }
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Lock-free state handles for both decks, for the UI to poll
    pub fn deck_atomics(&self) -> [Arc<DeckAtomics>; NUM_DECKS] {
        [self.decks[0].atomics(), self.decks[1].atomics()]
    }

    pub fn deck(&self, id: DeckId) -> &Deck {
        &self.decks[id.index()]
    }

    pub fn deck_mut(&mut self, id: DeckId) -> &mut Deck {
        &mut self.decks[id.index()]
    }

    pub fn bus(&self) -> &CrossfadeBus {
        &self.bus
    }

    /// Apply one command to the engine state
    pub fn apply_command(&mut self, command: EngineCommand) {
        match command {
            EngineCommand::LoadTrack { deck, track } => {
                self.decks[deck.index()].load_track(*track);
            }
            EngineCommand::UnloadTrack { deck } => {
                self.decks[deck.index()].unload_track();
            }
            EngineCommand::Play { deck } => {
                self.decks[deck.index()].play();
            }
            EngineCommand::Pause { deck } => {
                self.decks[deck.index()].pause();
            }
            EngineCommand::SetDeckGain { deck, value } => {
                self.decks[deck.index()].chain_mut().set_deck_gain(value);
            }
            EngineCommand::SetEqBand { deck, band, value } => {
                self.decks[deck.index()].chain_mut().set_eq_band(band, value);
            }
            EngineCommand::SetStemIsolation { deck, stem, value } => {
                self.decks[deck.index()]
                    .chain_mut()
                    .set_stem_isolation(stem, value);
            }
            EngineCommand::SetPlaybackRate { deck, rate } => {
                self.decks[deck.index()].set_playback_rate(rate);
            }
            EngineCommand::SetCrossfader { position } => {
                self.bus.set_position(position);
            }
            EngineCommand::SetMasterGain { gain } => {
                self.bus.set_master_gain(gain);
            }
            EngineCommand::StartRecording { sink } => {
                self.recorder = Some(sink);
            }
            EngineCommand::StopRecording => {
                // Dropping the producer side lets the writer thread
                // drain and finish the file
                self.recorder = None;
            }
        }
    }

    /// Drain all pending commands from the queue
    ///
    /// Called at the start of every audio callback, before rendering.
    pub fn process_commands(&mut self, rx: &mut rtrb::Consumer<EngineCommand>) {
        while let Ok(command) = rx.pop() {
            self.apply_command(command);
        }
    }

    /// Render one block of master output
    ///
    /// At most `MAX_BUFFER_SIZE` frames are rendered per call; a larger
    /// output buffer gets a silent tail.
    pub fn process(&mut self, master_out: &mut StereoBuffer) {
        let frames = master_out.len().min(MAX_BUFFER_SIZE);

        for (deck, buffer) in self.decks.iter_mut().zip(self.deck_buffers.iter_mut()) {
            buffer.set_len_from_capacity(frames);
            deck.process(buffer, self.sample_rate);
        }

        self.bus.process(&self.deck_buffers, master_out, self.sample_rate);

        if let Some(recorder) = &mut self.recorder {
            recorder.write(master_out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::Track;
    use crate::loader::LoadedTrack;
    use crate::types::{EqBand, IsolationStem, PlayState, StereoSample};

    use super::super::command_channel;

    const SR: f32 = 48000.0;

    fn dc_track(frames: usize, level: f32) -> Box<LoadedTrack> {
        let mut samples = StereoBuffer::silence(frames);
        for s in samples.iter_mut() {
            *s = StereoSample::mono(level);
        }
        Box::new(LoadedTrack {
            track: Track {
                id: "dc".into(),
                title: "DC".into(),
                ..Track::default()
            },
            samples,
            sample_rate: SR as u32,
        })
    }

    #[test]
    fn test_empty_engine_renders_silence() {
        let mut engine = AudioEngine::new(SR);
        let mut out = StereoBuffer::silence(256);
        engine.process(&mut out);
        assert_eq!(out.peak(), 0.0);
    }

    #[test]
    fn test_commands_drive_transport() {
        let mut engine = AudioEngine::new(SR);
        let (mut tx, mut rx) = command_channel();

        tx.push(EngineCommand::LoadTrack {
            deck: DeckId::A,
            track: dc_track(48000, 0.5),
        })
        .unwrap();
        tx.push(EngineCommand::Play { deck: DeckId::A }).unwrap();
        engine.process_commands(&mut rx);

        assert_eq!(engine.deck(DeckId::A).state(), PlayState::Playing);
        assert_eq!(engine.deck(DeckId::B).state(), PlayState::Stopped);

        let mut out = StereoBuffer::silence(256);
        engine.process(&mut out);
        assert!(out.peak() > 0.0);
        assert_eq!(engine.deck(DeckId::A).position(), 256);
    }

    #[test]
    fn test_play_on_empty_deck_via_command_is_noop() {
        let mut engine = AudioEngine::new(SR);
        let (mut tx, mut rx) = command_channel();

        tx.push(EngineCommand::Play { deck: DeckId::B }).unwrap();
        engine.process_commands(&mut rx);
        assert_eq!(engine.deck(DeckId::B).state(), PlayState::Stopped);
    }

    #[test]
    fn test_parameter_commands_retarget_chain_and_bus() {
        let mut engine = AudioEngine::new(SR);
        let (mut tx, mut rx) = command_channel();

        tx.push(EngineCommand::SetEqBand {
            deck: DeckId::A,
            band: EqBand::Low,
            value: -1.0,
        })
        .unwrap();
        tx.push(EngineCommand::SetStemIsolation {
            deck: DeckId::B,
            stem: IsolationStem::Vocals,
            value: 0.0,
        })
        .unwrap();
        tx.push(EngineCommand::SetDeckGain {
            deck: DeckId::A,
            value: 0.25,
        })
        .unwrap();
        tx.push(EngineCommand::SetCrossfader { position: 1.0 }).unwrap();
        tx.push(EngineCommand::SetMasterGain { gain: 0.8 }).unwrap();
        engine.process_commands(&mut rx);

        assert_eq!(engine.deck(DeckId::A).chain().eq_target_db(EqBand::Low), -20.0);
        assert_eq!(
            engine
                .deck(DeckId::B)
                .chain()
                .stem_target_db(IsolationStem::Vocals),
            -40.0
        );
        assert_eq!(engine.deck(DeckId::A).chain().gain_target(), 0.25);

        let (a, b) = engine.bus().target_gains();
        assert!(a.abs() < 1e-6);
        assert!((b - 1.0).abs() < 1e-6);
        assert_eq!(engine.bus().master_target(), 0.8);
    }

    #[test]
    fn test_later_command_wins() {
        let mut engine = AudioEngine::new(SR);
        let (mut tx, mut rx) = command_channel();

        for value in [0.1, 0.9, 0.4] {
            tx.push(EngineCommand::SetDeckGain {
                deck: DeckId::A,
                value,
            })
            .unwrap();
        }
        engine.process_commands(&mut rx);
        assert_eq!(engine.deck(DeckId::A).chain().gain_target(), 0.4);
    }

    #[test]
    fn test_oversized_output_buffer_gets_silent_tail() {
        let mut engine = AudioEngine::new(SR);
        engine.deck_mut(DeckId::A).load_track(*dc_track(48000, 0.4));
        engine.deck_mut(DeckId::A).play();

        let mut out = StereoBuffer::silence(MAX_BUFFER_SIZE + 512);
        engine.process(&mut out);

        assert!(out[0].peak() > 0.0);
        // Frames past the render limit stay silent
        assert_eq!(out[MAX_BUFFER_SIZE].peak(), 0.0);
        assert_eq!(out[MAX_BUFFER_SIZE + 511].peak(), 0.0);
    }

    #[test]
    fn test_both_decks_mix_into_master() {
        let mut engine = AudioEngine::new(SR);
        engine.deck_mut(DeckId::A).load_track(*dc_track(48000, 0.4));
        engine.deck_mut(DeckId::B).load_track(*dc_track(48000, 0.4));
        engine.deck_mut(DeckId::A).play();
        engine.deck_mut(DeckId::B).play();

        let mut out = StereoBuffer::silence(256);
        engine.process(&mut out);

        // Centered crossfader: both decks at ~0.707
        let expected = 0.4 * std::f32::consts::FRAC_1_SQRT_2 * 2.0;
        assert!((out[200].left - expected).abs() < 0.01, "got {}", out[200].left);
    }
}
