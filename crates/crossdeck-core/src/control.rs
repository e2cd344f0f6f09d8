//! UI-side control state
//!
//! The console keeps a plain mirror of every control it has sent to the
//! engine, so UI code can render knob and fader positions without
//! querying the audio thread. The mirror is updated optimistically when
//! a command is queued; the engine's smoothed values catch up within
//! their ramp times.

use crate::library::Track;
use crate::types::{EqBand, IsolationStem};

/// Mirrored control state for one deck
#[derive(Debug, Clone, PartialEq)]
pub struct DeckControls {
    /// Whether the deck was last commanded to play
    pub playing: bool,
    /// Volume fader (0 - 1)
    pub volume: f32,
    /// EQ band values (-1 - 1, 0 = flat), indexed by [`EqBand`]
    pub eq: [f32; 3],
    /// Stem isolation values (0 - 1, 1 = pass-through), indexed by
    /// [`IsolationStem`]
    pub stems: [f32; 2],
    /// Playback rate multiplier (0.92 - 1.08)
    pub speed: f64,
    /// Metadata of the loaded track, if any
    pub track: Option<Track>,
}

impl Default for DeckControls {
    fn default() -> Self {
        Self {
            playing: false,
            volume: 1.0,
            eq: [0.0; 3],
            stems: [1.0; 2],
            speed: 1.0,
            track: None,
        }
    }
}

impl DeckControls {
    pub fn eq(&self, band: EqBand) -> f32 {
        self.eq[band as usize]
    }

    pub fn stem(&self, stem: IsolationStem) -> f32 {
        self.stems[stem as usize]
    }
}

/// Mirrored control state for the mix bus
#[derive(Debug, Clone, PartialEq)]
pub struct MixerControls {
    /// Crossfader position (-1 = deck A, +1 = deck B)
    pub crossfader: f32,
    /// Master volume (0 - 1)
    pub master_volume: f32,
}

impl Default for MixerControls {
    fn default() -> Self {
        Self {
            crossfader: 0.0,
            master_volume: 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deck_defaults() {
        let deck = DeckControls::default();
        assert!(!deck.playing);
        assert_eq!(deck.volume, 1.0);
        assert_eq!(deck.eq(EqBand::Low), 0.0);
        assert_eq!(deck.eq(EqBand::Mid), 0.0);
        assert_eq!(deck.eq(EqBand::High), 0.0);
        assert_eq!(deck.stem(IsolationStem::Bass), 1.0);
        assert_eq!(deck.stem(IsolationStem::Vocals), 1.0);
        assert_eq!(deck.speed, 1.0);
        assert!(deck.track.is_none());
    }

    #[test]
    fn test_mixer_defaults() {
        let mixer = MixerControls::default();
        assert_eq!(mixer.crossfader, 0.0);
        assert_eq!(mixer.master_volume, 1.0);
    }
}
