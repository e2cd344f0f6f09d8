//! Lock-free command queue for real-time engine control
//!
//! The UI thread pushes commands into an `rtrb` ringbuffer and the
//! audio thread drains them at the start of each callback. Both sides
//! are wait-free and allocation-free, so a burst of control changes can
//! never stall the audio callback or the UI.
//!
//! Commands are processed at block boundaries, which keeps ordering:
//! two writes to the same parameter arrive in send order and the later
//! one wins.

use crate::loader::LoadedTrack;
use crate::recorder::RecorderSink;
use crate::types::{DeckId, EqBand, IsolationStem};

/// Commands sent from the UI thread to the audio thread
///
/// Each variant is an atomic operation on the engine. Large payloads
/// (decoded tracks, recorder sinks) are boxed so the enum itself stays
/// pointer-sized for cache-efficient queueing.
pub enum EngineCommand {
    /// Load a decoded track onto a deck
    ///
    /// Boxed because `LoadedTrack` carries the full PCM data; the
    /// allocation happened on the loader thread, the audio thread only
    /// moves a pointer.
    LoadTrack {
        deck: DeckId,
        track: Box<LoadedTrack>,
    },
    /// Unload the track from a deck
    UnloadTrack { deck: DeckId },

    /// Start/resume playback on a deck (no-op if the deck is empty)
    Play { deck: DeckId },
    /// Pause playback on a deck, keeping the playhead
    Pause { deck: DeckId },

    /// Set a deck's volume fader (0.0 - 1.0)
    SetDeckGain { deck: DeckId, value: f32 },
    /// Set an EQ band from a normalized value (-1.0 - 1.0, 0 = flat)
    SetEqBand {
        deck: DeckId,
        band: EqBand,
        value: f32,
    },
    /// Set a stem isolation level (0.0 = silenced, 1.0 = pass-through)
    SetStemIsolation {
        deck: DeckId,
        stem: IsolationStem,
        value: f32,
    },
    /// Set a deck's playback rate multiplier (clamped to 0.92 - 1.08)
    SetPlaybackRate { deck: DeckId, rate: f64 },

    /// Set the crossfader position (-1.0 = A, 0.0 = center, 1.0 = B)
    SetCrossfader { position: f32 },
    /// Set master output volume (0.0 - 1.0)
    SetMasterGain { gain: f32 },

    /// Start tapping the master bus into a recorder sink
    ///
    /// Boxed so the ring buffer producer inside moves as one pointer.
    StartRecording { sink: Box<RecorderSink> },
    /// Stop the master bus tap
    StopRecording,
}

/// Capacity of the command queue
///
/// Control changes arrive at UI rates (a fast fader scrub is a few
/// hundred events per second); 256 slots absorbs any realistic burst
/// between two audio callbacks.
pub const COMMAND_QUEUE_CAPACITY: usize = 256;

/// Create a new command channel (producer/consumer pair)
///
/// The producer belongs to the UI thread, the consumer to the audio
/// thread.
pub fn command_channel() -> (rtrb::Producer<EngineCommand>, rtrb::Consumer<EngineCommand>) {
    rtrb::RingBuffer::new(COMMAND_QUEUE_CAPACITY)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_channel_roundtrip() {
        let (mut tx, mut rx) = command_channel();

        tx.push(EngineCommand::Play { deck: DeckId::A }).unwrap();

        let cmd = rx.pop().unwrap();
        assert!(matches!(cmd, EngineCommand::Play { deck: DeckId::A }));
    }

    #[test]
    fn test_command_channel_empty() {
        let (_tx, mut rx) = command_channel();
        assert!(rx.pop().is_err());
    }

    #[test]
    fn test_command_size() {
        // Keep EngineCommand within a cache line; anything larger than a
        // few words must be boxed
        let size = std::mem::size_of::<EngineCommand>();
        assert!(size <= 24, "EngineCommand is {} bytes, expected <= 24", size);
    }
}
