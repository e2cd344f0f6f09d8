//! Audio engine - decks, signal chains, crossfade bus
//!
//! Core engine components for the mixing console:
//! - DeckChain: per-deck stem-isolation / EQ / gain pipeline
//! - Deck: transport and playhead for one deck, owning its chain
//! - CrossfadeBus: constant-power combination of both decks into master
//! - AudioEngine: ties everything together for the audio thread
//! - EngineCommand: lock-free control channel from the UI thread

mod chain;
mod command;
mod deck;
mod engine;
mod mixer;

pub use chain::*;
pub use command::*;
pub use deck::*;
pub use engine::*;
pub use mixer::*;
