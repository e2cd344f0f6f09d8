//! Crossdeck Core - Dual-deck DJ mixing engine

pub mod audio;
pub mod config;
pub mod console;
pub mod control;
pub mod dsp;
pub mod engine;
pub mod library;
pub mod loader;
pub mod mapping;
pub mod recorder;
pub mod types;

pub use types::*;
