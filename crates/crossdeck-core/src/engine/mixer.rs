//! Crossfade bus - constant-power blend of both decks into master

use crate::dsp::SmoothedParam;
use crate::mapping;
use crate::types::{DeckId, StereoBuffer, NUM_DECKS};

/// Smoothing time constant for crossfade and master gain ramps (~50 ms)
const BUS_TAU: f32 = 0.05;

/// Combines the two deck outputs using a constant-power crossfade law
/// and applies the master volume.
///
/// Crossfader position -1 is full deck A, +1 is full deck B, 0 is the
/// equal-power midpoint (both decks at cos(π/4) ≈ 0.707). Gains follow
/// cosine curves so total perceived power stays constant across the
/// sweep; each gain change is smoothed so scrubbing the fader never
/// clicks.
pub struct CrossfadeBus {
    gain_a: SmoothedParam,
    gain_b: SmoothedParam,
    master: SmoothedParam,
}

impl CrossfadeBus {
    /// Create a bus with the crossfader centered and master at unity
    pub fn new() -> Self {
        let (a, b) = mapping::crossfade_gains(0.0);
        Self {
            gain_a: SmoothedParam::new(a, BUS_TAU),
            gain_b: SmoothedParam::new(b, BUS_TAU),
            master: SmoothedParam::new(1.0, BUS_TAU),
        }
    }

    /// Set the crossfader position (-1 = full A, +1 = full B)
    pub fn set_position(&mut self, position: f32) {
        let (a, b) = mapping::crossfade_gains(position);
        self.gain_a.set_target(a);
        self.gain_b.set_target(b);
    }

    /// Set the master volume (0 to 1)
    pub fn set_master_gain(&mut self, gain: f32) {
        self.master.set_target(gain.clamp(0.0, 1.0));
    }

    /// Target gains the crossfade ramps are heading toward (A, B)
    pub fn target_gains(&self) -> (f32, f32) {
        (self.gain_a.target(), self.gain_b.target())
    }

    /// Target master gain
    pub fn master_target(&self) -> f32 {
        self.master.target()
    }

    /// Sum the deck buffers into `master_out` with crossfade and master
    /// gains applied as per-block linear ramps
    ///
    /// Only the overlap of the three buffers is rendered; any excess
    /// master frames are left silent.
    pub fn process(
        &mut self,
        deck_buffers: &[StereoBuffer; NUM_DECKS],
        master_out: &mut StereoBuffer,
        sample_rate: f32,
    ) {
        let frames = master_out
            .len()
            .min(deck_buffers[0].len())
            .min(deck_buffers[1].len());
        master_out.fill_silence();

        let a_start = self.gain_a.current();
        let a_end = self.gain_a.advance(frames, sample_rate);
        let b_start = self.gain_b.current();
        let b_end = self.gain_b.advance(frames, sample_rate);
        let m_start = self.master.current();
        let m_end = self.master.advance(frames, sample_rate);

        let a_buf = &deck_buffers[DeckId::A.index()];
        let b_buf = &deck_buffers[DeckId::B.index()];

        let inv = 1.0 / frames.max(1) as f32;
        for (i, out) in master_out.as_mut_slice()[..frames].iter_mut().enumerate() {
            let t = i as f32 * inv;
            let ga = a_start + (a_end - a_start) * t;
            let gb = b_start + (b_end - b_start) * t;
            let gm = m_start + (m_end - m_start) * t;
            *out = (a_buf[i] * ga + b_buf[i] * gb) * gm;
        }
    }
}

impl Default for CrossfadeBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::StereoSample;

    const SR: f32 = 48000.0;

    fn dc_buffers(len: usize, a: f32, b: f32) -> [StereoBuffer; NUM_DECKS] {
        let mut buf_a = StereoBuffer::silence(len);
        let mut buf_b = StereoBuffer::silence(len);
        for s in buf_a.iter_mut() {
            *s = StereoSample::mono(a);
        }
        for s in buf_b.iter_mut() {
            *s = StereoSample::mono(b);
        }
        [buf_a, buf_b]
    }

    fn settle(bus: &mut CrossfadeBus, decks: &[StereoBuffer; NUM_DECKS]) -> StereoBuffer {
        let mut out = StereoBuffer::silence(decks[0].len());
        // ~1.4 s of audio, far past the 50 ms ramps
        for _ in 0..256 {
            bus.process(decks, &mut out, SR);
        }
        out
    }

    #[test]
    fn test_center_is_equal_power_midpoint() {
        let mut bus = CrossfadeBus::new();
        let (a, b) = bus.target_gains();
        let mid = std::f32::consts::FRAC_1_SQRT_2;
        assert!((a - mid).abs() < 1e-6);
        assert!((b - mid).abs() < 1e-6);
    }

    #[test]
    fn test_full_left_silences_deck_b() {
        let mut bus = CrossfadeBus::new();
        bus.set_position(-1.0);

        let (a, b) = bus.target_gains();
        assert!((a - 1.0).abs() < 1e-6);
        assert!(b.abs() < 1e-6);

        // Only deck B carries signal: output settles to silence
        let decks = dc_buffers(256, 0.0, 1.0);
        let out = settle(&mut bus, &decks);
        assert!(out.peak() < 1e-3, "deck B bled through: {}", out.peak());
    }

    #[test]
    fn test_full_right_passes_deck_b_at_unity() {
        let mut bus = CrossfadeBus::new();
        bus.set_position(1.0);

        let decks = dc_buffers(256, 0.0, 0.5);
        let out = settle(&mut bus, &decks);
        assert!((out[128].left - 0.5).abs() < 1e-3, "got {}", out[128].left);
    }

    #[test]
    fn test_master_gain_scales_output() {
        let mut bus = CrossfadeBus::new();
        bus.set_position(-1.0);
        bus.set_master_gain(0.5);
        assert_eq!(bus.master_target(), 0.5);

        let decks = dc_buffers(256, 1.0, 0.0);
        let out = settle(&mut bus, &decks);
        assert!((out[128].left - 0.5).abs() < 1e-3);
    }

    #[test]
    fn test_master_gain_clamps() {
        let mut bus = CrossfadeBus::new();
        bus.set_master_gain(2.0);
        assert_eq!(bus.master_target(), 1.0);
        bus.set_master_gain(-1.0);
        assert_eq!(bus.master_target(), 0.0);
    }

    #[test]
    fn test_position_change_ramps_not_steps() {
        let mut bus = CrossfadeBus::new();
        let decks = dc_buffers(256, 1.0, 0.0);
        let mut out = StereoBuffer::silence(256);
        bus.process(&decks, &mut out, SR);

        // Jump the fader hard left; the very next block must still be
        // near the old midpoint gain, not at the new target
        bus.set_position(-1.0);
        bus.process(&decks, &mut out, SR);
        let mid = std::f32::consts::FRAC_1_SQRT_2;
        assert!(
            (out[0].left - mid).abs() < 0.05,
            "gain jumped to {}",
            out[0].left
        );
    }
}
