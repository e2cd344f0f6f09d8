//! Deck signal chain - stem isolation, 3-band EQ, deck gain
//!
//! Fixed-topology pipeline every deck's audio passes through:
//!
//! ```text
//! source → bass-isolation shelf → vocal-isolation peak
//!        → EQ low shelf → EQ mid peak → EQ high shelf → deck gain
//! ```
//!
//! The topology never changes after construction; only filter and gain
//! parameters move, and they move along smoothed ramps.
//!
//! Stem "isolation" here is an approximation: cutting a stem drops a
//! dedicated filter stage to -40 dB over that stem's frequency range
//! rather than performing real source separation.

use crate::dsp::{BiquadCoeffs, BiquadState, SmoothedParam};
use crate::mapping;
use crate::types::{EqBand, IsolationStem, StereoBuffer};

/// Bass isolation shelf corner (bass kill region)
const STEM_BASS_FREQ: f32 = 200.0;
/// Vocal isolation peak center (presence range)
const STEM_VOCALS_FREQ: f32 = 3000.0;
const STEM_VOCALS_Q: f32 = 1.0;

/// EQ band frequencies
const EQ_LOW_FREQ: f32 = 320.0;
const EQ_MID_FREQ: f32 = 1000.0;
const EQ_MID_Q: f32 = 0.5;
const EQ_HIGH_FREQ: f32 = 2500.0;

/// Smoothing time constant for filter gain ramps (~100 ms)
const FILTER_TAU: f32 = 0.1;
/// Smoothing time constant for the deck volume ramp (~50 ms)
const GAIN_TAU: f32 = 0.05;

/// Below this magnitude a filter gain is treated as flat and the stage
/// collapses to a passthrough
const FLAT_DB: f32 = 0.05;

/// Filter curve used by one chain stage
#[derive(Debug, Clone, Copy)]
enum FilterShape {
    LowShelf { freq: f32 },
    Peaking { freq: f32, q: f32 },
    HighShelf { freq: f32 },
}

/// One filter stage: a smoothed dB parameter driving cached biquad
/// coefficients
#[derive(Debug, Clone)]
struct FilterStage {
    shape: FilterShape,
    gain_db: SmoothedParam,
    coeffs: BiquadCoeffs,
    state: BiquadState,
}

impl FilterStage {
    fn new(shape: FilterShape) -> Self {
        Self {
            shape,
            gain_db: SmoothedParam::new(0.0, FILTER_TAU),
            coeffs: BiquadCoeffs::passthrough(),
            state: BiquadState::default(),
        }
    }

    fn set_target_db(&mut self, db: f32) {
        self.gain_db.set_target(db);
    }

    /// Advance the gain ramp and refresh coefficients if it moved
    fn advance(&mut self, frames: usize, sample_rate: f32) {
        if self.gain_db.is_settled() {
            return;
        }
        let db = self.gain_db.advance(frames, sample_rate);
        self.coeffs = if db.abs() < FLAT_DB {
            BiquadCoeffs::passthrough()
        } else {
            match self.shape {
                FilterShape::LowShelf { freq } => BiquadCoeffs::low_shelf(freq, db, sample_rate),
                FilterShape::Peaking { freq, q } => BiquadCoeffs::peaking(freq, db, q, sample_rate),
                FilterShape::HighShelf { freq } => BiquadCoeffs::high_shelf(freq, db, sample_rate),
            }
        };
    }

    fn process(&mut self, buffer: &mut StereoBuffer) {
        self.state.process_buffer(buffer, &self.coeffs);
    }

    fn reset(&mut self) {
        self.state.reset();
    }
}

/// The per-deck signal chain
///
/// Every node is a named field; a deck owns its chain exclusively and no
/// cross-deck mutation path exists.
pub struct DeckChain {
    stem_bass: FilterStage,
    stem_vocals: FilterStage,
    eq_low: FilterStage,
    eq_mid: FilterStage,
    eq_high: FilterStage,
    gain: SmoothedParam,
}

impl DeckChain {
    /// Create a chain with all stages flat and unity gain
    pub fn new() -> Self {
        Self {
            stem_bass: FilterStage::new(FilterShape::LowShelf { freq: STEM_BASS_FREQ }),
            stem_vocals: FilterStage::new(FilterShape::Peaking {
                freq: STEM_VOCALS_FREQ,
                q: STEM_VOCALS_Q,
            }),
            eq_low: FilterStage::new(FilterShape::LowShelf { freq: EQ_LOW_FREQ }),
            eq_mid: FilterStage::new(FilterShape::Peaking {
                freq: EQ_MID_FREQ,
                q: EQ_MID_Q,
            }),
            eq_high: FilterStage::new(FilterShape::HighShelf { freq: EQ_HIGH_FREQ }),
            gain: SmoothedParam::new(1.0, GAIN_TAU),
        }
    }

    /// Set an EQ band from a normalized control value (-1 to 1, 0 = flat)
    ///
    /// Mapped to dB (value × 20) and applied as a ~100 ms ramp.
    pub fn set_eq_band(&mut self, band: EqBand, value: f32) {
        let db = mapping::eq_value_to_db(value);
        self.eq_stage_mut(band).set_target_db(db);
    }

    /// Set stem isolation (0 = band silenced at -40 dB, 1 = pass-through)
    pub fn set_stem_isolation(&mut self, stem: IsolationStem, value: f32) {
        let db = mapping::stem_value_to_db(value);
        self.stem_stage_mut(stem).set_target_db(db);
    }

    /// Set the deck volume fader (0 to 1), ramped over ~50 ms
    pub fn set_deck_gain(&mut self, value: f32) {
        self.gain.set_target(value.clamp(0.0, 1.0));
    }

    /// Target gain in dB for an EQ band (where the ramp is heading)
    pub fn eq_target_db(&self, band: EqBand) -> f32 {
        self.eq_stage(band).gain_db.target()
    }

    /// Target gain in dB for a stem isolation stage
    pub fn stem_target_db(&self, stem: IsolationStem) -> f32 {
        self.stem_stage(stem).gain_db.target()
    }

    /// Target deck gain
    pub fn gain_target(&self) -> f32 {
        self.gain.target()
    }

    fn eq_stage(&self, band: EqBand) -> &FilterStage {
        match band {
            EqBand::Low => &self.eq_low,
            EqBand::Mid => &self.eq_mid,
            EqBand::High => &self.eq_high,
        }
    }

    fn eq_stage_mut(&mut self, band: EqBand) -> &mut FilterStage {
        match band {
            EqBand::Low => &mut self.eq_low,
            EqBand::Mid => &mut self.eq_mid,
            EqBand::High => &mut self.eq_high,
        }
    }

    fn stem_stage(&self, stem: IsolationStem) -> &FilterStage {
        match stem {
            IsolationStem::Bass => &self.stem_bass,
            IsolationStem::Vocals => &self.stem_vocals,
        }
    }

    fn stem_stage_mut(&mut self, stem: IsolationStem) -> &mut FilterStage {
        match stem {
            IsolationStem::Bass => &mut self.stem_bass,
            IsolationStem::Vocals => &mut self.stem_vocals,
        }
    }

    /// Process one buffer through the chain in place
    pub fn process(&mut self, buffer: &mut StereoBuffer, sample_rate: f32) {
        let frames = buffer.len();

        self.stem_bass.advance(frames, sample_rate);
        self.stem_vocals.advance(frames, sample_rate);
        self.eq_low.advance(frames, sample_rate);
        self.eq_mid.advance(frames, sample_rate);
        self.eq_high.advance(frames, sample_rate);

        self.stem_bass.process(buffer);
        self.stem_vocals.process(buffer);
        self.eq_low.process(buffer);
        self.eq_mid.process(buffer);
        self.eq_high.process(buffer);

        // Volume fader: linear ramp across the block between smoothed values
        let gain_start = self.gain.current();
        let gain_end = self.gain.advance(frames, sample_rate);
        if gain_start == gain_end {
            if gain_end != 1.0 {
                buffer.scale(gain_end);
            }
        } else {
            let step = (gain_end - gain_start) / frames as f32;
            for (i, sample) in buffer.iter_mut().enumerate() {
                *sample *= gain_start + step * i as f32;
            }
        }
    }

    /// Clear all filter history (on track rebind)
    pub fn reset(&mut self) {
        self.stem_bass.reset();
        self.stem_vocals.reset();
        self.eq_low.reset();
        self.eq_mid.reset();
        self.eq_high.reset();
    }
}

impl Default for DeckChain {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::StereoSample;

    const SR: f32 = 48000.0;

    fn sine_buffer(len: usize, freq: f32) -> StereoBuffer {
        let mut buffer = StereoBuffer::silence(len);
        for (i, s) in buffer.iter_mut().enumerate() {
            let t = i as f32 / SR;
            *s = StereoSample::mono((2.0 * std::f32::consts::PI * freq * t).sin());
        }
        buffer
    }

    #[test]
    fn test_eq_mapping_targets() {
        let mut chain = DeckChain::new();

        chain.set_eq_band(EqBand::Low, 0.5);
        assert_eq!(chain.eq_target_db(EqBand::Low), 10.0);

        chain.set_eq_band(EqBand::Mid, -1.0);
        assert_eq!(chain.eq_target_db(EqBand::Mid), -20.0);

        chain.set_eq_band(EqBand::High, 0.0);
        assert_eq!(chain.eq_target_db(EqBand::High), 0.0);

        // Out-of-domain input clamps instead of failing
        chain.set_eq_band(EqBand::Low, 5.0);
        assert_eq!(chain.eq_target_db(EqBand::Low), 20.0);
    }

    #[test]
    fn test_stem_isolation_targets() {
        let mut chain = DeckChain::new();

        chain.set_stem_isolation(IsolationStem::Bass, 0.0);
        assert_eq!(chain.stem_target_db(IsolationStem::Bass), -40.0);

        chain.set_stem_isolation(IsolationStem::Bass, 1.0);
        assert_eq!(chain.stem_target_db(IsolationStem::Bass), 0.0);

        chain.set_stem_isolation(IsolationStem::Vocals, 0.0);
        assert_eq!(chain.stem_target_db(IsolationStem::Vocals), -40.0);
    }

    #[test]
    fn test_deck_gain_clamps() {
        let mut chain = DeckChain::new();
        chain.set_deck_gain(1.5);
        assert_eq!(chain.gain_target(), 1.0);
        chain.set_deck_gain(-0.2);
        assert_eq!(chain.gain_target(), 0.0);
    }

    #[test]
    fn test_flat_chain_is_transparent() {
        let mut chain = DeckChain::new();
        let mut buffer = sine_buffer(256, 440.0);
        let input = buffer.clone();

        chain.process(&mut buffer, SR);
        for (out, inp) in buffer.iter().zip(input.iter()) {
            assert!((out.left - inp.left).abs() < 1e-4);
        }
    }

    #[test]
    fn test_gain_ramps_not_steps() {
        let mut chain = DeckChain::new();
        chain.set_deck_gain(0.0);

        // DC input: first block must still carry signal near the start
        // and be quieter by the end (a ramp, not a mute)
        let mut buffer = StereoBuffer::silence(256);
        for s in buffer.iter_mut() {
            *s = StereoSample::mono(1.0);
        }
        chain.process(&mut buffer, SR);

        assert!(buffer[0].left > 0.9, "ramp start {}", buffer[0].left);
        assert!(
            buffer[255].left < buffer[0].left,
            "gain did not decrease across the block"
        );

        // After ~10 time constants it is effectively silent
        for _ in 0..100 {
            let mut b = StereoBuffer::silence(256);
            for s in b.iter_mut() {
                *s = StereoSample::mono(1.0);
            }
            chain.process(&mut b, SR);
            buffer = b;
        }
        assert!(buffer.peak() < 1e-3);
    }

    #[test]
    fn test_bass_kill_attenuates_low_frequency() {
        let mut chain = DeckChain::new();
        chain.set_stem_isolation(IsolationStem::Bass, 0.0);

        // Let the ramp settle, then measure a 60 Hz tone
        let mut peak = 0.0_f32;
        for block in 0..400 {
            let mut buffer = StereoBuffer::silence(256);
            for (i, s) in buffer.iter_mut().enumerate() {
                let t = (block * 256 + i) as f32 / SR;
                *s = StereoSample::mono((2.0 * std::f32::consts::PI * 60.0 * t).sin());
            }
            chain.process(&mut buffer, SR);
            if block > 300 {
                peak = peak.max(buffer.peak());
            }
        }
        assert!(peak < 0.1, "60 Hz peak after bass kill: {}", peak);
    }
}
