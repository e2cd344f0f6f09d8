//! Control value mapping - normalized UI values to engine units
//!
//! Stateless conversions between what a control surface reports and what
//! the signal chain consumes. Every function clamps its input to the
//! documented domain so an out-of-range value can never drive the engine
//! into an undefined state.
//!
//! | control        | input   | output      | formula            |
//! |----------------|---------|-------------|--------------------|
//! | EQ band        | [-1, 1] | dB          | value × 20         |
//! | stem isolation | [0, 1]  | dB          | (value − 1) × 40   |
//! | tempo fader    | [0, 1]  | rate ratio  | 0.92 + value × 0.16|
//! | crossfader UI  | [0, 1]  | bus position| (value − 0.5) × 2  |
//! | EQ UI knob     | [0, 1]  | band value  | (value − 0.5) × 2  |

use std::f32::consts::FRAC_PI_2;

/// Playback rate range: a ±8% pitch fader
pub const MIN_PLAYBACK_RATE: f32 = 0.92;
pub const MAX_PLAYBACK_RATE: f32 = 1.08;

/// Gain applied to a fully cut isolation stage (effectively silenced band)
pub const STEM_KILL_DB: f32 = -40.0;

/// Convert an EQ band value (-1 to 1, 0 = flat) to gain in dB
///
/// Linear scale: full boost is +20 dB, full cut -20 dB, center is unity.
pub fn eq_value_to_db(value: f32) -> f32 {
    value.clamp(-1.0, 1.0) * 20.0
}

/// Convert a stem isolation value (0 = isolated away, 1 = passing) to
/// gain in dB on the stem's dedicated filter
///
/// 1 → 0 dB (pass-through), 0 → -40 dB (band effectively silenced).
pub fn stem_value_to_db(value: f32) -> f32 {
    (value.clamp(0.0, 1.0) - 1.0) * -STEM_KILL_DB
}

/// Convert a tempo fader position (0 to 1) to a playback rate ratio
///
/// 0 → 0.92, 0.5 → 1.00 (unity), 1 → 1.08.
pub fn tempo_fader_to_rate(value: f32) -> f32 {
    MIN_PLAYBACK_RATE + value.clamp(0.0, 1.0) * (MAX_PLAYBACK_RATE - MIN_PLAYBACK_RATE)
}

/// Convert a crossfader UI position (0 to 1) to a bus position (-1 to 1)
pub fn crossfader_ui_to_position(value: f32) -> f32 {
    (value.clamp(0.0, 1.0) - 0.5) * 2.0
}

/// Convert an EQ knob position (0 to 1) to an EQ band value (-1 to 1)
pub fn eq_knob_to_value(value: f32) -> f32 {
    (value.clamp(0.0, 1.0) - 0.5) * 2.0
}

/// Constant-power crossfade gains for a bus position (-1 = full A,
/// 0 = center, 1 = full B)
///
/// Normalizes t = (x+1)/2 and returns (cos(t·π/2), cos((1−t)·π/2)). The
/// squared gains always sum to 1, so perceived loudness stays constant
/// through the sweep; a naive linear blend dips at the center.
pub fn crossfade_gains(position: f32) -> (f32, f32) {
    let t = (position.clamp(-1.0, 1.0) + 1.0) * 0.5;
    let gain_a = (t * FRAC_PI_2).cos();
    let gain_b = ((1.0 - t) * FRAC_PI_2).cos();
    (gain_a, gain_b)
}

/// Convert a gain in dB to a linear multiplier
#[inline]
pub fn db_to_linear(db: f32) -> f32 {
    10.0_f32.powf(db / 20.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eq_value_to_db() {
        assert_eq!(eq_value_to_db(0.0), 0.0);
        assert_eq!(eq_value_to_db(1.0), 20.0);
        assert_eq!(eq_value_to_db(-1.0), -20.0);
        assert_eq!(eq_value_to_db(0.5), 10.0);

        // Out-of-domain input clamps
        assert_eq!(eq_value_to_db(3.0), 20.0);
        assert_eq!(eq_value_to_db(-7.5), -20.0);
    }

    #[test]
    fn test_stem_value_to_db() {
        assert_eq!(stem_value_to_db(1.0), 0.0);
        assert_eq!(stem_value_to_db(0.0), -40.0);
        assert_eq!(stem_value_to_db(2.0), 0.0);
        assert_eq!(stem_value_to_db(-1.0), -40.0);
    }

    #[test]
    fn test_tempo_fader_to_rate() {
        assert!((tempo_fader_to_rate(0.0) - 0.92).abs() < 1e-6);
        assert!((tempo_fader_to_rate(1.0) - 1.08).abs() < 1e-6);
        assert!((tempo_fader_to_rate(0.5) - 1.00).abs() < 1e-6);
        assert!((tempo_fader_to_rate(9.0) - 1.08).abs() < 1e-6);
    }

    #[test]
    fn test_ui_recentering() {
        assert_eq!(crossfader_ui_to_position(0.0), -1.0);
        assert_eq!(crossfader_ui_to_position(0.5), 0.0);
        assert_eq!(crossfader_ui_to_position(1.0), 1.0);

        assert_eq!(eq_knob_to_value(0.25), -0.5);
        assert_eq!(eq_knob_to_value(0.75), 0.5);
    }

    #[test]
    fn test_crossfade_endpoints() {
        let (a, b) = crossfade_gains(-1.0);
        assert!((a - 1.0).abs() < 1e-6);
        assert!(b.abs() < 1e-6);

        let (a, b) = crossfade_gains(1.0);
        assert!(a.abs() < 1e-6);
        assert!((b - 1.0).abs() < 1e-6);

        let (a, b) = crossfade_gains(0.0);
        let center = std::f32::consts::FRAC_PI_4.cos();
        assert!((a - center).abs() < 1e-6);
        assert!((b - center).abs() < 1e-6);
    }

    #[test]
    fn test_crossfade_constant_power() {
        // gainA² + gainB² ≈ 1 across the whole sweep
        for i in 0..=100 {
            let x = -1.0 + i as f32 * 0.02;
            let (a, b) = crossfade_gains(x);
            let power = a * a + b * b;
            assert!(
                (power - 1.0).abs() < 1e-5,
                "power {} at position {}",
                power,
                x
            );
        }
    }

    #[test]
    fn test_db_to_linear() {
        assert!((db_to_linear(0.0) - 1.0).abs() < 1e-6);
        assert!((db_to_linear(20.0) - 10.0).abs() < 1e-4);
        assert!((db_to_linear(-20.0) - 0.1).abs() < 1e-6);
    }
}
