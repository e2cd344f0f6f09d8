//! DSP building blocks - parameter smoothing and biquad filters

mod biquad;
mod smooth;

pub use biquad::*;
pub use smooth::*;
