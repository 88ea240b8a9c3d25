//! Sine oscillator with subtractive phase wrap.

use std::f64::consts::TAU;

/// A fixed-frequency sine oscillator.
///
/// Tracks continuous time `t`, advancing by `dt = 1/sample_rate` per sample
/// and wrapping `t -= T` once `t` passes the period `T = 1/frequency`.
/// The wrap is subtractive rather than a modulo: when `dt` does not evenly
/// divide `T`, the phase error stays bounded by one `dt` per cycle instead
/// of accumulating.
#[derive(Debug, Clone)]
pub struct Oscillator {
    frequency: f64,
    period: f64,
    dt: f64,
    t: f64,
}

impl Oscillator {
    /// Build an oscillator at `frequency` Hz. The frequency is fixed for the
    /// oscillator's lifetime; there is no retuning.
    pub fn new(frequency: f64, sample_rate: f64) -> Self {
        Oscillator {
            frequency,
            period: 1.0 / frequency,
            dt: 1.0 / sample_rate,
            t: 0.0,
        }
    }

    /// Generate the next sample in [-1, 1] and advance one tick.
    pub fn next_sample(&mut self) -> f64 {
        let sample = (TAU * self.frequency * self.t).sin();
        self.t += self.dt;
        if self.t > self.period {
            self.t -= self.period;
        }
        sample
    }

    pub fn frequency(&self) -> f64 {
        self.frequency
    }
}
