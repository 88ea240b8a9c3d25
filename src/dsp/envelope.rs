//! Press-driven envelope state machine.

use serde::{Deserialize, Serialize};

/// Envelope timing parameters, in seconds (levels are unitless in [0, 1]).
///
/// Per-sample rates are derived as `dt / duration` at construction, so the
/// same parameters shape notes identically at any sample rate.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EnvelopeParams {
    /// Time for the gain to ramp from 0 to 1 while pressed.
    pub attack: f64,
    /// Time for the gain to fall from 1 to 0 after reaching the peak,
    /// while still above the sustain level.
    pub decay: f64,
    /// Level below which decay switches to the slower sustain fade.
    pub sustain_level: f64,
    /// Time for the long sustain fade from 1 to 0 while held.
    pub sustain_decay: f64,
    /// Time for the gain to fall from 1 to 0 once released.
    pub release: f64,
}

impl Default for EnvelopeParams {
    fn default() -> Self {
        EnvelopeParams {
            attack: 0.01,
            decay: 0.03,
            sustain_level: 0.3,
            sustain_decay: 7.0,
            release: 0.8,
        }
    }
}

/// A continuously-running envelope driven by a note's pressed flag.
///
/// Unlike a staged ADSR there is no idle/terminal state: the envelope is
/// stepped every tick regardless of note state, including after it has fully
/// released to silence. A re-press before the release reaches zero resumes
/// the attack ramp from the current gain, which is the only click
/// suppression performed.
#[derive(Debug, Clone)]
pub struct Envelope {
    attack_rate: f64,
    decay_rate: f64,
    sustain_level: f64,
    sustain_rate: f64,
    release_rate: f64,
    gain: f64,
    at_peak: bool,
}

impl Envelope {
    pub fn new(params: &EnvelopeParams, sample_rate: f64) -> Self {
        let dt = 1.0 / sample_rate;
        Envelope {
            attack_rate: dt / params.attack,
            decay_rate: dt / params.decay,
            sustain_level: params.sustain_level,
            sustain_rate: dt / params.sustain_decay,
            release_rate: dt / params.release,
            gain: 0.0,
            at_peak: false,
        }
    }

    /// Advance one tick and return the current gain in [0, 1].
    pub fn step(&mut self, pressed: bool) -> f64 {
        if pressed {
            if !self.at_peak {
                self.gain += self.attack_rate;
                if self.gain > 1.0 {
                    self.gain = 1.0;
                    self.at_peak = true;
                }
            } else {
                if self.gain > self.sustain_level {
                    self.gain -= self.decay_rate;
                } else {
                    self.gain -= self.sustain_rate;
                }
                if self.gain < 0.0 {
                    self.gain = 0.0;
                }
            }
        } else {
            self.at_peak = false;
            self.gain -= self.release_rate;
            if self.gain < 0.0 {
                self.gain = 0.0;
            }
        }
        self.gain
    }

    pub fn gain(&self) -> f64 {
        self.gain
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    const SR: f64 = 10000.0;

    #[test]
    fn attack_reaches_peak_in_attack_time() {
        let params = EnvelopeParams::default();
        let mut env = Envelope::new(&params, SR);
        let ticks = (params.attack * SR) as usize;
        for _ in 0..ticks {
            env.step(true);
        }
        // within one attack step of 1.0, and not yet decayed
        assert!(
            env.gain() > 1.0 - 2.0 / (params.attack * SR),
            "Gain should be near 1.0 after attack, got {}",
            env.gain()
        );
    }

    #[test]
    fn release_reaches_zero_in_release_time() {
        let params = EnvelopeParams::default();
        let mut env = Envelope::new(&params, SR);
        for _ in 0..(params.attack * SR) as usize + 10 {
            env.step(true);
        }
        for _ in 0..(params.release * SR) as usize + 1 {
            env.step(false);
        }
        assert!(
            env.gain() < 1.0 / (params.release * SR),
            "Gain should be ~0 after release, got {}",
            env.gain()
        );
    }

    #[test]
    fn monotonic_and_bounded_under_random_press() {
        let params = EnvelopeParams::default();
        let mut env = Envelope::new(&params, SR);
        let mut rng = rand::thread_rng();
        let mut pressed = false;
        let mut prev = 0.0;
        let mut was_peak = false;
        for _ in 0..200_000 {
            if rng.gen_ratio(1, 500) {
                pressed = !pressed;
            }
            let g = env.step(pressed);
            assert!((0.0..=1.0).contains(&g), "Gain out of bounds: {g}");
            if pressed && !was_peak {
                assert!(g >= prev, "Gain fell during attack: {prev} -> {g}");
            }
            if !pressed {
                assert!(g <= prev, "Gain rose while released: {prev} -> {g}");
            }
            was_peak = env.at_peak;
            prev = g;
        }
    }

    #[test]
    fn repress_resumes_from_current_gain() {
        let params = EnvelopeParams::default();
        let mut env = Envelope::new(&params, SR);
        for _ in 0..(params.attack * SR) as usize + 10 {
            env.step(true);
        }
        // partial release
        for _ in 0..(params.release * SR / 2.0) as usize {
            env.step(false);
        }
        let resumed_from = env.gain();
        assert!(resumed_from > 0.0, "Release should not have finished yet");
        let g = env.step(true);
        assert!(
            g >= resumed_from && g <= resumed_from + 2.0 * (1.0 / SR) / params.attack,
            "Re-press should resume attack from {resumed_from}, got {g}"
        );
    }

    #[test]
    fn decay_slows_below_sustain_level() {
        let params = EnvelopeParams::default();
        let mut env = Envelope::new(&params, SR);
        for _ in 0..(params.attack * SR) as usize + 10 {
            env.step(true);
        }
        // hold through the fast decay down to the sustain level
        let mut fast_steps = 0usize;
        while env.gain() > params.sustain_level {
            let before = env.gain();
            env.step(true);
            fast_steps += 1;
            assert!(env.gain() < before, "Gain should decay while held at peak");
            assert!(fast_steps < (params.decay * SR) as usize + 10, "Fast decay took too long");
        }
        // below the sustain level the per-step drop becomes much smaller
        let before = env.gain();
        env.step(true);
        let slow_drop = before - env.gain();
        let dt = 1.0 / SR;
        assert!(
            (slow_drop - dt / params.sustain_decay).abs() < 1e-12,
            "Sustain fade should use the slow rate, dropped {slow_drop}"
        );
    }
}
