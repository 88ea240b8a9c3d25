//! Signal — the unit of audio generation and its composition algebra.

use super::envelope::{Envelope, EnvelopeParams};
use super::oscillator::Oscillator;

/// A stateful per-sample audio generator.
///
/// A `Signal` produces one amplitude sample (nominally in [-1, 1]) per
/// `next_sample` call and must be advanced exactly once per sample tick.
/// Composition is by ownership: a combinator variant exclusively owns the
/// child signals it wraps or mixes. The one piece of shared state in the
/// graph — the note pressed flags — is owned by the voice bank and passed
/// down by reference each tick; the `Envelope` variant holds only an index
/// into it.
#[derive(Debug, Clone)]
pub enum Signal {
    /// A fixed-frequency sine oscillator.
    Oscillator(Oscillator),
    /// The child's output scaled by a constant gain.
    Scale(f64, Box<Signal>),
    /// The sum of all children. Every child is advanced exactly once per
    /// tick even when its contribution is silent, so internal phase and
    /// envelope state stay in step with wall-clock time.
    Mix(Vec<Signal>),
    /// The child's output shaped by a press-driven envelope reading
    /// `notes[note]` each tick.
    Envelope {
        note: usize,
        envelope: Envelope,
        inner: Box<Signal>,
    },
}

impl Signal {
    pub fn oscillator(frequency: f64, sample_rate: f64) -> Self {
        Signal::Oscillator(Oscillator::new(frequency, sample_rate))
    }

    pub fn scale(gain: f64, inner: Signal) -> Self {
        Signal::Scale(gain, Box::new(inner))
    }

    pub fn mix(children: Vec<Signal>) -> Self {
        Signal::Mix(children)
    }

    pub fn envelope(note: usize, params: &EnvelopeParams, sample_rate: f64, inner: Signal) -> Self {
        Signal::Envelope {
            note,
            envelope: Envelope::new(params, sample_rate),
            inner: Box::new(inner),
        }
    }

    /// Advance one tick and return the next sample. `notes` is the voice
    /// bank's pressed-flag table; envelope variants index into it.
    pub fn next_sample(&mut self, notes: &[bool]) -> f64 {
        match self {
            Signal::Oscillator(osc) => osc.next_sample(),
            Signal::Scale(gain, inner) => *gain * inner.next_sample(notes),
            Signal::Mix(children) => children.iter_mut().map(|c| c.next_sample(notes)).sum(),
            Signal::Envelope {
                note,
                envelope,
                inner,
            } => envelope.step(notes[*note]) * inner.next_sample(notes),
        }
    }
}

/// Anything the playback pipeline can pull samples from.
pub trait SampleSource {
    /// Produce the next sample, advancing internal state one tick.
    fn next_sample(&mut self) -> f64;
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f64 = 10000.0;

    #[test]
    fn empty_mix_is_silence() {
        let mut sig = Signal::mix(vec![]);
        for _ in 0..16 {
            assert_eq!(sig.next_sample(&[]), 0.0);
        }
    }

    #[test]
    fn mix_equals_sum_of_children() {
        let freqs = [220.0, 330.0, 440.0];
        let mut separate: Vec<Signal> =
            freqs.iter().map(|&f| Signal::oscillator(f, SR)).collect();
        let mut mixed = Signal::mix(freqs.iter().map(|&f| Signal::oscillator(f, SR)).collect());
        for _ in 0..1000 {
            let expected: f64 = separate.iter_mut().map(|s| s.next_sample(&[])).sum();
            let got = mixed.next_sample(&[]);
            assert!(
                (got - expected).abs() < 1e-12,
                "Mix diverged from sum: {got} vs {expected}"
            );
        }
    }

    #[test]
    fn scale_multiplies_output() {
        let mut plain = Signal::oscillator(440.0, SR);
        let mut scaled = Signal::scale(0.25, Signal::oscillator(440.0, SR));
        for _ in 0..1000 {
            let expected = 0.25 * plain.next_sample(&[]);
            let got = scaled.next_sample(&[]);
            assert!((got - expected).abs() < 1e-12);
        }
    }

    #[test]
    fn envelope_gates_inner_signal() {
        let params = EnvelopeParams::default();
        let mut sig = Signal::envelope(0, &params, SR, Signal::oscillator(440.0, SR));

        // never pressed: fully silent
        for _ in 0..1000 {
            assert_eq!(sig.next_sample(&[false]), 0.0);
        }

        // pressed: becomes audible
        let mut peak: f64 = 0.0;
        for _ in 0..(params.attack * SR) as usize + 200 {
            peak = peak.max(sig.next_sample(&[true]).abs());
        }
        assert!(peak > 0.5, "Pressed note should be audible, peak {peak}");
    }

    #[test]
    fn mix_advances_silent_children() {
        // A child behind a zero gain must still advance its phase.
        let mut muted = Signal::mix(vec![Signal::scale(
            0.0,
            Signal::oscillator(440.0, SR),
        )]);
        for _ in 0..100 {
            muted.next_sample(&[]);
        }
        let Signal::Mix(children) = &mut muted else {
            unreachable!()
        };
        let Signal::Scale(_, inner) = &mut children[0] else {
            unreachable!()
        };
        // after 100 ticks the oscillator is mid-cycle, not at phase zero
        let s = inner.next_sample(&[]);
        assert!(s.abs() > 1e-6, "Child phase did not advance, got {s}");
    }
}
