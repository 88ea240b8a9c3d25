//! Piano — the voice bank composing all playable notes into one signal.

use log::debug;

use crate::config::EngineConfig;

use super::signal::{SampleSource, Signal};

/// Number of harmonic partials stacked per note.
const PARTIALS: u32 = 8;
/// Fixed offset in Hz of the extra near-unison partial. The slight detune
/// against the fundamental produces a beating, chorus-like character.
const DETUNE_HZ: f64 = 2.0;
/// Gain of the detuned partial.
const DETUNE_GAIN: f64 = 0.3;
/// Gain applied to each enveloped note before the final mix.
const NOTE_GAIN: f64 = 0.4;

/// A fixed bank of harmonically-stacked, enveloped notes.
///
/// Built once from a list of base frequencies; the note set is immutable
/// afterwards. The bank owns both the pressed-flag table and the composed
/// top-level [`Signal`], and is the only place the two meet: `next_sample`
/// threads the flags through the graph so each note's envelope can observe
/// its own flag.
#[derive(Debug, Clone)]
pub struct Piano {
    notes: Vec<bool>,
    signal: Signal,
}

impl Piano {
    /// Build one voice per base frequency: partials `j = 1..=8` at
    /// `scale(0.5/j, osc(f*j))` plus `scale(0.3, osc(f+2))`, mixed, shaped
    /// by the note's envelope, then scaled by 0.4.
    pub fn new(frequencies: &[f64], config: &EngineConfig) -> Self {
        let sr = config.sample_rate as f64;
        let mut voices = Vec::with_capacity(frequencies.len());
        for (note, &f) in frequencies.iter().enumerate() {
            let mut partials = Vec::with_capacity(PARTIALS as usize + 1);
            for j in 1..=PARTIALS {
                let j = j as f64;
                partials.push(Signal::scale(0.5 / j, Signal::oscillator(f * j, sr)));
            }
            partials.push(Signal::scale(DETUNE_GAIN, Signal::oscillator(f + DETUNE_HZ, sr)));
            let stack = Signal::mix(partials);
            voices.push(Signal::scale(
                NOTE_GAIN,
                Signal::envelope(note, &config.envelope, sr, stack),
            ));
        }
        debug!("built voice bank with {} notes", frequencies.len());
        Piano {
            notes: vec![false; frequencies.len()],
            signal: Signal::mix(voices),
        }
    }

    /// Press a note. `key` must be a valid note index; out-of-range panics.
    pub fn note_on(&mut self, key: usize) {
        self.notes[key] = true;
    }

    /// Release a note. `key` must be a valid note index; out-of-range panics.
    pub fn note_off(&mut self, key: usize) {
        self.notes[key] = false;
    }

    pub fn is_pressed(&self, key: usize) -> bool {
        self.notes[key]
    }

    pub fn note_count(&self) -> usize {
        self.notes.len()
    }
}

impl SampleSource for Piano {
    fn next_sample(&mut self) -> f64 {
        self.signal.next_sample(&self.notes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ticks(config: &EngineConfig, seconds: f64) -> usize {
        (config.sample_rate as f64 * seconds) as usize
    }

    #[test]
    fn silent_until_pressed() {
        let config = EngineConfig::default();
        let mut piano = Piano::new(&[440.0], &config);
        for _ in 0..1000 {
            assert_eq!(piano.next_sample(), 0.0);
        }
    }

    #[test]
    fn tracks_pressed_flags() {
        let config = EngineConfig::default();
        let mut piano = Piano::new(&[440.0, 550.0, 660.0], &config);
        assert_eq!(piano.note_count(), 3);
        assert!(!piano.is_pressed(1));
        piano.note_on(1);
        assert!(piano.is_pressed(1));
        piano.note_off(1);
        assert!(!piano.is_pressed(1));
    }

    #[test]
    fn attack_then_release_to_silence() {
        let config = EngineConfig::default();
        let mut piano = Piano::new(&[440.0], &config);

        piano.note_on(0);
        let mut peak: f64 = 0.0;
        for _ in 0..ticks(&config, config.envelope.attack) + 100 {
            peak = peak.max(piano.next_sample().abs());
        }
        assert!(peak > 0.1, "Note should be audible after attack, peak {peak}");

        piano.note_off(0);
        for _ in 0..ticks(&config, config.envelope.release) + 100 {
            piano.next_sample();
        }
        // envelope gain has floored at zero, so the output is exactly silent
        for _ in 0..100 {
            assert_eq!(piano.next_sample(), 0.0, "Note should be silent after release");
        }
    }

    #[test]
    fn polyphony_sums_voices() {
        let config = EngineConfig::default();
        let mut solo = Piano::new(&[440.0], &config);
        let mut duo = Piano::new(&[440.0, 550.0], &config);
        solo.note_on(0);
        duo.note_on(0);
        // the silent second voice must not disturb the first
        for _ in 0..5000 {
            let a = solo.next_sample();
            let b = duo.next_sample();
            assert!((a - b).abs() < 1e-12, "Unpressed voice altered output");
        }
        // pressing it makes the outputs diverge
        duo.note_on(1);
        let mut diverged = false;
        for _ in 0..5000 {
            if (solo.next_sample() - duo.next_sample()).abs() > 1e-6 {
                diverged = true;
            }
        }
        assert!(diverged, "Second pressed voice should contribute");
    }

    #[test]
    #[should_panic]
    fn out_of_range_note_panics() {
        let config = EngineConfig::default();
        let mut piano = Piano::new(&[440.0], &config);
        piano.note_on(1);
    }

    #[test]
    fn dump_reference_wav() {
        // Render half a second of A4 for manual listening.
        let config = EngineConfig::default();
        let mut piano = Piano::new(&[440.0], &config);
        piano.note_on(0);

        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: config.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let path = std::env::temp_dir().join("keytone_a440.wav");
        let mut writer = hound::WavWriter::create(&path, spec).expect("create wav");
        for _ in 0..config.sample_rate / 2 {
            let s = piano.next_sample().clamp(-1.0, 1.0);
            writer
                .write_sample((s * i16::MAX as f64).round() as i16)
                .expect("write sample");
        }
        writer.finalize().expect("finalize wav");
        assert!(path.metadata().expect("wav metadata").len() > 44);
    }
}
