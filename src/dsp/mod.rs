//! Signal synthesis: oscillators, envelopes, combinators, and the voice bank.

pub mod envelope;
pub mod oscillator;
pub mod piano;
pub mod signal;

pub use envelope::{Envelope, EnvelopeParams};
pub use oscillator::Oscillator;
pub use piano::Piano;
pub use signal::{SampleSource, Signal};
