//! Phase-continuous two-tone (FSK) oscillator.
//!
//! Grounded on the reference implementation's `generate()` loop in
//! `model/siggen.c`: a phase accumulator advanced by `upper_delta` or
//! `lower_delta` depending on the current bit, wrapped modulo `2π`, never
//! reset across a bit transition. The non-generic, plain-`f64`-phase design
//! matches this being a fixed two-tone generator rather than an
//! arbitrary-frequency audio-rate node.

use crate::error::ModemError;

/// Phase-continuous two-tone oscillator.
///
/// `φ` is never reset between bits: phase continuity across bit transitions
/// is what gives the band-pass filters clean separation downstream.
#[derive(Clone)]
pub struct FskOscillator {
    phase: f64,
    delta_mark: f64,
    delta_space: f64,
}

impl FskOscillator {
    /// `mark_hz` is MARK (bit = 1), `space_hz` is SPACE (bit = 0). Fails if
    /// either tone is at or above Nyquist, the same check the band-pass
    /// filter design performs on its own center frequency.
    pub fn new(sample_rate: f64, mark_hz: f64, space_hz: f64) -> Result<Self, ModemError> {
        for (name, hz) in [("mark", mark_hz), ("space", space_hz)] {
            if hz <= 0.0 || hz >= sample_rate / 2.0 {
                return Err(ModemError::Configuration(format!(
                    "{name} frequency {hz} Hz must be in (0, Nyquist) for sample rate {sample_rate} Hz"
                )));
            }
        }
        let two_pi = 2.0 * std::f64::consts::PI;
        Ok(FskOscillator {
            phase: 0.0,
            delta_mark: two_pi * mark_hz / sample_rate,
            delta_space: two_pi * space_hz / sample_rate,
        })
    }

    /// Advance the phase accumulator by one sample of `bit` and return the
    /// quantized PCM sample: `round(sin(φ) · (S_max - 1))`.
    #[inline]
    pub fn tick(&mut self, bit: bool) -> i16 {
        self.phase += if bit { self.delta_mark } else { self.delta_space };
        let two_pi = 2.0 * std::f64::consts::PI;
        if self.phase > two_pi {
            self.phase -= two_pi;
        }
        (self.phase.sin() * (i16::MAX as f64 - 1.0)).floor_round()
    }

    /// Fill `output` with `output.len()` samples of a steady `bit`, as used
    /// for the lead-in/lead-out carrier: a settled MARK tone before the
    /// first frame and after the last.
    pub fn fill(&mut self, bit: bool, output: &mut [i16]) {
        for sample in output.iter_mut() {
            *sample = self.tick(bit);
        }
    }
}

trait FloorRound {
    fn floor_round(self) -> i16;
}

impl FloorRound for f64 {
    /// `floor(x + 0.5)`, matching the reference's rounding exactly (it
    /// differs from `f64::round()` for negative half-integers, which never
    /// occur here but the exact form is kept for fidelity to the original).
    fn floor_round(self) -> i16 {
        (self + 0.5).floor() as i16
    }
}
