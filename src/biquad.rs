//! Two-pole band-pass filter, direct form I.
//!
//! The split between a coefficient-design function and a separate streaming
//! state struct follows `lsx_biquad_start`/`lsx_biquad_flow` (`biquads.c`),
//! which use the same 0 dB-peak-gain band-pass formula from the RBJ Audio EQ
//! Cookbook.

use crate::error::ModemError;
use crate::fixed::Real;

/// Normalized biquad coefficients (`a0` folded to 1, the rest divided
/// through). Invariant for the lifetime of the filter once designed.
#[derive(Copy, Clone, Debug)]
pub struct BiquadCoefs<F> {
    pub b0: F,
    pub b1: F,
    pub b2: F,
    pub a1: F,
    pub a2: F,
}

impl<F: Real> BiquadCoefs<F> {
    /// RBJ constant-0dB-peak-gain band-pass design.
    ///
    /// `center_hz` is the MARK or SPACE carrier frequency; `bandwidth_hz` is
    /// the filter width. Fails with `ModemError::Configuration` if
    /// `center_hz` is at or above Nyquist.
    pub fn band_pass(sample_rate: f64, center_hz: f64, bandwidth_hz: f64) -> Result<Self, ModemError> {
        let omega0 = 2.0 * std::f64::consts::PI * center_hz / sample_rate;
        if omega0 > std::f64::consts::PI {
            return Err(ModemError::Configuration(format!(
                "center frequency {center_hz} Hz is at or above Nyquist for sample rate {sample_rate} Hz"
            )));
        }
        let alpha = omega0.sin() / (2.0 * center_hz / bandwidth_hz);

        let b0 = alpha;
        let b1 = 0.0;
        let b2 = -alpha;
        let a0 = 1.0 + alpha;
        let a1 = -2.0 * omega0.cos();
        let a2 = 1.0 - alpha;

        Ok(BiquadCoefs {
            b0: F::from_f64_checked(b0 / a0)?,
            b1: F::from_f64_checked(b1 / a0)?,
            b2: F::from_f64_checked(b2 / a0)?,
            a1: F::from_f64_checked(a1 / a0)?,
            a2: F::from_f64_checked(a2 / a0)?,
        })
    }

    /// Frequency response at `freq_hz`, expressed in dB relative to the
    /// design's 0 dB peak. Used only for the steady-state invariant test;
    /// always evaluated in `f64` regardless of `F`.
    pub fn response_db(&self, sample_rate: f64, freq_hz: f64) -> f64 {
        use num_complex::Complex64;
        let omega = 2.0 * std::f64::consts::PI * freq_hz / sample_rate;
        let z1 = Complex64::from_polar(1.0, -omega);
        let z2 = z1 * z1;
        let re = |x: F| Complex64::new(x.to_f64(), 0.0);
        let num = re(self.b0) + re(self.b1) * z1 + re(self.b2) * z2;
        let den = Complex64::new(1.0, 0.0) + re(self.a1) * z1 + re(self.a2) * z2;
        20.0 * (num / den).norm().log10()
    }
}

/// Streaming two-pole IIR filter in direct form I.
///
/// Owns its own state (`x1, x2, y1, y2`); never shared between two logical
/// filters: interleaving two logical filters on one state silently
/// corrupts both.
#[derive(Clone)]
pub struct Biquad<F> {
    coefs: BiquadCoefs<F>,
    x1: F,
    x2: F,
    y1: F,
    y2: F,
    clips: u64,
}

impl<F: Real> Biquad<F> {
    pub fn new(coefs: BiquadCoefs<F>) -> Self {
        Biquad {
            coefs,
            x1: F::zero(),
            x2: F::zero(),
            y1: F::zero(),
            y2: F::zero(),
            clips: 0,
        }
    }

    pub fn coefs(&self) -> &BiquadCoefs<F> {
        &self.coefs
    }

    pub fn reset(&mut self) {
        self.x1 = F::zero();
        self.x2 = F::zero();
        self.y1 = F::zero();
        self.y2 = F::zero();
    }

    /// Cumulative number of output samples that saturated at the PCM range.
    pub fn clip_count(&self) -> u64 {
        self.clips
    }

    /// One sample of the direct-form-I recurrence, entirely in the internal
    /// (`F`) domain. Callers that need PCM in/out go through [`Biquad::process`].
    #[inline]
    pub fn tick(&mut self, x0: F) -> F {
        let y0 = self.coefs.b0 * x0 + self.coefs.b1 * self.x1 + self.coefs.b2 * self.x2
            - self.coefs.a1 * self.y1
            - self.coefs.a2 * self.y2;
        self.x2 = self.x1;
        self.x1 = x0;
        self.y2 = self.y1;
        self.y1 = y0;
        y0
    }

    /// Process up to `min(input.len(), output.len())` PCM samples. Returns
    /// the number of samples actually processed. Output is rounded-with-clip;
    /// clipped samples bump [`Biquad::clip_count`] but never fail the call.
    pub fn process(&mut self, input: &[i16], output: &mut [i16]) -> usize {
        let len = input.len().min(output.len());
        for i in 0..len {
            let y0 = self.tick(F::from_pcm_sample(input[i]));
            let (sample, clipped) = y0.to_pcm_sample_clipped();
            if clipped {
                self.clips += 1;
                log::trace!("biquad output clipped at sample {i}");
            }
            output[i] = sample;
        }
        len
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: f64 = 48_000.0;

    #[test]
    fn zero_input_yields_zero_output_once_state_is_zero() {
        let coefs = BiquadCoefs::<f64>::band_pass(SAMPLE_RATE, 10_000.0, 1_000.0).unwrap();
        let mut filter = Biquad::new(coefs);
        let input = [0i16; 64];
        let mut output = [0i16; 64];
        filter.process(&input, &mut output);
        assert!(output.iter().all(|&s| s == 0));
        assert_eq!(filter.clip_count(), 0);
    }

    #[test]
    fn rejects_center_frequency_at_or_above_nyquist() {
        assert!(BiquadCoefs::<f64>::band_pass(SAMPLE_RATE, SAMPLE_RATE / 2.0 + 1.0, 1_000.0).is_err());
        assert!(BiquadCoefs::<f64>::band_pass(SAMPLE_RATE, SAMPLE_RATE / 2.0 - 1.0, 1_000.0).is_ok());
    }

    #[test]
    fn steady_state_response_peaks_near_center_frequency() {
        let center = 10_000.0;
        let coefs = BiquadCoefs::<f64>::band_pass(SAMPLE_RATE, center, 1_000.0).unwrap();
        let peak_db = coefs.response_db(SAMPLE_RATE, center);
        assert!(peak_db.abs() < 0.5, "peak response was {peak_db} dB, expected ~0 dB");
    }

    #[test]
    fn zero_length_input_produces_zero_length_output_with_no_state_change() {
        let coefs = BiquadCoefs::<f64>::band_pass(SAMPLE_RATE, 10_000.0, 1_000.0).unwrap();
        let mut filter = Biquad::new(coefs);
        let processed = filter.process(&[], &mut []);
        assert_eq!(processed, 0);
        assert_eq!(filter.clip_count(), 0);
    }

    #[test]
    fn process_consumes_the_shorter_of_the_two_buffers() {
        let coefs = BiquadCoefs::<f64>::band_pass(SAMPLE_RATE, 10_000.0, 1_000.0).unwrap();
        let mut filter = Biquad::new(coefs);
        let input = [1000i16; 10];
        let mut output = [0i16; 4];
        let processed = filter.process(&input, &mut output);
        assert_eq!(processed, 4);
    }

    #[test]
    fn fixed_point_and_float_paths_track_each_other() {
        use crate::fixed::Q;
        let coefs_f64 = BiquadCoefs::<f64>::band_pass(SAMPLE_RATE, 10_000.0, 1_000.0).unwrap();
        let coefs_q = BiquadCoefs::<Q>::band_pass(SAMPLE_RATE, 10_000.0, 1_000.0).unwrap();
        let mut float_filter = Biquad::new(coefs_f64);
        let mut fixed_filter = Biquad::new(coefs_q);

        let mut phase = 0.0;
        let delta = 2.0 * std::f64::consts::PI * 10_000.0 / SAMPLE_RATE;
        let input: Vec<i16> = (0..256)
            .map(|_| {
                phase += delta;
                (phase.sin() * 10_000.0) as i16
            })
            .collect();

        let mut float_out = vec![0i16; input.len()];
        let mut fixed_out = vec![0i16; input.len()];
        float_filter.process(&input, &mut float_out);
        fixed_filter.process(&input, &mut fixed_out);

        for (a, b) in float_out.iter().zip(fixed_out.iter()) {
            assert!((*a as i32 - *b as i32).abs() <= 64, "diverged: {a} vs {b}");
        }
    }
}
