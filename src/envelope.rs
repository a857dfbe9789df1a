//! Leaky-peak envelope follower, a.k.a. the "RC" detector.
//!
//! Grounded on `rc_filter_setup`/`rc_filter` (`model/sigdec.cpp`):
//! `level = max(|sample|, level * decay)`, with `decay` derived from a
//! target per-bit decay ratio rather than a cutoff frequency. The split
//! between a `design()` step and a stateful streaming struct mirrors how
//! `Biquad`/`BiquadCoefs` separate filter design from streaming state.

use crate::error::ModemError;
use crate::fixed::Real;

/// Streaming leaky-peak detector.
///
/// Owns its own `level` state; never shared between the MARK and SPACE
/// envelope followers.
#[derive(Clone)]
pub struct EnvelopeFollower<F> {
    decay: F,
    level: F,
}

impl<F: Real> EnvelopeFollower<F> {
    /// Design a follower whose level decays to `rc_decay_per_bit` of its
    /// starting value over `samples_per_bit` samples of silence, matching
    /// the reference's `time_constant = log(decay_per_bit) / -bit_samples`.
    ///
    /// `rc_decay_per_bit` must be in `(0, 1)`; `samples_per_bit` must be
    /// positive. Both are checked at configuration time.
    pub fn design(rc_decay_per_bit: f64, samples_per_bit: f64) -> Result<Self, ModemError> {
        if !(rc_decay_per_bit > 0.0 && rc_decay_per_bit < 1.0) {
            return Err(ModemError::Configuration(format!(
                "rc_decay_per_bit must be in (0, 1), got {rc_decay_per_bit}"
            )));
        }
        if !(samples_per_bit > 0.0) {
            return Err(ModemError::Configuration(format!(
                "samples_per_bit must be positive, got {samples_per_bit}"
            )));
        }
        let time_constant = rc_decay_per_bit.ln() / -samples_per_bit;
        let decay = (-time_constant).exp();
        Ok(EnvelopeFollower {
            decay: F::from_f64_checked(decay)?,
            level: F::zero(),
        })
    }

    /// Construct directly from an already-computed decay factor, used by the
    /// fixed-vs-float cross-check test so both paths share one `decay`.
    pub fn with_decay(decay: F) -> Self {
        EnvelopeFollower {
            decay,
            level: F::zero(),
        }
    }

    pub fn level(&self) -> F {
        self.level
    }

    pub fn reset(&mut self) {
        self.level = F::zero();
    }

    /// One sample of the leaky-peak recurrence, entirely in the internal
    /// (`F`) domain.
    #[inline]
    pub fn tick(&mut self, x0: F) -> F {
        let decayed = self.level * self.decay;
        let peak = x0.abs();
        self.level = if peak > decayed { peak } else { decayed };
        self.level
    }

    /// Process up to `min(input.len(), output.len())` PCM samples. Output is
    /// the envelope level, rounded-with-clip back to PCM range; clipping here
    /// indicates the upstream band-pass gain was too high for the input, not
    /// a framing fault.
    pub fn process(&mut self, input: &[i16], output: &mut [i16]) -> usize {
        let len = input.len().min(output.len());
        for i in 0..len {
            let level = self.tick(F::from_pcm_sample(input[i]));
            let (sample, _clipped) = level.to_pcm_sample_clipped();
            output[i] = sample;
        }
        len
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLES_PER_BIT: f64 = 48_000.0 / 1200.0;

    #[test]
    fn level_is_never_negative() {
        let mut follower = EnvelopeFollower::<f64>::design(0.5, SAMPLES_PER_BIT).unwrap();
        for sample in [-1000i16, -1, 0, 1, 1000] {
            let level = follower.tick(f64::from_pcm_sample(sample));
            assert!(level.to_f64() >= 0.0);
        }
    }

    #[test]
    fn level_decays_no_faster_than_the_decay_factor() {
        let mut follower = EnvelopeFollower::<f64>::design(0.5, SAMPLES_PER_BIT).unwrap();
        let peak = follower.tick(f64::from_pcm_sample(20_000));
        let next = follower.tick(f64::from_pcm_sample(0));
        assert!((next.to_f64() - peak.to_f64() * follower.decay.to_f64()).abs() < 1e-9);
    }

    #[test]
    fn any_sample_above_the_decayed_level_reseeds_it() {
        let mut follower = EnvelopeFollower::<f64>::design(0.5, SAMPLES_PER_BIT).unwrap();
        follower.tick(f64::from_pcm_sample(100));
        let level = follower.tick(f64::from_pcm_sample(30_000));
        assert!((level.to_f64() - f64::from_pcm_sample(30_000).to_f64()).abs() < 1e-9);
    }

    #[test]
    fn continuous_mark_carrier_settles_near_peak_amplitude() {
        let mut follower = EnvelopeFollower::<f64>::design(0.1, SAMPLES_PER_BIT).unwrap();
        let mut phase = 0.0_f64;
        let delta = 2.0 * std::f64::consts::PI * 1200.0 / 48_000.0;
        let mut level = 0.0;
        for _ in 0..4000 {
            phase += delta;
            level = follower.tick(phase.sin()).to_f64();
        }
        assert!(level > 0.85, "settled level {level} was not near the 1.0 peak");
    }

    #[test]
    fn zero_decay_per_bit_rejected() {
        assert!(EnvelopeFollower::<f64>::design(0.0, SAMPLES_PER_BIT).is_err());
        assert!(EnvelopeFollower::<f64>::design(1.0, SAMPLES_PER_BIT).is_err());
    }

    #[test]
    fn fixed_and_float_paths_track_each_other() {
        use crate::fixed::Q;
        let mut float_follower = EnvelopeFollower::<f64>::design(0.5, SAMPLES_PER_BIT).unwrap();
        let mut fixed_follower = EnvelopeFollower::<Q>::design(0.5, SAMPLES_PER_BIT).unwrap();

        let mut phase = 0.0_f64;
        let delta = 2.0 * std::f64::consts::PI * 1200.0 / 48_000.0;
        let input: Vec<i16> = (0..512)
            .map(|_| {
                phase += delta;
                (phase.sin() * 15_000.0) as i16
            })
            .collect();

        let mut float_out = vec![0i16; input.len()];
        let mut fixed_out = vec![0i16; input.len()];
        float_follower.process(&input, &mut float_out);
        fixed_follower.process(&input, &mut fixed_out);

        for (a, b) in float_out.iter().zip(fixed_out.iter()) {
            assert!((*a as i32 - *b as i32).abs() <= 64, "diverged: {a} vs {b}");
        }
    }
}
