//! Modem configuration: every tunable the TX/RX chain needs, plus the
//! packet-mode switch and noise-floor gate.

use crate::error::ModemError;

/// Every tunable the modem needs to design its filters, oscillator, and
/// framing state, plus the `packet_mode`/`noise_floor` switches.
#[derive(Debug, Clone, PartialEq)]
pub struct ModemConfig {
    /// PCM sample rate for TX; RX reads this from the WAV header instead.
    pub sample_rate: u32,
    /// MARK tone, Hz.
    pub upper_frequency: f64,
    /// SPACE tone, Hz.
    pub lower_frequency: f64,
    /// Symbols per second.
    pub baud_rate: u32,
    /// Band-pass filter bandwidth, Hz.
    pub filter_width: f64,
    /// Envelope target at the end of one idle bit, in `(0, 1)`.
    pub rc_decay_per_bit: f64,
    /// Data payload width per packet, used only when `packet_mode` is set.
    pub data_bits: u32,
    /// Selects the CRC-checked packet de-framer over plain-byte framing.
    pub packet_mode: bool,
    /// Minimum envelope amplitude (PCM units) below which both bands are
    /// considered silent, per the `U > L` slicer with a combined-amplitude
    /// gate (see [`crate::fsm::slice`]).
    pub noise_floor: i16,
}

impl ModemConfig {
    /// The reference's defaults: 48 kHz, 10 kHz/5 kHz tones, 10 baud, 8-bit
    /// bytes, byte-stream framing.
    pub fn defaults() -> Self {
        ModemConfig {
            sample_rate: 48_000,
            upper_frequency: 10_000.0,
            lower_frequency: 5_000.0,
            baud_rate: 10,
            filter_width: 1_000.0,
            rc_decay_per_bit: 0.1,
            data_bits: 8,
            packet_mode: false,
            noise_floor: 256,
        }
    }

    /// Samples per bit, `Fs/baud`.
    pub fn samples_per_bit(&self) -> u32 {
        self.sample_rate / self.baud_rate
    }

    /// Validate that `Fs/baud` is an integer `>= 4`, plus the half-bit
    /// countdown requirement ([`crate::fsm::FramingFsm`] needs an even sample
    /// count to split exactly) and basic sanity on the decay target and tone
    /// separation.
    pub fn validate(&self) -> Result<(), ModemError> {
        if self.baud_rate == 0 {
            return Err(ModemError::Configuration("baud_rate must be nonzero".to_string()));
        }
        if self.sample_rate % self.baud_rate != 0 {
            return Err(ModemError::Configuration(format!(
                "sample_rate {} is not an integer multiple of baud_rate {}",
                self.sample_rate, self.baud_rate
            )));
        }
        let samples_per_bit = self.samples_per_bit();
        if samples_per_bit < 4 {
            return Err(ModemError::Configuration(format!(
                "Fs/baud must be >= 4, got {samples_per_bit}"
            )));
        }
        if samples_per_bit % 2 != 0 {
            return Err(ModemError::Configuration(format!(
                "Fs/baud must be even for mid-bit sampling, got {samples_per_bit}"
            )));
        }
        if !(self.rc_decay_per_bit > 0.0 && self.rc_decay_per_bit < 1.0) {
            return Err(ModemError::Configuration(format!(
                "rc_decay_per_bit must be in (0, 1), got {}",
                self.rc_decay_per_bit
            )));
        }
        if self.upper_frequency <= 0.0 || self.upper_frequency >= self.sample_rate as f64 / 2.0 {
            return Err(ModemError::Configuration(format!(
                "upper_frequency {} must be in (0, Nyquist)",
                self.upper_frequency
            )));
        }
        if self.lower_frequency <= 0.0 || self.lower_frequency >= self.sample_rate as f64 / 2.0 {
            return Err(ModemError::Configuration(format!(
                "lower_frequency {} must be in (0, Nyquist)",
                self.lower_frequency
            )));
        }
        if self.packet_mode && (self.data_bits == 0 || self.data_bits + 18 > 64) {
            return Err(ModemError::Configuration(format!(
                "data_bits must be in 1..=46 for packet mode, got {}",
                self.data_bits
            )));
        }
        Ok(())
    }
}

impl Default for ModemConfig {
    fn default() -> Self {
        Self::defaults()
    }
}
