//! Full TX (`encode`) and RX (`decode`) block pipelines, wiring the
//! oscillator/framer into one chain and the biquad/envelope/FSM into the
//! other. Packet-mode variants reuse the same oscillator and bit-recovery
//! machinery with [`crate::deframer::PacketDeframer`] in place of
//! [`crate::fsm::FramingFsm`].
//!
//! Processes the whole input in fixed-size blocks (2^14 samples); the
//! pipeline itself is a single-threaded, synchronous loop over the entire
//! input. There is nothing to suspend or cancel beyond reaching the end of
//! the buffer.

use crate::biquad::{Biquad, BiquadCoefs};
use crate::config::ModemConfig;
use crate::deframer::{PacketDeframer, PacketEvent};
use crate::envelope::EnvelopeFollower;
use crate::error::ModemError;
use crate::fixed::Real;
use crate::framer::build_frame;
use crate::fsm::{slice, Bit, Event, FramingFsm, State};
use crate::oscillator::FskOscillator;

const BLOCK_SIZE: usize = 1 << 14;

/// One sample's worth of internal pipeline state, handed to an optional
/// [`DecodeTap`]: the data half of the reference's `fd_debug` column dump,
/// without its text presentation.
#[derive(Debug, Clone, Copy)]
pub struct DecodeSample {
    pub time_index: u64,
    pub upper_filtered: i16,
    pub lower_filtered: i16,
    pub upper_level: i16,
    pub lower_level: i16,
    pub state: State,
}

/// A per-sample diagnostic callback; see [`DecodeSample`].
pub type DecodeTap<'a> = dyn FnMut(&DecodeSample) + 'a;

/// Counters accumulated over a `decode` run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodeStats {
    pub framing_errors: u64,
    pub upper_clips: u64,
    pub lower_clips: u64,
}

/// Encode a byte stream into PCM samples: lead-in MARK, one 10-bit
/// start/8-data/stop frame per byte, lead-out MARK.
pub fn encode(config: &ModemConfig, bytes: &[u8]) -> Result<Vec<i16>, ModemError> {
    config.validate()?;
    let mut oscillator = FskOscillator::new(
        config.sample_rate as f64,
        config.upper_frequency,
        config.lower_frequency,
    )?;
    let samples_per_bit = config.samples_per_bit() as usize;
    let lead_samples = (config.sample_rate / 10) as usize;

    let mut out = Vec::with_capacity(
        lead_samples * 2 + bytes.len() * samples_per_bit * crate::framer::BYTE_FRAME_WIDTH as usize,
    );

    let mut lead_in = vec![0i16; lead_samples];
    oscillator.fill(true, &mut lead_in);
    out.extend_from_slice(&lead_in);

    for &byte in bytes {
        let frame = crate::framer::build_byte_frame(byte);
        for i in 0..crate::framer::BYTE_FRAME_WIDTH {
            let bit = (frame >> i) & 1 == 1;
            let mut group = vec![0i16; samples_per_bit];
            oscillator.fill(bit, &mut group);
            out.extend_from_slice(&group);
        }
    }

    let mut lead_out = vec![0i16; lead_samples];
    oscillator.fill(true, &mut lead_out);
    out.extend_from_slice(&lead_out);

    Ok(out)
}

/// Encode a sequence of `data_bits`-wide packet payloads, mirroring
/// `packetgen_build_samples`'s lead-in/lead-out-at-MARK and per-packet
/// framing.
pub fn encode_packets(config: &ModemConfig, payloads: &[u64]) -> Result<Vec<i16>, ModemError> {
    config.validate()?;
    let mut oscillator = FskOscillator::new(
        config.sample_rate as f64,
        config.upper_frequency,
        config.lower_frequency,
    )?;
    let samples_per_bit = config.samples_per_bit() as usize;
    let lead_samples = (config.sample_rate / 10) as usize;
    let width = crate::framer::frame_width(config.data_bits);

    let mut out = Vec::with_capacity(lead_samples * 2 + payloads.len() * samples_per_bit * width as usize);

    let mut lead_in = vec![0i16; lead_samples];
    oscillator.fill(true, &mut lead_in);
    out.extend_from_slice(&lead_in);

    for &payload in payloads {
        let frame = build_frame(payload, config.data_bits)?;
        for i in 0..width {
            let bit = (frame >> i) & 1 == 1;
            let mut group = vec![0i16; samples_per_bit];
            oscillator.fill(bit, &mut group);
            out.extend_from_slice(&group);
        }
    }

    let mut lead_out = vec![0i16; lead_samples];
    oscillator.fill(true, &mut lead_out);
    out.extend_from_slice(&lead_out);

    Ok(out)
}

struct RxBands<F> {
    upper_filter: Biquad<F>,
    lower_filter: Biquad<F>,
    upper_follower: EnvelopeFollower<F>,
    lower_follower: EnvelopeFollower<F>,
}

impl<F: Real> RxBands<F> {
    fn design(config: &ModemConfig) -> Result<Self, ModemError> {
        let sample_rate = config.sample_rate as f64;
        let upper_coefs =
            BiquadCoefs::<F>::band_pass(sample_rate, config.upper_frequency, config.filter_width)?;
        let lower_coefs =
            BiquadCoefs::<F>::band_pass(sample_rate, config.lower_frequency, config.filter_width)?;
        let samples_per_bit = config.samples_per_bit() as f64;
        Ok(RxBands {
            upper_filter: Biquad::new(upper_coefs),
            lower_filter: Biquad::new(lower_coefs),
            upper_follower: EnvelopeFollower::<F>::design(config.rc_decay_per_bit, samples_per_bit)?,
            lower_follower: EnvelopeFollower::<F>::design(config.rc_decay_per_bit, samples_per_bit)?,
        })
    }
}

/// Decode PCM samples back into a byte stream, run over a caller-chosen
/// numeric domain `F`: both `f64` and [`crate::fixed::Fixed`] must decode
/// identical byte streams from identical input.
pub fn decode<F: Real>(
    config: &ModemConfig,
    samples: &[i16],
    mut tap: Option<&mut DecodeTap<'_>>,
) -> Result<(Vec<u8>, DecodeStats), ModemError> {
    config.validate()?;
    let mut bands = RxBands::<F>::design(config)?;
    let mut fsm = FramingFsm::new(config.samples_per_bit())?;

    let mut bytes = Vec::new();
    let mut stats = DecodeStats::default();
    let mut time_index: u64 = 0;

    for block in samples.chunks(BLOCK_SIZE) {
        let mut upper_filtered = vec![0i16; block.len()];
        let mut lower_filtered = vec![0i16; block.len()];
        let n_upper = bands.upper_filter.process(block, &mut upper_filtered);
        let n_lower = bands.lower_filter.process(block, &mut lower_filtered);
        if n_upper != n_lower {
            // The two bands must always produce the same number of output
            // samples from the same input block.
            return Err(ModemError::Bug(format!(
                "block-size mismatch between MARK ({n_upper}) and SPACE ({n_lower}) filter outputs"
            )));
        }

        let mut upper_level = vec![0i16; n_upper];
        let mut lower_level = vec![0i16; n_upper];
        bands.upper_follower.process(&upper_filtered[..n_upper], &mut upper_level);
        bands.lower_follower.process(&lower_filtered[..n_upper], &mut lower_level);

        for i in 0..n_upper {
            let bit = slice(upper_level[i], lower_level[i], config.noise_floor);
            let event = fsm.step(bit);
            match event {
                Event::Byte(byte) => bytes.push(byte),
                Event::FramingError => stats.framing_errors += 1,
                Event::None => {}
            }
            if let Some(tap) = tap.as_deref_mut() {
                tap(&DecodeSample {
                    time_index,
                    upper_filtered: upper_filtered[i],
                    lower_filtered: lower_filtered[i],
                    upper_level: upper_level[i],
                    lower_level: lower_level[i],
                    state: fsm.state(),
                });
            }
            time_index += 1;
        }
    }

    stats.upper_clips = bands.upper_filter.clip_count();
    stats.lower_clips = bands.lower_filter.clip_count();
    Ok((bytes, stats))
}

/// Decode PCM samples into CRC-checked packet payloads.
pub fn decode_packets<F: Real>(
    config: &ModemConfig,
    samples: &[i16],
) -> Result<(Vec<u64>, DecodeStats, u64), ModemError> {
    config.validate()?;
    let mut bands = RxBands::<F>::design(config)?;
    let mut deframer = PacketDeframer::new(config.data_bits, config.samples_per_bit())?;

    let mut payloads = Vec::new();
    let mut stats = DecodeStats::default();
    let mut crc_errors = 0u64;

    for block in samples.chunks(BLOCK_SIZE) {
        let mut upper_filtered = vec![0i16; block.len()];
        let mut lower_filtered = vec![0i16; block.len()];
        let n_upper = bands.upper_filter.process(block, &mut upper_filtered);
        let n_lower = bands.lower_filter.process(block, &mut lower_filtered);
        if n_upper != n_lower {
            return Err(ModemError::Bug(format!(
                "block-size mismatch between MARK ({n_upper}) and SPACE ({n_lower}) filter outputs"
            )));
        }

        let mut upper_level = vec![0i16; n_upper];
        let mut lower_level = vec![0i16; n_upper];
        bands.upper_follower.process(&upper_filtered[..n_upper], &mut upper_level);
        bands.lower_follower.process(&lower_filtered[..n_upper], &mut lower_level);

        for i in 0..n_upper {
            let bit = slice(upper_level[i], lower_level[i], config.noise_floor);
            match deframer.step(bit) {
                PacketEvent::Packet(payload) => payloads.push(payload),
                PacketEvent::CrcMismatch { .. } => {
                    crc_errors += 1;
                    log::warn!("packet CRC mismatch, discarding frame");
                }
                PacketEvent::FramingError => stats.framing_errors += 1,
                PacketEvent::None => {}
            }
        }
    }

    stats.upper_clips = bands.upper_filter.clip_count();
    stats.lower_clips = bands.lower_filter.clip_count();
    Ok((payloads, stats, crc_errors))
}
