//! End-to-end scenarios, run at the pipeline level against the literal
//! parameters each one names.

use comfilter::pipeline::{decode, encode};
use comfilter::{ModemConfig, Wav};

fn byte_mode_config() -> ModemConfig {
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

#[test]
fn single_byte_round_trip_through_wav() {
    let config = byte_mode_config();
    let samples = encode(&config, &[0x41]).unwrap();

    let mut buf = Vec::new();
    Wav::mono(config.sample_rate, samples).write(&mut buf).unwrap();
    let wav = Wav::read(&buf[..]).unwrap();

    let (bytes, stats) = decode::<f64>(&config, &wav.samples, None).unwrap();
    assert_eq!(bytes, vec![0x41]);
    assert_eq!(stats.framing_errors, 0);
}

#[test]
fn lead_in_and_lead_out_give_the_documented_sample_count() {
    let config = byte_mode_config();
    let samples = encode(&config, &[0x00, 0xFF]).unwrap();

    let lead_samples = (config.sample_rate / 10) as usize; // 0.1 s each
    let samples_per_bit = config.samples_per_bit() as usize;
    let frame_width = comfilter::framer::BYTE_FRAME_WIDTH as usize;
    let expected = 2 * lead_samples + 2 * frame_width * samples_per_bit;
    assert_eq!(samples.len(), expected);

    let (bytes, _stats) = decode::<f64>(&config, &samples, None).unwrap();
    assert_eq!(bytes, vec![0x00, 0xFF]);
}

#[test]
fn packet_frame_carries_the_bit_reversed_crc_of_0xdeadbeef() {
    let payload: u64 = 0xDEADBEEF;
    let data_bits = 32;
    let frame = comfilter::framer::build_frame(payload, data_bits).unwrap();

    // bit 0 is the start bit; data occupies bits 1..=32; CRC occupies 33..=48.
    let reversed_crc = ((frame >> 1) >> data_bits) as u16 & 0xFFFF;
    let crc = comfilter::framer::reverse_crc(reversed_crc);
    assert_eq!(crc, comfilter::framer::crc16(payload, data_bits));
}

#[test]
fn a_corrupted_data_sample_never_silently_produces_a_different_byte() {
    let config = byte_mode_config();
    let mut samples = encode(&config, &[0x55]).unwrap();

    let lead_samples = (config.sample_rate / 10) as usize;
    let samples_per_bit = config.samples_per_bit() as usize;
    // Flip the sign of one sample near the middle of the frame's data region.
    let target = lead_samples + 4 * samples_per_bit + samples_per_bit / 2;
    samples[target] = -samples[target];

    let (bytes, stats) = decode::<f64>(&config, &samples, None).unwrap();
    assert!(
        bytes.is_empty() || bytes == vec![0x55] || stats.framing_errors > 0,
        "decoder silently emitted a wrong byte: {bytes:?}"
    );
}

#[test]
fn continuous_mark_carrier_settles_and_never_leaves_wait_low() {
    let config = byte_mode_config();
    let mut osc = comfilter::oscillator::FskOscillator::new(
        config.sample_rate as f64,
        config.upper_frequency,
        config.lower_frequency,
    )
    .unwrap();
    let mut samples = vec![0i16; config.sample_rate as usize];
    osc.fill(true, &mut samples);

    let mut last_state = comfilter::fsm::State::WaitHigh;
    let mut tap = |sample: &comfilter::pipeline::DecodeSample| {
        last_state = sample.state;
    };
    let (bytes, _stats) = decode::<f64>(&config, &samples, Some(&mut tap)).unwrap();
    assert!(bytes.is_empty());
    assert_eq!(last_state, comfilter::fsm::State::WaitLow);
}

#[test]
fn short_mark_space_mark_plus_byte_emits_exactly_one_byte() {
    let config = byte_mode_config();
    let mut osc = comfilter::oscillator::FskOscillator::new(
        config.sample_rate as f64,
        config.upper_frequency,
        config.lower_frequency,
    )
    .unwrap();
    let samples_per_bit = config.samples_per_bit() as usize;

    let mut samples = Vec::new();
    let mut group = |bit: bool| {
        let mut buf = vec![0i16; samples_per_bit];
        osc.fill(bit, &mut buf);
        buf
    };
    samples.extend(group(true)); // MARK
    samples.extend(group(false)); // SPACE (the start edge)
    samples.extend(group(true)); // MARK
    for _ in 0..7 {
        samples.extend(group(false));
    }
    samples.extend(group(true)); // stop bit

    let (bytes, _stats) = decode::<f64>(&config, &samples, None).unwrap();
    assert_eq!(bytes.len(), 1);
    assert_eq!(bytes[0] & 1, 1, "decoded LSB must match the forced first bit");
}
