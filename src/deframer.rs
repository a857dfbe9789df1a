//! Packet de-framer, RX packet mode.
//!
//! Replaces the byte sink of [`crate::fsm::FramingFsm`] with a bit
//! accumulator: instead of emitting an octet every 9 bit decisions, it
//! collects `D + 18` bits after a start edge, splits out the `D` data bits
//! and 16 CRC bits, recomputes the CRC the same way `framer::build_frame`
//! does, and emits the data word only on a match.

use crate::error::ModemError;
use crate::framer::{crc16, reverse_crc};
use crate::fsm::Bit;

/// Outcome of feeding one sliced bit through the de-framer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PacketEvent {
    None,
    /// A complete `D + 18`-bit frame arrived with a matching CRC.
    Packet(u64),
    /// The frame's CRC did not match; the packet is discarded.
    CrcMismatch { expected: u16, received: u16 },
    /// Framing error identical in kind to [`crate::fsm::Event::FramingError`]
    /// (bad start confirmation or stop bit).
    FramingError,
}

/// Bit-accumulating counterpart of [`crate::fsm::FramingFsm`] for packet mode.
///
/// Reuses the exact state machine shape (half-bit countdown, start/stop
/// confirmation) but accumulates `data_bits + 16` payload+CRC bits instead of
/// 8 data bits.
#[derive(Clone)]
pub struct PacketDeframer {
    data_bits: u32,
    half_bit: u32,
    state: DeframerState,
    countdown: u32,
    bits_remaining: u32,
    accumulator: u64,
    shift: u32,
    error_count: u64,
    crc_error_count: u64,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum DeframerState {
    WaitHigh,
    WaitLow,
    Start,
    CheckStart,
    Accumulate,
    Stop,
    StopError,
    StartError,
}

impl PacketDeframer {
    /// `data_bits` is the payload width `D`; must leave room for the 18
    /// framing bits in a 64-bit accumulator.
    pub fn new(data_bits: u32, samples_per_bit: u32) -> Result<Self, ModemError> {
        if data_bits == 0 || data_bits + 18 > 64 {
            return Err(ModemError::Configuration(format!(
                "data_bits must be in 1..={}, got {data_bits}",
                64 - 18
            )));
        }
        if samples_per_bit < 4 || samples_per_bit % 2 != 0 {
            return Err(ModemError::Configuration(format!(
                "samples_per_bit must be an even number >= 4, got {samples_per_bit}"
            )));
        }
        Ok(PacketDeframer {
            data_bits,
            half_bit: samples_per_bit / 2,
            state: DeframerState::WaitHigh,
            countdown: 0,
            bits_remaining: 0,
            accumulator: 0,
            shift: 0,
            error_count: 0,
            crc_error_count: 0,
        })
    }

    pub fn error_count(&self) -> u64 {
        self.error_count
    }

    pub fn crc_error_count(&self) -> u64 {
        self.crc_error_count
    }

    pub fn step(&mut self, bit: Bit) -> PacketEvent {
        let bit_high = match bit {
            Bit::One => true,
            Bit::Zero => false,
            Bit::Invalid => return self.invalid_during(),
        };

        match self.state {
            DeframerState::WaitHigh | DeframerState::Stop | DeframerState::StopError => {
                self.state = if bit_high {
                    DeframerState::WaitLow
                } else {
                    DeframerState::WaitHigh
                };
                PacketEvent::None
            }
            DeframerState::WaitLow | DeframerState::StartError => {
                if bit_high {
                    self.state = DeframerState::WaitLow;
                } else {
                    self.state = DeframerState::Start;
                    self.countdown = self.half_bit;
                }
                PacketEvent::None
            }
            DeframerState::Start | DeframerState::CheckStart => {
                if bit_high {
                    self.state = DeframerState::StartError;
                    self.error_count += 1;
                    PacketEvent::FramingError
                } else {
                    self.countdown -= 1;
                    if self.countdown == 0 {
                        self.countdown = self.half_bit * 2;
                        self.state = DeframerState::Accumulate;
                        self.bits_remaining = self.data_bits + 16 + 1; // payload+CRC, plus the stop check
                        self.accumulator = 0;
                        self.shift = 0;
                    } else {
                        self.state = DeframerState::CheckStart;
                    }
                    PacketEvent::None
                }
            }
            DeframerState::Accumulate => {
                self.countdown -= 1;
                if self.countdown != 0 {
                    return PacketEvent::None;
                }
                self.countdown = self.half_bit * 2;
                self.bits_remaining -= 1;
                if self.bits_remaining == 0 {
                    if bit_high {
                        self.state = DeframerState::Stop;
                        self.finish_packet()
                    } else {
                        self.state = DeframerState::StopError;
                        self.error_count += 1;
                        PacketEvent::FramingError
                    }
                } else {
                    if bit_high {
                        self.accumulator |= 1u64 << self.shift;
                    }
                    self.shift += 1;
                    PacketEvent::None
                }
            }
        }
    }

    fn finish_packet(&mut self) -> PacketEvent {
        let payload = self.accumulator & ((1u64 << self.data_bits) - 1);
        let received_reversed = ((self.accumulator >> self.data_bits) & 0xFFFF) as u16;
        let received_crc = reverse_crc(received_reversed);
        let expected_crc = crc16(payload, self.data_bits);
        if received_crc == expected_crc {
            PacketEvent::Packet(payload)
        } else {
            self.crc_error_count += 1;
            PacketEvent::CrcMismatch {
                expected: expected_crc,
                received: received_crc,
            }
        }
    }

    fn invalid_during(&mut self) -> PacketEvent {
        match self.state {
            DeframerState::WaitHigh
            | DeframerState::WaitLow
            | DeframerState::Stop
            | DeframerState::StopError
            | DeframerState::StartError => PacketEvent::None,
            DeframerState::Start | DeframerState::CheckStart => {
                self.state = DeframerState::StartError;
                self.error_count += 1;
                PacketEvent::FramingError
            }
            DeframerState::Accumulate => {
                self.countdown = self.countdown.saturating_sub(1);
                if self.countdown == 0 {
                    self.state = DeframerState::StopError;
                    self.error_count += 1;
                    PacketEvent::FramingError
                } else {
                    PacketEvent::None
                }
            }
        }
    }
}
