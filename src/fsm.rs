//! Framing state machine, RX side.
//!
//! Grounded on `model/sigdec.cpp`'s `serial_decode()`: a 10-state machine
//! driven by a bit slicer comparing the MARK and SPACE envelopes, with
//! mid-bit sampling via a half-bit/full-bit countdown. The state names and
//! transition table here are equivalent to, but not a line-for-line port of,
//! the reference switch statement.

use crate::error::ModemError;

/// One decoded bit, or the absence of a reliable decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bit {
    Zero,
    One,
    Invalid,
}

/// Decide the bit symbol from the two envelope levels: `U > L` slicer with
/// a combined-amplitude noise-floor gate (see DESIGN.md for why this policy
/// was chosen over the source material's other, mutually inconsistent
/// noise-floor variants).
pub fn slice(upper: i16, lower: i16, noise_floor: i16) -> Bit {
    let u = upper as i32;
    let l = lower as i32;
    if u.max(l) < noise_floor as i32 {
        return Bit::Invalid;
    }
    if u > l {
        Bit::One
    } else if l > u {
        Bit::Zero
    } else {
        Bit::Invalid
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    WaitHigh,
    WaitLow,
    Start,
    CheckStart,
    WaitNext,
    Data0,
    Data1,
    Stop,
    StopError,
    StartError,
}

/// Outcome of feeding one sample through the FSM.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// No byte completed this sample.
    None,
    /// A full octet was assembled and the stop bit checked out.
    Byte(u8),
    /// Stop bit was not 1, or a data bit was `INVALID`; the partial byte was
    /// discarded.
    FramingError,
}

/// Start/stop-bit framing state machine.
///
/// One instance per receive channel; never shared.
#[derive(Clone)]
pub struct FramingFsm {
    state: State,
    half_bit: u32,
    countdown: u32,
    bit_count: u32,
    byte: u8,
    error_count: u64,
}

impl FramingFsm {
    /// `samples_per_bit` is `Fs/baud`; the half-bit count `H` used for
    /// mid-bit sampling is half of it. Fails if it is not an even `>= 4` so
    /// `H = samples_per_bit/2` is exact (mirrors
    /// `config::ModemConfig::validate`'s `Fs/baud` check; a zero or odd
    /// half-bit would misplace every mid-bit sample).
    pub fn new(samples_per_bit: u32) -> Result<Self, ModemError> {
        if samples_per_bit < 4 || samples_per_bit % 2 != 0 {
            return Err(ModemError::Configuration(format!(
                "samples_per_bit must be an even number >= 4, got {samples_per_bit}"
            )));
        }
        Ok(FramingFsm {
            state: State::WaitHigh,
            half_bit: samples_per_bit / 2,
            countdown: 0,
            bit_count: 0,
            byte: 0,
            error_count: 0,
        })
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// Cumulative count of `FramingError` events.
    pub fn error_count(&self) -> u64 {
        self.error_count
    }

    /// Feed one sliced bit through the machine.
    pub fn step(&mut self, bit: Bit) -> Event {
        // The slicer output only distinguishes ONE/ZERO per transition row;
        // an INVALID reading during START/data acquisition is itself a
        // framing error.
        let bit_high = match bit {
            Bit::One => true,
            Bit::Zero => false,
            Bit::Invalid => {
                return self.invalid_during(bit);
            }
        };

        match self.state {
            State::WaitHigh | State::Stop | State::StopError => {
                self.state = if bit_high { State::WaitLow } else { State::WaitHigh };
                Event::None
            }
            State::WaitLow | State::StartError => {
                if bit_high {
                    self.state = State::WaitLow;
                } else {
                    self.state = State::Start;
                    self.countdown = self.half_bit;
                }
                Event::None
            }
            State::Start | State::CheckStart => {
                if bit_high {
                    self.state = State::StartError;
                    self.error_count += 1;
                    Event::FramingError
                } else {
                    self.countdown -= 1;
                    if self.countdown == 0 {
                        self.countdown = self.half_bit * 2;
                        self.state = State::WaitNext;
                        self.bit_count = 9;
                        self.byte = 0;
                    } else {
                        self.state = State::CheckStart;
                    }
                    Event::None
                }
            }
            State::WaitNext | State::Data0 | State::Data1 => {
                self.countdown -= 1;
                if self.countdown != 0 {
                    self.state = State::WaitNext;
                    return Event::None;
                }
                self.countdown = self.half_bit * 2;
                self.bit_count -= 1;
                if self.bit_count == 0 {
                    if bit_high {
                        let byte = self.byte;
                        self.state = State::Stop;
                        Event::Byte(byte)
                    } else {
                        self.state = State::StopError;
                        self.error_count += 1;
                        Event::FramingError
                    }
                } else {
                    self.byte >>= 1;
                    if bit_high {
                        self.byte |= 0x80;
                        self.state = State::Data1;
                    } else {
                        self.state = State::Data0;
                    }
                    Event::None
                }
            }
        }
    }

    /// An `INVALID` slicer reading during any state that expects a clean
    /// ONE/ZERO decision is treated as the corresponding `*_ERROR` state.
    fn invalid_during(&mut self, _bit: Bit) -> Event {
        match self.state {
            State::WaitHigh | State::WaitLow | State::Stop | State::StopError | State::StartError => {
                // Outside an active frame an ambiguous sample is simply
                // noise; stay put.
                Event::None
            }
            State::Start | State::CheckStart => {
                self.state = State::StartError;
                self.error_count += 1;
                Event::FramingError
            }
            State::WaitNext | State::Data0 | State::Data1 => {
                self.countdown = self.countdown.saturating_sub(1);
                if self.countdown == 0 {
                    self.state = State::StopError;
                    self.error_count += 1;
                    Event::FramingError
                } else {
                    self.state = State::WaitNext;
                    Event::None
                }
            }
        }
    }
}
