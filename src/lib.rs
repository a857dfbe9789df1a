//! Full-duplex BFSK software modem for PCM audio.
//!
//! The crate is laid out in the same order signal flows through it:
//! [`fixed`] and [`error`] are the shared substrate; [`biquad`] and
//! [`envelope`] are the RX analog front end; [`oscillator`] and [`framer`]
//! are the TX chain; [`fsm`] and [`deframer`] recover bits and frames on RX;
//! [`wav`] handles the PCM container; [`config`] ties the tunables together;
//! [`pipeline`] wires everything into the two block loops a caller actually
//! runs.

pub mod biquad;
pub mod config;
pub mod deframer;
pub mod envelope;
pub mod error;
pub mod fixed;
pub mod framer;
pub mod fsm;
pub mod oscillator;
pub mod pipeline;
pub mod wav;

pub use config::ModemConfig;
pub use error::{ModemError, Result};
pub use pipeline::{decode, decode_packets, encode, encode_packets, DecodeSample, DecodeStats, DecodeTap};
pub use wav::Wav;
