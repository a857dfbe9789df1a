//! Structured error type shared by every stage of the modem.
//!
//! Each stage returns `Result<_, ModemError>` rather than writing to a
//! process-wide diagnostic stream; the caller (ultimately the CLI shell)
//! decides how to surface a failure.

use thiserror::Error;

/// Errors a modem stage can report.
///
/// Variant groups follow the taxonomy that governs how a failure is handled:
/// `Configuration` and `Format` are fatal at start/open time (no state is
/// created); `Framing` and `CrcMismatch` are non-fatal and recoverable on the
/// next clean edge; `Bug` indicates a programming-error invariant violation.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ModemError {
    /// Center frequency at or above Nyquist, an out-of-range fixed-point
    /// literal, an unsupported sample rate, or `Fs/baud` not an integer `>= 4`.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A WAV/RIFF header failed a literal or consistency check.
    #[error("format error: {0}")]
    Format(String),

    /// A start/stop-bit framing error: bad stop bit, `INVALID` data bit, or
    /// envelope ambiguity during data. The FSM has already discarded the
    /// offending byte and resumed listening.
    #[error("framing error: {0}")]
    Framing(String),

    /// A received packet's CRC did not match. The packet has been discarded.
    #[error("CRC mismatch: expected {expected:#06x}, received {received:#06x}")]
    CrcMismatch { expected: u16, received: u16 },

    /// An internal invariant was violated (TX packet word was zero,
    /// block-size mismatch between the MARK and SPACE paths, etc). This
    /// indicates a programming error, not bad input.
    #[error("internal invariant violated: {0}")]
    Bug(String),

    /// Propagated I/O failure while reading or writing a WAV stream.
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for ModemError {
    fn from(err: std::io::Error) -> Self {
        ModemError::Io(err.to_string())
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ModemError>;
