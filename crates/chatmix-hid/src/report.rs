//! Chat-mix report decoding.
//!
//! `usbhid-dump -e stream` prints each transfer as space separated hex
//! byte pairs, interleaved with header lines such as
//! `001:005:003:STREAM             1692806117.223433`. The knob report
//! starts with the marker byte, followed by the game and chat levels:
//!
//! ```text
//!  45 32 14 00 00 00 00 00 00 00 00 00 00 00 00 00
//!  ^^ marker
//!     ^^ game volume (0x32 = 50)
//!        ^^ chat volume (0x14 = 20)
//! ```

use chatmix_core::MixState;
use thiserror::Error;

/// Why a capture line was not a mixer report.
///
/// These never escape the stream; the line is skipped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReportError {
    #[error("empty line")]
    Empty,

    #[error("not a hex byte: {0:?}")]
    NotHex(String),

    #[error("marker byte {0:#04x} not present")]
    NoMarker(u8),

    #[error("report truncated after marker")]
    Truncated,
}

fn parse_byte(token: &str) -> Result<u8, ReportError> {
    if token.len() != 2 || !token.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(ReportError::NotHex(token.to_string()));
    }
    u8::from_str_radix(token, 16).map_err(|_| ReportError::NotHex(token.to_string()))
}

/// Decode one capture line into a mix state.
///
/// Every token must be a hex byte, so capture headers and garbage are
/// rejected. The first occurrence of `marker` is taken as the report id and
/// the two bytes after it as the game and chat levels.
///
/// # Errors
/// Returns a [`ReportError`] describing why the line carries no mix data.
pub fn decode_line(line: &str, marker: u8) -> Result<MixState, ReportError> {
    let bytes = line.split_whitespace().map(parse_byte).collect::<Result<Vec<_>, _>>()?;
    if bytes.is_empty() {
        return Err(ReportError::Empty);
    }

    let pos = bytes.iter().position(|&b| b == marker).ok_or(ReportError::NoMarker(marker))?;
    match bytes.get(pos + 1..pos + 3) {
        Some(&[game, chat]) => Ok(MixState::new(game, chat)),
        _ => Err(ReportError::Truncated),
    }
}
