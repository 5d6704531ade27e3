//! Bounded text output for the ASCII encoders (LAWICEL, debug, CSV, CRTD).
//! Lines are assembled in a fixed-capacity `heapless::String` through
//! `core::fmt::Write`, then handed to the link or sink in one write.
use core::fmt::{self, Write};

use crate::error::EncodeError;

/// Longest line produced by any text encoder (29-bit id, eight bytes, timestamps).
pub const TEXT_LINE_CAPACITY: usize = 96;

/// One encoded text record.
pub type TextLine = heapless::String<TEXT_LINE_CAPACITY>;

/// Append formatted text, mapping a capacity overflow to [`EncodeError::LineOverflow`].
pub fn push_fmt<const N: usize>(
    line: &mut heapless::String<N>,
    args: fmt::Arguments<'_>,
) -> Result<(), EncodeError> {
    line.write_fmt(args).map_err(|_| EncodeError::LineOverflow)
}

/// Hex digit case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HexCase {
    Upper,
    Lower,
}

/// `Display` adapter printing a byte run in hex, each byte preceded by
/// `prefix` and padded to `width` digits.
#[derive(Debug, Clone, Copy)]
pub struct HexBytes<'a> {
    bytes: &'a [u8],
    prefix: &'static str,
    width: usize,
    case: HexCase,
}

impl<'a> HexBytes<'a> {
    /// Two-digit pairs with no separator (`ABCD`).
    pub fn packed(bytes: &'a [u8], case: HexCase) -> Self {
        Self {
            bytes,
            prefix: "",
            width: 2,
            case,
        }
    }

    /// Unpadded digits, each preceded by `prefix` (`,a,cd` or ` A CD`).
    pub fn prefixed(bytes: &'a [u8], prefix: &'static str, case: HexCase) -> Self {
        Self {
            bytes,
            prefix,
            width: 0,
            case,
        }
    }
}

impl fmt::Display for HexBytes<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.bytes {
            f.write_str(self.prefix)?;
            match self.case {
                HexCase::Upper => write!(f, "{:0width$X}", byte, width = self.width)?,
                HexCase::Lower => write!(f, "{:0width$x}", byte, width = self.width)?,
            }
        }
        Ok(())
    }
}
