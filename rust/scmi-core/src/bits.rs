//! Bit-field extraction over 32-bit payload words.
//!
//! Response payloads pack several fields into one word and leave the rest
//! reserved, must-be-zero, for future extension. Ranges are inclusive and
//! numbered from bit 0 (least significant).

use core::fmt;

/// Width of every payload word.
pub const WORD_BITS: u32 = 32;

/// A bit range that does not fit in a 32-bit word, or is inverted.
///
/// This is a defect in the caller, never a property of the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeError {
    pub low: u32,
    pub high: u32,
}

impl fmt::Display for RangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.low > self.high {
            write!(f, "inverted bit range [{}, {}]", self.low, self.high)
        } else {
            write!(
                f,
                "bit range [{}, {}] exceeds {}-bit word",
                self.low, self.high, WORD_BITS
            )
        }
    }
}

impl std::error::Error for RangeError {}

fn check_range(low: u32, high: u32) -> Result<(), RangeError> {
    if low > high || high >= WORD_BITS {
        return Err(RangeError { low, high });
    }
    Ok(())
}

/// Mask with bits `low..=high` set.
pub fn mask(low: u32, high: u32) -> Result<u32, RangeError> {
    check_range(low, high)?;
    let width = high - low + 1;
    let ones = if width == WORD_BITS {
        u32::MAX
    } else {
        (1u32 << width) - 1
    };
    Ok(ones << low)
}

/// Unsigned value of bits `low..=high` of `word`, shifted down to bit 0.
pub fn extract(word: u32, low: u32, high: u32) -> Result<u32, RangeError> {
    Ok((word & mask(low, high)?) >> low)
}

/// Single bit as a flag.
pub fn bit(word: u32, index: u32) -> Result<bool, RangeError> {
    Ok(extract(word, index, index)? == 1)
}

/// True iff every bit in `low..=high` of `word` is zero.
///
/// A pure predicate: whether a set reserved bit fails a test is the caller's
/// decision.
pub fn reserved_zero(word: u32, low: u32, high: u32) -> Result<bool, RangeError> {
    Ok(word & mask(low, high)? == 0)
}
