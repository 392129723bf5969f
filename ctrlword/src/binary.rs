//! Binary digit rendering of 32 bit words for operator diagnostics.

/// Number of digits in a rendered word.
pub const BINARY_DIGITS: usize = 32;

/// A 32 bit word rendered MSB first as ASCII `'0'`/`'1'`, NUL terminated.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct BinaryString([u8; BINARY_DIGITS + 1]);

impl BinaryString {
    /// The 32 digits without the terminator.
    pub fn as_str(&self) -> &str {
        // Only ASCII digits are ever stored.
        core::str::from_utf8(&self.0[..BINARY_DIGITS]).unwrap_or_default()
    }

    /// All digits including the trailing NUL.
    pub fn as_bytes_with_nul(&self) -> &[u8; BINARY_DIGITS + 1] {
        &self.0
    }
}

impl core::fmt::Display for BinaryString {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::fmt::Debug for BinaryString {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "BinaryString({})", self.as_str())
    }
}

/// Render all 32 bits of `word`, bit 31 first and bit 0 last.
pub fn to_binary_string(word: u32) -> BinaryString {
    let mut digits = [0; BINARY_DIGITS + 1];
    for (digit, bit) in digits.iter_mut().zip((0..BINARY_DIGITS).rev()) {
        *digit = if (word >> bit) & 1 != 0 { b'1' } else { b'0' };
    }
    BinaryString(digits)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lsb_rendered() {
        let s = to_binary_string(0x0000_0001);
        assert_eq!(s.as_str().len(), 32);
        assert!(s.as_str().ends_with("0001"));
        assert_eq!(&s.as_str()[..31], "0".repeat(31));
        assert_eq!(s.as_bytes_with_nul()[31], b'1');
        assert_eq!(s.as_bytes_with_nul()[32], 0);
    }

    #[test]
    fn msb_first() {
        assert_eq!(
            to_binary_string(0x8000_0000).as_str(),
            "10000000000000000000000000000000"
        );
        assert_eq!(
            to_binary_string(0x03D0_9000).as_str(),
            "00000011110100001001000000000000"
        );
        assert_eq!(to_binary_string(u32::MAX).as_str(), "1".repeat(32));
    }

    #[test]
    fn matches_fmt() {
        for w in [0, 1, 0xdead_beef, 0x8000_0001, 0x5555_aaaa] {
            assert_eq!(to_binary_string(w).as_str(), format!("{w:032b}"));
        }
    }
}
