//! XOR checksum used by the GVRET wire protocol: every byte of the covered
//! region folded together with `^`.

/// XOR of every byte in `data`.
#[inline]
#[must_use]
pub fn xor_checksum(data: &[u8]) -> u8 {
    data.iter().fold(0, |acc, byte| acc ^ byte)
}

/// Incremental XOR checksum, fed one byte at a time while a command streams in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct XorDigest {
    value: u8,
}

impl XorDigest {
    /// Start an empty digest.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self { value: 0 }
    }

    /// Fold a single byte.
    #[inline]
    pub fn update(&mut self, byte: u8) {
        self.value ^= byte;
    }

    /// Fold a byte slice.
    #[inline]
    pub fn update_slice(&mut self, data: &[u8]) {
        self.value ^= xor_checksum(data);
    }

    /// Current checksum value.
    #[inline]
    #[must_use]
    pub const fn finalize(self) -> u8 {
        self.value
    }
}
