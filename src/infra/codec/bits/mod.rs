//! Bit cursor over a byte buffer, used to lay out the persisted records.
//! Fields are packed LSB-first: flags share a byte, multi-byte integers are
//! little-endian, and byte strings are copied on aligned positions only.
use crate::error::{BitReaderError, BitWriterError};

/// Read cursor over a stored record.
pub struct BitReader<'a> {
    buffer: &'a [u8],
    /// Number of bits consumed from the start of `buffer`.
    bit_cursor: usize,
}

impl<'a> BitReader<'a> {
    /// Create a reader positioned at the start of the buffer.
    pub fn new(buffer: &'a [u8]) -> Self {
        Self {
            buffer,
            bit_cursor: 0,
        }
    }

    /// Bits left before the end of the buffer.
    pub fn remaining_bits(&self) -> usize {
        self.buffer.len() * 8 - self.bit_cursor
    }

    /// Read `num_bits` (1 to 64) bits and return them right-aligned in a `u64`.
    pub fn read_u64(&mut self, num_bits: u8) -> Result<u64, BitReaderError> {
        if !(1..=64).contains(&num_bits) {
            return Err(BitReaderError::TooLongForType {
                max: 64,
                asked: num_bits,
            });
        }
        if num_bits as usize > self.remaining_bits() {
            return Err(BitReaderError::OutOfBounds {
                asked: num_bits as usize,
                available: self.remaining_bits(),
            });
        }

        let mut result: u64 = 0;
        let mut done = 0usize;
        while done < num_bits as usize {
            let position = self.bit_cursor + done;
            let offset = position % 8;
            let chunk = (8 - offset).min(num_bits as usize - done);
            let mask = ((1u16 << chunk) - 1) as u8;
            let bits = (self.buffer[position / 8] >> offset) & mask;
            result |= (bits as u64) << done;
            done += chunk;
        }
        self.bit_cursor += num_bits as usize;
        Ok(result)
    }

    fn read_bounded(&mut self, num_bits: u8, max: u8) -> Result<u64, BitReaderError> {
        if num_bits > max {
            return Err(BitReaderError::TooLongForType {
                max,
                asked: num_bits,
            });
        }
        self.read_u64(num_bits)
    }

    /// Read up to 8 bits.
    pub fn read_u8(&mut self, num_bits: u8) -> Result<u8, BitReaderError> {
        self.read_bounded(num_bits, 8).map(|v| v as u8)
    }

    /// Read up to 16 bits.
    pub fn read_u16(&mut self, num_bits: u8) -> Result<u16, BitReaderError> {
        self.read_bounded(num_bits, 16).map(|v| v as u16)
    }

    /// Read up to 32 bits.
    pub fn read_u32(&mut self, num_bits: u8) -> Result<u32, BitReaderError> {
        self.read_bounded(num_bits, 32).map(|v| v as u32)
    }

    /// Read a single flag bit.
    pub fn read_bool(&mut self) -> Result<bool, BitReaderError> {
        self.read_u64(1).map(|v| v != 0)
    }

    /// Skip `length` reserved bits.
    pub fn advance(&mut self, length: u8) -> Result<(), BitReaderError> {
        if length as usize > self.remaining_bits() {
            return Err(BitReaderError::OutOfBounds {
                asked: length as usize,
                available: self.remaining_bits(),
            });
        }
        self.bit_cursor += length as usize;
        Ok(())
    }

    /// Borrow `len` bytes from the current (byte-aligned) position.
    pub fn read_slice(&mut self, len: usize) -> Result<&'a [u8], BitReaderError> {
        if self.bit_cursor % 8 != 0 {
            return Err(BitReaderError::NonAlignedBit {
                cursor: self.bit_cursor,
            });
        }
        let start = self.bit_cursor / 8;
        let end = start + len;
        if end > self.buffer.len() {
            return Err(BitReaderError::OutOfBounds {
                asked: len,
                available: self.buffer.len() - start,
            });
        }
        self.bit_cursor += len * 8;
        Ok(&self.buffer[start..end])
    }
}
//==================================================================================BITWRITER

/// Write cursor used to serialize a record into a caller-provided buffer.
pub struct BitWriter<'a> {
    buffer: &'a mut [u8],
    bit_cursor: usize,
}

impl<'a> BitWriter<'a> {
    /// Create a writer positioned at the start of the buffer.
    pub fn new(buffer: &'a mut [u8]) -> Self {
        Self {
            buffer,
            bit_cursor: 0,
        }
    }

    /// Bits written so far.
    pub fn bit_cursor(&self) -> usize {
        self.bit_cursor
    }

    /// Bytes touched so far (a partially written byte counts).
    pub fn byte_len(&self) -> usize {
        self.bit_cursor.div_ceil(8)
    }

    fn remaining_bits(&self) -> usize {
        self.buffer.len() * 8 - self.bit_cursor
    }

    /// Write the `num_bits` (1 to 64) low bits of `value`.
    pub fn write_u64(&mut self, value: u64, num_bits: u8) -> Result<(), BitWriterError> {
        if !(1..=64).contains(&num_bits) {
            return Err(BitWriterError::TooLongForType {
                max: 64,
                asked: num_bits,
            });
        }
        if num_bits as usize > self.remaining_bits() {
            return Err(BitWriterError::OutOfBounds {
                asked: num_bits as usize,
                available: self.remaining_bits(),
            });
        }

        let mut pending = value;
        let mut done = 0usize;
        while done < num_bits as usize {
            let position = self.bit_cursor + done;
            let offset = position % 8;
            let chunk = (8 - offset).min(num_bits as usize - done);
            let mask = ((1u16 << chunk) - 1) as u8;
            let byte = &mut self.buffer[position / 8];
            *byte &= !(mask << offset);
            *byte |= (pending as u8 & mask) << offset;
            pending >>= chunk;
            done += chunk;
        }
        self.bit_cursor += num_bits as usize;
        Ok(())
    }

    fn write_bounded(&mut self, value: u64, num_bits: u8, max: u8) -> Result<(), BitWriterError> {
        if num_bits > max {
            return Err(BitWriterError::TooLongForType {
                max,
                asked: num_bits,
            });
        }
        self.write_u64(value, num_bits)
    }

    /// Write up to 8 bits.
    pub fn write_u8(&mut self, value: u8, num_bits: u8) -> Result<(), BitWriterError> {
        self.write_bounded(value as u64, num_bits, 8)
    }

    /// Write up to 16 bits.
    pub fn write_u16(&mut self, value: u16, num_bits: u8) -> Result<(), BitWriterError> {
        self.write_bounded(value as u64, num_bits, 16)
    }

    /// Write up to 32 bits.
    pub fn write_u32(&mut self, value: u32, num_bits: u8) -> Result<(), BitWriterError> {
        self.write_bounded(value as u64, num_bits, 32)
    }

    /// Write a single flag bit.
    pub fn write_bool(&mut self, value: bool) -> Result<(), BitWriterError> {
        self.write_u64(value as u64, 1)
    }

    /// Fill `length` reserved bits with zeros.
    pub fn pad(&mut self, length: u8) -> Result<(), BitWriterError> {
        if length == 0 {
            return Ok(());
        }
        self.write_u64(0, length)
    }

    /// Copy `slice` at the current (byte-aligned) position.
    pub fn write_slice(&mut self, slice: &[u8]) -> Result<(), BitWriterError> {
        if self.bit_cursor % 8 != 0 {
            return Err(BitWriterError::NonAlignedBit {
                cursor: self.bit_cursor,
            });
        }
        let start = self.bit_cursor / 8;
        let end = start + slice.len();
        if end > self.buffer.len() {
            return Err(BitWriterError::OutOfBounds {
                asked: slice.len(),
                available: self.buffer.len() - start,
            });
        }
        self.buffer[start..end].copy_from_slice(slice);
        self.bit_cursor += slice.len() * 8;
        Ok(())
    }
}
