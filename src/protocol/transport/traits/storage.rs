//! Persistent record storage and removable-media log sink.

/// Fixed storage slots for the persisted records.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RecordTag {
    Settings,
    DigitalToggle,
}

impl RecordTag {
    /// Storage page of the record (toggle rule sits right after settings).
    pub const fn page(self) -> u16 {
        match self {
            RecordTag::Settings => 275,
            RecordTag::DigitalToggle => 276,
        }
    }
}

/// Non-volatile record store (EEPROM or flash emulation).
pub trait Persistence {
    type Error: core::fmt::Debug;
    /// Copy the stored record into `buf`, returning the number of bytes read.
    /// Erased storage reads back as `0xFF`.
    fn read_record(&mut self, tag: RecordTag, buf: &mut [u8]) -> Result<usize, Self::Error>;
    /// Replace the stored record.
    fn write_record(&mut self, tag: RecordTag, bytes: &[u8]) -> Result<(), Self::Error>;
}

/// Append-only log file. Naming, rotation, and flushing belong to the implementor.
pub trait FileSink {
    type Error: core::fmt::Debug;
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), Self::Error>;
}
