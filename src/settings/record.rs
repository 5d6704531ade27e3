//! Versioned binary records for the persisted configuration.
//!
//! Every record starts with a one-byte version tag followed by its fields,
//! packed with [`BitWriter`]. Loading a record whose tag differs from the
//! layout's version (erased storage reads `0xFF`), whose bytes are short, or
//! whose fields are out of range yields the factory record, which is written
//! back immediately. Each record resets on its own.
use heapless::String;

use crate::error::RecordError;
use crate::infra::codec::bits::{BitReader, BitWriter};
use crate::protocol::transport::can_id::{Filter, FILTER_SLOTS};
use crate::protocol::transport::traits::storage::{Persistence, RecordTag};

use super::{
    BusConfig, CommMode, DigitalToggleRule, FileOutputFormat, LogFileNaming, LogLevel, Settings,
    SystemType, ToggleMode, BUS_COUNT, FILE_BASE_CAPACITY, FILE_EXT_CAPACITY,
};

/// Settings layout revision.
pub const SETTINGS_VERSION: u8 = 0x17;
/// Toggle rule layout revision.
pub const TOGGLE_VERSION: u8 = 0x01;
/// Scratch buffer used to move a record to and from storage.
pub const RECORD_BUFFER_SIZE: usize = 256;

//==================================================================================RECORD_TRAIT
/// A persisted, versioned structure.
pub trait Record: Sized {
    const TAG: RecordTag;
    const VERSION: u8;
    /// Encoded size, version byte included.
    const LEN: usize;

    /// Built-in defaults used when the stored copy is untrusted.
    fn factory() -> Self;
    /// Serialize every field after the version byte.
    fn write_fields(&self, writer: &mut BitWriter<'_>) -> Result<(), RecordError>;
    /// Rebuild the record from the bytes following the version byte.
    fn read_fields(reader: &mut BitReader<'_>) -> Result<Self, RecordError>;
}

/// Serialize `record` (version byte first) into `buf`, returning the length.
pub fn encode<R: Record>(record: &R, buf: &mut [u8]) -> Result<usize, RecordError> {
    let mut writer = BitWriter::new(buf);
    writer.write_u8(R::VERSION, 8)?;
    record.write_fields(&mut writer)?;
    Ok(writer.byte_len())
}

/// Parse a stored record; any version mismatch rejects the whole record.
pub fn decode<R: Record>(bytes: &[u8]) -> Result<R, RecordError> {
    if bytes.len() < R::LEN {
        return Err(RecordError::Truncated {
            expected: R::LEN,
            available: bytes.len(),
        });
    }
    let mut reader = BitReader::new(&bytes[..R::LEN]);
    let found = reader.read_u8(8)?;
    if found != R::VERSION {
        return Err(RecordError::VersionMismatch {
            expected: R::VERSION,
            found,
        });
    }
    R::read_fields(&mut reader)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// How [`load_record`] obtained its record.
pub enum LoadOutcome {
    Stored,
    FactoryReset,
}

/// Read `R` from `storage`, falling back to (and persisting) the factory record.
pub fn load_record<R: Record, P: Persistence>(storage: &mut P) -> (R, LoadOutcome) {
    let mut buf = [0xFFu8; RECORD_BUFFER_SIZE];
    let decoded = match buf.get_mut(..R::LEN) {
        Some(slot) => match storage.read_record(R::TAG, slot) {
            Ok(read) => decode::<R>(&slot[..read.min(R::LEN)]),
            Err(_err) => {
                #[cfg(feature = "defmt")]
                defmt::warn!("Record read failed: {}", defmt::Debug2Format(&_err));
                Err(RecordError::Storage)
            }
        },
        None => Err(RecordError::Truncated {
            expected: R::LEN,
            available: RECORD_BUFFER_SIZE,
        }),
    };

    match decoded {
        Ok(record) => {
            #[cfg(feature = "defmt")]
            defmt::info!("Using stored values for {}", R::TAG);
            (record, LoadOutcome::Stored)
        }
        Err(_reason) => {
            #[cfg(feature = "defmt")]
            defmt::info!(
                "Resetting {} to factory defaults: {}",
                R::TAG,
                defmt::Debug2Format(&_reason)
            );
            let record = R::factory();
            if let Err(_err) = store_record(&record, storage) {
                #[cfg(feature = "defmt")]
                defmt::error!("Could not persist factory {}: {}", R::TAG, defmt::Debug2Format(&_err));
            }
            (record, LoadOutcome::FactoryReset)
        }
    }
}

/// Write the full record. There are no partial writes.
pub fn store_record<R: Record, P: Persistence>(
    record: &R,
    storage: &mut P,
) -> Result<(), RecordError> {
    let mut buf = [0u8; RECORD_BUFFER_SIZE];
    let len = encode(record, &mut buf)?;
    storage.write_record(R::TAG, &buf[..len]).map_err(|_err| {
        #[cfg(feature = "defmt")]
        defmt::error!("Record write failed: {}", defmt::Debug2Format(&_err));
        RecordError::Storage
    })
}

//==================================================================================SETTINGS_LAYOUT
const BUS_LEN: usize = 4 + 1 + FILTER_SLOTS * 8;

fn write_filter(writer: &mut BitWriter<'_>, filter: &Filter) -> Result<(), RecordError> {
    writer.write_u32(filter.id, 29)?;
    writer.write_bool(filter.extended)?;
    writer.write_bool(filter.enabled)?;
    writer.pad(1)?;
    writer.write_u32(filter.mask, 32)?;
    Ok(())
}

fn read_filter(reader: &mut BitReader<'_>) -> Result<Filter, RecordError> {
    let id = reader.read_u32(29)?;
    let extended = reader.read_bool()?;
    let enabled = reader.read_bool()?;
    reader.advance(1)?;
    let mask = reader.read_u32(32)?;
    Ok(Filter {
        id,
        mask,
        extended,
        enabled,
    })
}

fn write_bus(writer: &mut BitWriter<'_>, bus: &BusConfig) -> Result<(), RecordError> {
    writer.write_u32(bus.speed, 32)?;
    writer.write_bool(bus.enabled)?;
    writer.write_bool(bus.listen_only)?;
    writer.pad(6)?;
    for filter in &bus.filters {
        write_filter(writer, filter)?;
    }
    Ok(())
}

fn read_bus(reader: &mut BitReader<'_>) -> Result<BusConfig, RecordError> {
    let speed = reader.read_u32(32)?;
    let enabled = reader.read_bool()?;
    let listen_only = reader.read_bool()?;
    reader.advance(6)?;
    let mut filters = [Filter::open(false); FILTER_SLOTS];
    for filter in filters.iter_mut() {
        *filter = read_filter(reader)?;
    }
    Ok(BusConfig {
        speed,
        enabled,
        listen_only,
        filters,
    })
}

/// Length-prefixed, zero-padded string field.
fn write_text(writer: &mut BitWriter<'_>, text: &str, capacity: usize) -> Result<(), RecordError> {
    writer.write_u8(text.len() as u8, 8)?;
    writer.write_slice(text.as_bytes())?;
    for _ in text.len()..capacity {
        writer.write_u8(0, 8)?;
    }
    Ok(())
}

fn read_text<const N: usize>(
    reader: &mut BitReader<'_>,
    field: &'static str,
) -> Result<String<N>, RecordError> {
    let len = reader.read_u8(8)? as usize;
    let raw = reader.read_slice(N)?;
    if len > N {
        return Err(RecordError::InvalidField { field });
    }
    let text = core::str::from_utf8(&raw[..len]).map_err(|_| RecordError::InvalidField { field })?;
    let mut out = String::new();
    out.push_str(text)
        .map_err(|_| RecordError::InvalidField { field })?;
    Ok(out)
}

impl Record for Settings {
    const TAG: RecordTag = RecordTag::Settings;
    const VERSION: u8 = SETTINGS_VERSION;
    const LEN: usize =
        1 + BUS_COUNT * BUS_LEN + 1 + 3 + (1 + FILE_BASE_CAPACITY) + (1 + FILE_EXT_CAPACITY) + 2 + 2;

    fn factory() -> Self {
        Settings::factory()
    }

    fn write_fields(&self, writer: &mut BitWriter<'_>) -> Result<(), RecordError> {
        for bus in &self.buses {
            write_bus(writer, bus)?;
        }
        writer.write_bool(self.comm_mode == CommMode::Binary)?;
        writer.write_bool(self.auto_start_logging)?;
        writer.write_bool(self.file_naming.append)?;
        writer.pad(5)?;
        writer.write_u8(self.file_format as u8, 8)?;
        writer.write_u8(self.log_level as u8, 8)?;
        writer.write_u8(self.system_type as u8, 8)?;
        write_text(writer, &self.file_naming.base, FILE_BASE_CAPACITY)?;
        write_text(writer, &self.file_naming.extension, FILE_EXT_CAPACITY)?;
        writer.write_u16(self.file_naming.number, 16)?;
        writer.write_u16(self.valid, 16)?;
        Ok(())
    }

    fn read_fields(reader: &mut BitReader<'_>) -> Result<Self, RecordError> {
        let mut buses = [BusConfig::new(0, false); BUS_COUNT];
        for bus in buses.iter_mut() {
            *bus = read_bus(reader)?;
        }
        let comm_mode = if reader.read_bool()? {
            CommMode::Binary
        } else {
            CommMode::Ascii
        };
        let auto_start_logging = reader.read_bool()?;
        let append = reader.read_bool()?;
        reader.advance(5)?;
        let file_format = FileOutputFormat::from_u8(reader.read_u8(8)?).ok_or(
            RecordError::InvalidField {
                field: "file_format",
            },
        )?;
        let log_level = LogLevel::from_u8(reader.read_u8(8)?)
            .ok_or(RecordError::InvalidField { field: "log_level" })?;
        let system_type = SystemType::from_u8(reader.read_u8(8)?);
        let base = read_text::<FILE_BASE_CAPACITY>(reader, "file_base")?;
        let extension = read_text::<FILE_EXT_CAPACITY>(reader, "file_extension")?;
        let number = reader.read_u16(16)?;
        let valid = reader.read_u16(16)?;
        Ok(Settings {
            buses,
            comm_mode,
            file_format,
            file_naming: LogFileNaming {
                base,
                extension,
                number,
                append,
            },
            auto_start_logging,
            log_level,
            system_type,
            valid,
        })
    }
}

//==================================================================================TOGGLE_LAYOUT
impl Record for DigitalToggleRule {
    const TAG: RecordTag = RecordTag::DigitalToggle;
    const VERSION: u8 = TOGGLE_VERSION;
    const LEN: usize = 1 + 1 + 1 + 1 + 4 + 1 + 8;

    fn factory() -> Self {
        DigitalToggleRule::factory()
    }

    fn write_fields(&self, writer: &mut BitWriter<'_>) -> Result<(), RecordError> {
        writer.write_bool(self.enabled)?;
        writer.pad(7)?;
        writer.write_u8(self.mode.0, 8)?;
        writer.write_u8(self.pin, 8)?;
        writer.write_u32(self.id, 32)?;
        writer.write_u8(self.len, 8)?;
        writer.write_slice(&self.payload)?;
        Ok(())
    }

    fn read_fields(reader: &mut BitReader<'_>) -> Result<Self, RecordError> {
        let enabled = reader.read_bool()?;
        reader.advance(7)?;
        let mode = ToggleMode(reader.read_u8(8)?);
        let pin = reader.read_u8(8)?;
        let id = reader.read_u32(32)?;
        let len = reader.read_u8(8)?;
        if len > 8 {
            return Err(RecordError::InvalidField { field: "toggle_len" });
        }
        let mut payload = [0u8; 8];
        payload.copy_from_slice(reader.read_slice(8)?);
        Ok(DigitalToggleRule {
            enabled,
            mode,
            pin,
            id,
            len,
            payload,
        })
    }
}
