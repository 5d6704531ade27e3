//! Persisted configuration: bus setup, host/file output selection, log file
//! naming, hardware variant, and the digital toggle rule.
//!
//! Both records are versioned (see [`record`]); a record whose version tag does
//! not match is replaced by the factory defaults below and written back.
pub mod profile;
pub mod record;

use heapless::String;

use crate::protocol::transport::can_frame::BusIndex;
use crate::protocol::transport::can_id::{Filter, FILTER_SLOTS};

/// Bus count tracked by the settings record (CAN0, CAN1, single-wire).
pub const BUS_COUNT: usize = 3;
/// Maximum log file base name length.
pub const FILE_BASE_CAPACITY: usize = 30;
/// Maximum log file extension length.
pub const FILE_EXT_CAPACITY: usize = 3;
/// Default bit rate of the two main buses.
pub const DEFAULT_CAN_SPEED: u32 = 500_000;
/// Default single-wire bit rate.
pub const DEFAULT_SINGLE_WIRE_SPEED: u32 = 33_333;

//==================================================================================BUS_CONFIG
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Configuration of one physical bus.
pub struct BusConfig {
    /// Bit rate in bit/s.
    pub speed: u32,
    pub enabled: bool,
    pub listen_only: bool,
    pub filters: [Filter; FILTER_SLOTS],
}

impl BusConfig {
    /// Bus with the open filter set.
    pub const fn new(speed: u32, enabled: bool) -> Self {
        Self {
            speed,
            enabled,
            listen_only: false,
            filters: Filter::promiscuous_set(),
        }
    }
}

//==================================================================================ENUMS
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Host link encoding when LAWICEL is off.
pub enum CommMode {
    /// Human-readable debug text.
    #[default]
    Ascii,
    /// GVRET binary records.
    Binary,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Log file record format.
pub enum FileOutputFormat {
    None = 0,
    RawBinary = 1,
    /// Comma-delimited GVRET text.
    Gvret = 2,
    /// Timestamp-annotated CRTD text.
    Crtd = 3,
}

impl FileOutputFormat {
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::None),
            1 => Some(Self::RawBinary),
            2 => Some(Self::Gvret),
            3 => Some(Self::Crtd),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Console verbosity, most verbose first.
pub enum LogLevel {
    Debug = 0,
    Info = 1,
    Warning = 2,
    Error = 3,
    Off = 4,
}

impl LogLevel {
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Debug),
            1 => Some(Self::Info),
            2 => Some(Self::Warning),
            3 => Some(Self::Error),
            4 => Some(Self::Off),
            _ => None,
        }
    }

    /// A message of `level` passes this threshold.
    pub fn allows(self, level: LogLevel) -> bool {
        self != LogLevel::Off && level != LogLevel::Off && level >= self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Hardware variant selector.
pub enum SystemType {
    #[default]
    CanDue = 0,
    Gevcu = 1,
    /// CANDue v1.3 to v2.1.
    CanDue13 = 2,
    /// CANDue v2.2: dedicated single-wire controller, three buses.
    CanDue22 = 3,
}

impl SystemType {
    /// Unknown selectors fall back to the plain CANDue layout.
    pub const fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Gevcu,
            2 => Self::CanDue13,
            3 => Self::CanDue22,
            _ => Self::CanDue,
        }
    }
}

//==================================================================================FILE_NAMING
#[derive(Clone, Debug, PartialEq, Eq)]
/// Log file naming fields handed to the storage collaborator.
pub struct LogFileNaming {
    pub base: String<FILE_BASE_CAPACITY>,
    pub extension: String<FILE_EXT_CAPACITY>,
    pub number: u16,
    /// Append to an existing file instead of starting a new one.
    pub append: bool,
}

/// Room for `base` + number + `.` + `ext`.
pub const FILE_NAME_CAPACITY: usize = FILE_BASE_CAPACITY + 5 + 1 + FILE_EXT_CAPACITY;

impl LogFileNaming {
    pub fn factory() -> Self {
        let mut base = String::new();
        let mut extension = String::new();
        // Both literals fit their capacity.
        let _ = base.push_str("CANBUS");
        let _ = extension.push_str("TXT");
        Self {
            base,
            extension,
            number: 1,
            append: false,
        }
    }

    /// `CANBUS1.TXT` style file name.
    pub fn file_name(&self) -> String<FILE_NAME_CAPACITY> {
        use core::fmt::Write;
        let mut name = String::new();
        // Capacity covers the longest base, a five-digit number, and the extension.
        let _ = write!(name, "{}{}.{}", self.base, self.number, self.extension);
        name
    }
}

//==================================================================================SETTINGS
#[derive(Clone, Debug, PartialEq, Eq)]
/// Whole persisted configuration. Only the command engine mutates it, and
/// every mutation is followed by one full write of the record.
pub struct Settings {
    /// Indexed by [`BusIndex`]; entry 2 is the single-wire bus.
    pub buses: [BusConfig; BUS_COUNT],
    pub comm_mode: CommMode,
    pub file_format: FileOutputFormat,
    pub file_naming: LogFileNaming,
    pub auto_start_logging: bool,
    pub log_level: LogLevel,
    pub system_type: SystemType,
    /// Validity token (reserved, kept at zero).
    pub valid: u16,
}

impl Default for Settings {
    fn default() -> Self {
        Self::factory()
    }
}

impl Settings {
    /// Factory defaults: both main buses on at 500 kbit/s, single-wire off at
    /// 33.3 kbit/s, open filters, GVRET text logs, warning-level console.
    pub fn factory() -> Self {
        Self {
            buses: [
                BusConfig::new(DEFAULT_CAN_SPEED, true),
                BusConfig::new(DEFAULT_CAN_SPEED, true),
                BusConfig::new(DEFAULT_SINGLE_WIRE_SPEED, false),
            ],
            comm_mode: CommMode::Ascii,
            file_format: FileOutputFormat::Gvret,
            file_naming: LogFileNaming::factory(),
            auto_start_logging: false,
            log_level: LogLevel::Warning,
            system_type: SystemType::CanDue,
            valid: 0,
        }
    }

    pub fn bus(&self, bus: BusIndex) -> &BusConfig {
        &self.buses[bus.index()]
    }

    pub fn bus_mut(&mut self, bus: BusIndex) -> &mut BusConfig {
        &mut self.buses[bus.index()]
    }

    pub fn single_wire_enabled(&self) -> bool {
        self.buses[BusIndex::SingleWire.index()].enabled
    }
}

//==================================================================================TOGGLE_RULE
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Toggle mode bitfield.
///
/// * bit 0: set = CAN → pin, clear = pin → CAN
/// * bit 1: bus 0 participates
/// * bit 2: bus 1 participates
/// * bit 7: idle level low
pub struct ToggleMode(pub u8);

impl ToggleMode {
    pub const CAN_TO_PIN: u8 = 0x01;
    pub const CAN0: u8 = 0x02;
    pub const CAN1: u8 = 0x04;
    pub const IDLE_LOW: u8 = 0x80;

    pub const fn can_to_pin(self) -> bool {
        self.0 & Self::CAN_TO_PIN != 0
    }

    /// Bus participates in the rule (only the two main buses can).
    pub const fn includes(self, bus: BusIndex) -> bool {
        match bus {
            BusIndex::Can0 => self.0 & Self::CAN0 != 0,
            BusIndex::Can1 => self.0 & Self::CAN1 != 0,
            BusIndex::SingleWire => false,
        }
    }

    pub const fn idle_low(self) -> bool {
        self.0 & Self::IDLE_LOW != 0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Mapping between one CAN message and one digital pin.
pub struct DigitalToggleRule {
    pub enabled: bool,
    pub mode: ToggleMode,
    pub pin: u8,
    pub id: u32,
    /// Configured payload bytes (0..=8). Zero means "id match is enough".
    pub len: u8,
    pub payload: [u8; 8],
}

impl Default for DigitalToggleRule {
    fn default() -> Self {
        Self::factory()
    }
}

impl DigitalToggleRule {
    /// Disabled rule on pin 1 watching id 0x700.
    pub const fn factory() -> Self {
        Self {
            enabled: false,
            mode: ToggleMode(0),
            pin: 1,
            id: 0x700,
            len: 0,
            payload: [0; 8],
        }
    }

    /// Configured payload slice.
    pub fn payload(&self) -> &[u8] {
        &self.payload[..(self.len as usize).min(8)]
    }
}

#[cfg(test)]
#[path = "tests.rs"]
mod tests;
