//! GVRET host command protocol: opcodes, decoded commands, and the events the
//! byte-stream parser hands to the bridge.
//!
//! Every host command starts with [`SYNC_BYTE`] followed by an opcode byte and
//! a fixed or length-dependent payload. Multi-byte integers are little-endian.
pub mod parser;
pub mod response;

use crate::protocol::transport::can_frame::Frame;

/// Framing byte opening every command and every response.
pub const SYNC_BYTE: u8 = 0xF1;
/// Byte that switches the link to binary mode with open filters.
pub const BINARY_MODE_BYTE: u8 = 0xE7;
/// Bit-rate ceiling of the main buses.
pub const MAX_CAN_SPEED: u32 = 1_000_000;
/// Bit-rate ceiling of the single-wire bus.
pub const MAX_SINGLE_WIRE_SPEED: u32 = 100_000;

//==================================================================================OPCODE
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Command selector following the framing byte. Responses reuse the value.
pub enum Opcode {
    BuildCanFrame = 0,
    TimeSync = 1,
    DigitalInputs = 2,
    AnalogInputs = 3,
    SetDigitalOutputs = 4,
    SetupCanbus = 5,
    GetCanbusParams = 6,
    GetDeviceInfo = 7,
    SetSingleWireMode = 8,
    Keepalive = 9,
    SetSystemType = 10,
    EchoCanFrame = 11,
    GetNumBuses = 12,
    GetExtBuses = 13,
    SetExtBuses = 14,
}

impl TryFrom<u8> for Opcode {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Ok(match value {
            0 => Opcode::BuildCanFrame,
            1 => Opcode::TimeSync,
            2 => Opcode::DigitalInputs,
            3 => Opcode::AnalogInputs,
            4 => Opcode::SetDigitalOutputs,
            5 => Opcode::SetupCanbus,
            6 => Opcode::GetCanbusParams,
            7 => Opcode::GetDeviceInfo,
            8 => Opcode::SetSingleWireMode,
            9 => Opcode::Keepalive,
            10 => Opcode::SetSystemType,
            11 => Opcode::EchoCanFrame,
            12 => Opcode::GetNumBuses,
            13 => Opcode::GetExtBuses,
            14 => Opcode::SetExtBuses,
            other => return Err(other),
        })
    }
}

//==================================================================================BUS_WORD
/// Bit 31: bits 30 and 29 carry explicit enable / listen-only status.
const STATUS_PRESENT: u32 = 0x8000_0000;
const STATUS_ENABLED: u32 = 0x4000_0000;
const STATUS_LISTEN_ONLY: u32 = 0x2000_0000;
const SPEED_MASK: u32 = 0x000F_FFFF;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Typed view of a 32-bit bus configuration word.
pub struct BusWord {
    pub enabled: bool,
    /// `None` when the word carries no status bits (listen-only left unchanged).
    pub listen_only: Option<bool>,
    /// Clamped bit rate; `None` for the all-zero "disable" word.
    pub speed: Option<u32>,
}

impl BusWord {
    /// Decode a wire word, clamping the 20-bit speed to `max_speed`.
    pub fn decode(raw: u32, max_speed: u32) -> Self {
        if raw == 0 {
            return Self {
                enabled: false,
                listen_only: None,
                speed: None,
            };
        }
        let (enabled, listen_only) = if raw & STATUS_PRESENT != 0 {
            (
                raw & STATUS_ENABLED != 0,
                Some(raw & STATUS_LISTEN_ONLY != 0),
            )
        } else {
            (true, None)
        };
        Self {
            enabled,
            listen_only,
            speed: Some((raw & SPEED_MASK).min(max_speed)),
        }
    }

    /// Inverse of [`BusWord::decode`] with status bits always present.
    pub fn encode(enabled: bool, listen_only: bool, speed: u32) -> u32 {
        let mut raw = STATUS_PRESENT | (speed & SPEED_MASK);
        if enabled {
            raw |= STATUS_ENABLED;
        }
        if listen_only {
            raw |= STATUS_LISTEN_ONLY;
        }
        raw
    }
}

//==================================================================================COMMAND
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// A fully received host command.
pub enum Command {
    /// Send `frame` on `frame.bus()`.
    Transmit(Frame),
    /// Loop `frame` back to the host as if received on bus 0.
    Echo(Frame),
    TimeSync,
    DigitalInputs,
    AnalogInputs,
    /// Bit `n` drives output `n`.
    SetDigitalOutputs(u8),
    SetupCanbus { can0: BusWord, can1: BusWord },
    GetCanbusParams,
    GetDeviceInfo,
    SetSingleWireMode { enabled: bool },
    Keepalive,
    SetSystemType(u8),
    GetNumBuses,
    GetExtBuses,
    /// Single-wire word plus two reserved words (accepted, not acted upon).
    SetupExtBuses {
        single_wire: BusWord,
        reserved: [u32; 2],
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Outcome of feeding one byte to the parser.
pub enum Event {
    Command(Command),
    /// [`BINARY_MODE_BYTE`] seen while idle.
    EnableBinaryMode,
    /// Stray byte for the console.
    Console(u8),
    /// Opcode byte not in the table; the parser is idle again.
    UnknownOpcode(u8),
    /// Frame command addressed to a bus number with no bus behind it.
    UnroutableFrame { bus: u8 },
    /// Checksum mismatch under [`ChecksumPolicy::Enforce`]; the command was dropped.
    ChecksumRejected { computed: u8, received: u8 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Treatment of the trailing checksum byte of frame commands.
pub enum ChecksumPolicy {
    /// Compute, ignore the received byte, always commit.
    #[default]
    Lenient,
    /// Drop commands whose checksum byte does not match.
    Enforce,
}
