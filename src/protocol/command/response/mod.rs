//! Fixed-layout replies to host queries. Every response starts with
//! [`SYNC_BYTE`] and the opcode it answers; some end with an XOR of all
//! preceding bytes.
use heapless::Vec;

use super::{Opcode, SYNC_BYTE};
use crate::error::EncodeError;
use crate::infra::codec::checksum::xor_checksum;
use crate::settings::{BusConfig, FileOutputFormat};

/// Longest response (GET_EXT_BUSES).
pub const MAX_RESPONSE_LEN: usize = 17;

/// Reserved trailing bytes of GET_EXT_BUSES.
const EXT_BUSES_RESERVED: usize = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Reported state of one bus.
pub struct BusStatus {
    pub enabled: bool,
    pub listen_only: bool,
    pub speed: u32,
}

impl From<&BusConfig> for BusStatus {
    fn from(config: &BusConfig) -> Self {
        Self {
            enabled: config.enabled,
            listen_only: config.listen_only,
            speed: config.speed,
        }
    }
}

impl BusStatus {
    /// `enabled` in bit 0, listen-only in bit 4.
    fn flags(&self) -> u8 {
        self.enabled as u8 | (self.listen_only as u8) << 4
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Response {
    TimeSync {
        micros: u32,
    },
    /// Bit `n` = input `n`.
    DigitalInputs {
        bits: u8,
    },
    AnalogInputs {
        values: [u16; 4],
    },
    CanbusParams {
        can0: BusStatus,
        can1: BusStatus,
        single_wire_enabled: bool,
    },
    DeviceInfo {
        build: u16,
        version: u8,
        file_format: FileOutputFormat,
        auto_start_logging: bool,
        single_wire_enabled: bool,
    },
    Keepalive,
    NumBuses {
        count: u8,
    },
    ExtBuses {
        single_wire: BusStatus,
    },
}

impl Response {
    pub fn opcode(&self) -> Opcode {
        match self {
            Response::TimeSync { .. } => Opcode::TimeSync,
            Response::DigitalInputs { .. } => Opcode::DigitalInputs,
            Response::AnalogInputs { .. } => Opcode::AnalogInputs,
            Response::CanbusParams { .. } => Opcode::GetCanbusParams,
            Response::DeviceInfo { .. } => Opcode::GetDeviceInfo,
            Response::Keepalive => Opcode::Keepalive,
            Response::NumBuses { .. } => Opcode::GetNumBuses,
            Response::ExtBuses { .. } => Opcode::GetExtBuses,
        }
    }

    /// Append the encoded response to `out`.
    pub fn encode_into<const N: usize>(&self, out: &mut Vec<u8, N>) -> Result<(), EncodeError> {
        let start = out.len();
        push(out, &[SYNC_BYTE, self.opcode() as u8])?;
        match *self {
            Response::TimeSync { micros } => push(out, &micros.to_le_bytes())?,
            Response::DigitalInputs { bits } => {
                push(out, &[bits])?;
                push_checksum(out, start)?;
            }
            Response::AnalogInputs { values } => {
                for value in values {
                    push(out, &value.to_le_bytes())?;
                }
                push_checksum(out, start)?;
            }
            Response::CanbusParams {
                can0,
                can1,
                single_wire_enabled,
            } => {
                push(out, &[can0.flags()])?;
                push(out, &can0.speed.to_le_bytes())?;
                push(out, &[can1.flags() | (single_wire_enabled as u8) << 6])?;
                push(out, &can1.speed.to_le_bytes())?;
            }
            Response::DeviceInfo {
                build,
                version,
                file_format,
                auto_start_logging,
                single_wire_enabled,
            } => {
                push(out, &build.to_le_bytes())?;
                push(
                    out,
                    &[
                        version,
                        file_format as u8,
                        auto_start_logging as u8,
                        single_wire_enabled as u8,
                    ],
                )?;
            }
            Response::Keepalive => push(out, &[0xDE, 0xAD])?,
            Response::NumBuses { count } => push(out, &[count])?,
            Response::ExtBuses { single_wire } => {
                push(out, &[single_wire.flags()])?;
                push(out, &single_wire.speed.to_le_bytes())?;
                push(out, &[0u8; EXT_BUSES_RESERVED])?;
            }
        }
        Ok(())
    }
}

fn push<const N: usize>(out: &mut Vec<u8, N>, bytes: &[u8]) -> Result<(), EncodeError> {
    out.extend_from_slice(bytes)
        .map_err(|_| EncodeError::BufferFull)
}

fn push_checksum<const N: usize>(out: &mut Vec<u8, N>, start: usize) -> Result<(), EncodeError> {
    let checksum = xor_checksum(&out[start..]);
    push(out, &[checksum])
}
