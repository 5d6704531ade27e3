//! In-memory CAN frame as captured by a bus driver or built from a host command.
use embedded_can::{ExtendedId, Id, StandardId};

use crate::error::FrameError;
use crate::protocol::transport::can_id::{check_id, WireId, EXTENDED_ID_MAX, STANDARD_ID_MAX};

/// Classic CAN payload capacity.
pub const MAX_DATA_LEN: usize = 8;

//==================================================================================BUS_INDEX
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Physical bus a frame was seen on (or is destined for).
pub enum BusIndex {
    Can0 = 0,
    Can1 = 1,
    SingleWire = 2,
}

impl BusIndex {
    /// Every bus, in service order.
    pub const ALL: [BusIndex; 3] = [BusIndex::Can0, BusIndex::Can1, BusIndex::SingleWire];

    /// Position in per-bus tables.
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Map a wire bus number; 3 has no bus behind it.
    pub const fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(BusIndex::Can0),
            1 => Some(BusIndex::Can1),
            2 => Some(BusIndex::SingleWire),
            _ => None,
        }
    }

    /// Pass-through peer for the two main buses.
    pub const fn pass_through_peer(self) -> Option<Self> {
        match self {
            BusIndex::Can0 => Some(BusIndex::Can1),
            BusIndex::Can1 => Some(BusIndex::Can0),
            BusIndex::SingleWire => None,
        }
    }
}

//==================================================================================FRAME
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// One data frame. Fields are private so that `len <= 8` always holds.
pub struct Frame {
    id: u32,
    extended: bool,
    bus: BusIndex,
    len: u8,
    data: [u8; MAX_DATA_LEN],
    timestamp_us: u32,
}

impl Frame {
    /// Build a frame on bus 0 with a zero timestamp, validating id width and length.
    pub fn new(id: u32, extended: bool, data: &[u8]) -> Result<Self, FrameError> {
        check_id(id, extended)?;
        if data.len() > MAX_DATA_LEN {
            return Err(FrameError::InvalidLength { len: data.len() });
        }
        let mut payload = [0u8; MAX_DATA_LEN];
        payload[..data.len()].copy_from_slice(data);
        Ok(Self {
            id,
            extended,
            bus: BusIndex::Can0,
            len: data.len() as u8,
            data: payload,
            timestamp_us: 0,
        })
    }

    /// Build a frame from a wire identifier. The id keeps every bit but 31;
    /// payload bytes beyond eight are ignored.
    pub fn from_wire(wire: WireId, data: &[u8]) -> Self {
        let len = data.len().min(MAX_DATA_LEN);
        let mut payload = [0u8; MAX_DATA_LEN];
        payload[..len].copy_from_slice(&data[..len]);
        Self {
            id: wire.id(),
            extended: wire.is_extended(),
            bus: BusIndex::Can0,
            len: len as u8,
            data: payload,
            timestamp_us: 0,
        }
    }

    pub fn with_bus(mut self, bus: BusIndex) -> Self {
        self.bus = bus;
        self
    }

    /// Attach the capture time (microseconds, wrapping).
    pub fn with_timestamp(mut self, timestamp_us: u32) -> Self {
        self.timestamp_us = timestamp_us;
        self
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn is_extended(&self) -> bool {
        self.extended
    }

    pub fn bus(&self) -> BusIndex {
        self.bus
    }

    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Valid payload bytes only.
    pub fn data(&self) -> &[u8] {
        &self.data[..self.len as usize]
    }

    pub fn timestamp_us(&self) -> u32 {
        self.timestamp_us
    }

    /// Identifier word as sent to the host (bit 31 set when extended).
    pub fn wire_id(&self) -> WireId {
        WireId::new(self.id, self.extended)
    }
}

impl embedded_can::Frame for Frame {
    fn new(id: impl Into<Id>, data: &[u8]) -> Option<Self> {
        match id.into() {
            Id::Standard(id) => Frame::new(id.as_raw() as u32, false, data).ok(),
            Id::Extended(id) => Frame::new(id.as_raw(), true, data).ok(),
        }
    }

    /// Remote frames are not carried by the bridge.
    fn new_remote(_id: impl Into<Id>, _dlc: usize) -> Option<Self> {
        None
    }

    fn is_extended(&self) -> bool {
        self.extended
    }

    fn is_remote_frame(&self) -> bool {
        false
    }

    /// Wire ids may carry bits beyond the declared width; only the bits the
    /// controller transmits are kept.
    fn id(&self) -> Id {
        if self.extended {
            Id::Extended(
                ExtendedId::new(self.id & EXTENDED_ID_MAX).unwrap_or(ExtendedId::MAX),
            )
        } else {
            Id::Standard(
                StandardId::new((self.id & STANDARD_ID_MAX) as u16).unwrap_or(StandardId::MAX),
            )
        }
    }

    fn dlc(&self) -> usize {
        self.len as usize
    }

    fn data(&self) -> &[u8] {
        Frame::data(self)
    }
}

#[cfg(test)]
#[path = "tests.rs"]
mod tests;
