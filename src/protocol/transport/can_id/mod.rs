//! CAN identifiers as they travel on the GVRET wire: a 32-bit little-endian
//! word whose bit 31 flags an extended (29-bit) identifier.
use crate::error::FrameError;

/// Bit 31 of a wire identifier: set for extended frames.
pub const EXTENDED_FLAG: u32 = 0x8000_0000;
/// Largest 11-bit identifier.
pub const STANDARD_ID_MAX: u32 = 0x7FF;
/// Largest 29-bit identifier.
pub const EXTENDED_ID_MAX: u32 = 0x1FFF_FFFF;

//==================================================================================WIRE_ID
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Raw identifier word with the extended flag folded into bit 31.
pub struct WireId(pub u32);

impl WireId {
    /// Fold an identifier and its width into one word.
    pub const fn new(id: u32, extended: bool) -> Self {
        if extended {
            Self((id & !EXTENDED_FLAG) | EXTENDED_FLAG)
        } else {
            Self(id & !EXTENDED_FLAG)
        }
    }

    /// Width derived from the value: anything above the 11-bit range is extended.
    pub const fn inferred(id: u32) -> Self {
        Self::new(id, id > STANDARD_ID_MAX)
    }

    /// Bit 31 was set on the wire.
    pub const fn is_extended(self) -> bool {
        self.0 & EXTENDED_FLAG != 0
    }

    /// Identifier with bit 31 cleared; no further masking.
    pub const fn id(self) -> u32 {
        self.0 & !EXTENDED_FLAG
    }

    /// Little-endian wire bytes.
    pub const fn to_le_bytes(self) -> [u8; 4] {
        self.0.to_le_bytes()
    }
}

/// Reject identifiers that do not fit the declared width.
pub fn check_id(id: u32, extended: bool) -> Result<(), FrameError> {
    let max = if extended {
        EXTENDED_ID_MAX
    } else {
        STANDARD_ID_MAX
    };
    if id > max {
        return Err(FrameError::InvalidId { id, extended });
    }
    Ok(())
}

//==================================================================================FILTER
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Acceptance filter for one driver mailbox. Handed to the driver as-is.
pub struct Filter {
    pub id: u32,
    pub mask: u32,
    pub extended: bool,
    pub enabled: bool,
}

/// Filter slots per bus.
pub const FILTER_SLOTS: usize = 8;
/// Slots `0..EXTENDED_FILTER_SLOTS` take extended frames in the open layout.
pub const EXTENDED_FILTER_SLOTS: usize = 3;

impl Filter {
    /// Accept-all filter (id 0, mask 0).
    pub const fn open(extended: bool) -> Self {
        Self {
            id: 0,
            mask: 0,
            extended,
            enabled: true,
        }
    }

    /// Open filter set: three extended slots followed by five standard slots.
    pub const fn promiscuous_set() -> [Filter; FILTER_SLOTS] {
        let mut filters = [Filter::open(false); FILTER_SLOTS];
        let mut slot = 0;
        while slot < EXTENDED_FILTER_SLOTS {
            filters[slot] = Filter::open(true);
            slot += 1;
        }
        filters
    }
}
