//! Hardware profile derived from the persisted [`SystemType`].
use super::SystemType;

/// GPIO sensing the CAN0 → CAN1 pass-through jumper (pulled up: open = pass).
pub const PASS_0TO1_PIN: u8 = 11;
/// GPIO sensing the CAN1 → CAN0 pass-through jumper.
pub const PASS_1TO0_PIN: u8 = 12;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// What the selected board variant provides.
pub struct SystemProfile {
    pub system_type: SystemType,
    /// The single-wire bus has its own controller (otherwise it shares CAN1).
    pub dedicated_single_wire: bool,
    /// The board wires the single-wire transceiver mode pins.
    pub single_wire_transceiver: bool,
    /// Buses usable on this board.
    pub bus_count: u8,
    /// Removable storage is fitted.
    pub storage_available: bool,
    /// Receive activity LED.
    pub rx_led_pin: u8,
    pub pass_0to1_pin: u8,
    pub pass_1to0_pin: u8,
}

impl SystemProfile {
    pub const fn for_system(system_type: SystemType) -> Self {
        let (dedicated, transceiver, bus_count, storage, rx_led) = match system_type {
            SystemType::CanDue => (false, true, 2, true, 72),
            SystemType::Gevcu => (false, false, 2, false, 13),
            SystemType::CanDue13 => (false, true, 2, true, 13),
            SystemType::CanDue22 => (true, true, 3, true, 13),
        };
        Self {
            system_type,
            dedicated_single_wire: dedicated,
            single_wire_transceiver: transceiver,
            bus_count,
            storage_available: storage,
            rx_led_pin: rx_led,
            pass_0to1_pin: PASS_0TO1_PIN,
            pass_1to0_pin: PASS_1TO0_PIN,
        }
    }
}

impl From<SystemType> for SystemProfile {
    fn from(system_type: SystemType) -> Self {
        Self::for_system(system_type)
    }
}
