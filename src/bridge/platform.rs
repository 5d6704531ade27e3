//! Board binding: the collaborator types a target provides, and the bundle
//! of instances the bridge owns.
use crate::error::TransmitError;
use crate::protocol::transport::can_frame::{BusIndex, Frame};
use crate::protocol::transport::traits::board::{Clock, DigitalIo, SingleWireTransceiver};
use crate::protocol::transport::traits::bus_driver::BusDriver;
use crate::protocol::transport::traits::host_link::{Console, HostLink};
use crate::protocol::transport::traits::storage::{FileSink, Persistence};

/// Collaborator types of one board.
pub trait Platform {
    /// Driver of the two main CAN controllers.
    type Bus: BusDriver;
    /// Driver of the dedicated single-wire controller.
    type SingleWire: BusDriver;
    type Transceiver: SingleWireTransceiver;
    type Link: HostLink;
    type Store: Persistence;
    type Sink: FileSink;
    type Io: DigitalIo;
    type Clock: Clock;
    type Console: Console;
}

/// Every collaborator instance, owned by the bridge.
pub struct Peripherals<P: Platform> {
    pub can0: P::Bus,
    pub can1: P::Bus,
    pub single_wire: P::SingleWire,
    pub transceiver: P::Transceiver,
    pub link: P::Link,
    pub store: P::Store,
    /// Absent when no removable storage is mounted.
    pub sink: Option<P::Sink>,
    pub io: P::Io,
    pub clock: P::Clock,
    pub console: P::Console,
}

impl<P: Platform> Peripherals<P> {
    /// Hand `frame` to the driver of `bus`.
    pub fn send(&mut self, bus: BusIndex, frame: &Frame) -> Result<(), TransmitError> {
        let result = match bus {
            BusIndex::Can0 => self.can0.send(frame).map_err(|_err| {
                #[cfg(feature = "defmt")]
                defmt::warn!("CAN0 send failed: {}", defmt::Debug2Format(&_err));
            }),
            BusIndex::Can1 => self.can1.send(frame).map_err(|_err| {
                #[cfg(feature = "defmt")]
                defmt::warn!("CAN1 send failed: {}", defmt::Debug2Format(&_err));
            }),
            BusIndex::SingleWire => self.single_wire.send(frame).map_err(|_err| {
                #[cfg(feature = "defmt")]
                defmt::warn!("Single-wire send failed: {}", defmt::Debug2Format(&_err));
            }),
        };
        result.map_err(|()| TransmitError::Rejected { bus: bus as u8 })
    }
}
