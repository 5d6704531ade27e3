//! Queued bus adapter for task- or interrupt-driven reception.
//!
//! The receive side of a controller pushes frames into a bounded
//! [`embassy_sync::channel::Channel`]; [`QueuedBus`] presents that queue to the
//! bridge as an ordinary poll-based [`BusDriver`]. With one queue per bus and a
//! single consumer, frames of a bus keep their arrival order and the bridge's
//! per-iteration bus order is unchanged.
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::channel::{Channel, Sender, TrySendError};

use crate::protocol::transport::can_frame::{BusIndex, Frame};
use crate::protocol::transport::can_id::Filter;
use crate::protocol::transport::traits::bus_driver::BusDriver;

/// Bounded inbound queue shared between a receive task and the bridge.
pub struct FrameQueue<M: RawMutex, const N: usize> {
    channel: Channel<M, Frame, N>,
}

impl<M: RawMutex, const N: usize> Default for FrameQueue<M, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: RawMutex, const N: usize> FrameQueue<M, N> {
    pub const fn new() -> Self {
        Self {
            channel: Channel::new(),
        }
    }

    /// Producer handle for the receive task.
    pub fn feeder(&self) -> FrameFeeder<'_, M, N> {
        FrameFeeder {
            sender: self.channel.sender(),
        }
    }

    /// Frames waiting.
    pub fn len(&self) -> usize {
        self.channel.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channel.is_empty()
    }
}

/// Producer side of a [`FrameQueue`].
pub struct FrameFeeder<'a, M: RawMutex, const N: usize> {
    sender: Sender<'a, M, Frame, N>,
}

impl<M: RawMutex, const N: usize> FrameFeeder<'_, M, N> {
    /// Enqueue without blocking. A full queue hands the frame back (newest dropped).
    pub fn push(&self, frame: Frame) -> Result<(), Frame> {
        self.sender.try_send(frame).map_err(|err| match err {
            TrySendError::Full(frame) => {
                #[cfg(feature = "defmt")]
                defmt::warn!("Inbound queue full, dropping frame {:x}", frame.id());
                frame
            }
        })
    }

    /// Enqueue, waiting for room.
    pub async fn push_async(&self, frame: Frame) {
        self.sender.send(frame).await;
    }
}

/// Wraps a controller so its inbound frames come from a [`FrameQueue`].
/// Control and transmit calls go straight to the wrapped driver.
pub struct QueuedBus<'a, D: BusDriver, M: RawMutex, const N: usize> {
    driver: D,
    queue: &'a FrameQueue<M, N>,
    bus: BusIndex,
}

impl<'a, D: BusDriver, M: RawMutex, const N: usize> QueuedBus<'a, D, M, N> {
    pub fn new(driver: D, queue: &'a FrameQueue<M, N>, bus: BusIndex) -> Self {
        Self { driver, queue, bus }
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }
}

impl<D: BusDriver, M: RawMutex, const N: usize> BusDriver for QueuedBus<'_, D, M, N> {
    type Error = D::Error;

    fn enable(&mut self) {
        self.driver.enable();
    }

    fn disable(&mut self) {
        self.driver.disable();
    }

    fn begin(&mut self, speed: u32) -> Result<(), Self::Error> {
        self.driver.begin(speed)
    }

    fn set_listen_only(&mut self, listen_only: bool) {
        self.driver.set_listen_only(listen_only);
    }

    fn set_filter(&mut self, slot: u8, filter: &Filter) {
        self.driver.set_filter(slot, filter);
    }

    fn available(&self) -> bool {
        !self.queue.is_empty()
    }

    /// Pop from the queue, tagging the frame with this adapter's bus.
    fn read(&mut self) -> Option<Frame> {
        self.queue
            .channel
            .try_receive()
            .ok()
            .map(|frame| frame.with_bus(self.bus))
    }

    fn send(&mut self, frame: &Frame) -> Result<(), Self::Error> {
        self.driver.send(frame)
    }
}
