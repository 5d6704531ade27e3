//! Digital toggle: one CAN message mapped to one GPIO pin.
//!
//! Mode bit 0 picks the direction.
//! * CAN → pin: a matching frame on a participating bus inverts the pin.
//! * Pin → CAN: the pin is sampled once per loop; after more than three
//!   consecutive samples that disagree with the believed state, the state
//!   flips and the configured frame is emitted.
use crate::protocol::transport::can_frame::{BusIndex, Frame};
use crate::protocol::transport::can_id::WireId;
use crate::protocol::transport::traits::board::DigitalIo;
use crate::settings::DigitalToggleRule;

/// Differing samples needed before a pin transition counts.
pub const DEBOUNCE_SAMPLES: u8 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DigitalToggle {
    rule: DigitalToggleRule,
    /// Believed pin level.
    state: bool,
    counter: u8,
}

impl DigitalToggle {
    /// Start from the idle level given by mode bit 7.
    pub fn new(rule: DigitalToggleRule) -> Self {
        Self {
            rule,
            state: !rule.mode.idle_low(),
            counter: 0,
        }
    }

    pub fn rule(&self) -> &DigitalToggleRule {
        &self.rule
    }

    pub fn state(&self) -> bool {
        self.state
    }

    /// Drive the output to its idle level (CAN → pin rules only).
    pub fn init<IO: DigitalIo>(&mut self, io: &mut IO) {
        if self.rule.enabled && self.rule.mode.can_to_pin() {
            io.write_pin(self.rule.pin, self.state);
        }
    }

    /// Frames from `bus` should be offered to [`DigitalToggle::process_frame`].
    pub fn accepts(&self, bus: BusIndex) -> bool {
        self.rule.enabled && self.rule.mode.can_to_pin() && self.rule.mode.includes(bus)
    }

    /// Exact id match, then positional match of every configured payload byte.
    pub fn matches(&self, frame: &Frame) -> bool {
        if frame.id() != self.rule.id {
            return false;
        }
        let expected = self.rule.payload();
        frame.data().len() >= expected.len() && frame.data()[..expected.len()] == *expected
    }

    /// Invert the pin on a match. Returns whether the pin changed.
    pub fn process_frame<IO: DigitalIo>(&mut self, frame: &Frame, io: &mut IO) -> bool {
        if !self.matches(frame) {
            return false;
        }
        self.state = !self.state;
        io.write_pin(self.rule.pin, self.state);
        #[cfg(feature = "defmt")]
        defmt::info!("Toggle pin {} -> {}", self.rule.pin, self.state);
        true
    }

    /// Feed one pin sample to the debouncer. Returns the frame to emit when a
    /// transition is confirmed.
    pub fn sample_pin(&mut self, level: bool) -> Option<Frame> {
        if level == self.state {
            self.counter = 0;
            return None;
        }
        self.counter += 1;
        if self.counter < DEBOUNCE_SAMPLES {
            return None;
        }
        self.counter = 0;
        self.state = level;
        #[cfg(feature = "defmt")]
        defmt::info!("Toggle input {} settled {}", self.rule.pin, level);
        Some(Frame::from_wire(
            WireId::inferred(self.rule.id),
            self.rule.payload(),
        ))
    }

    /// Sample the input pin (pin → CAN rules only).
    pub fn poll_pin<IO: DigitalIo>(&mut self, io: &mut IO) -> Option<Frame> {
        if !self.rule.enabled || self.rule.mode.can_to_pin() {
            return None;
        }
        let level = io.read_pin(self.rule.pin);
        self.sample_pin(level)
    }

    /// Buses a pin-triggered frame goes out on.
    pub fn target_buses(&self) -> impl Iterator<Item = BusIndex> + '_ {
        [BusIndex::Can0, BusIndex::Can1]
            .into_iter()
            .filter(move |bus| self.rule.mode.includes(*bus))
    }
}
