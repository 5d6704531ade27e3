//! Command execution: applies parsed host commands to the settings, the
//! drivers, and the host link.
use embassy_time::Duration;
use heapless::Vec;

use super::{start_bus, Bridge};
use crate::bridge::platform::Platform;
use crate::protocol::command::response::{BusStatus, Response, MAX_RESPONSE_LEN};
use crate::protocol::command::{BusWord, Command, Event};
use crate::protocol::encoding::host::HostMode;
use crate::protocol::routing::RouteContext;
use crate::protocol::transport::can_frame::{BusIndex, Frame};
use crate::protocol::transport::traits::board::{
    Clock, DigitalIo, SingleWireMode, SingleWireTransceiver,
};
use crate::protocol::transport::traits::host_link::{Console, HostLink};
use crate::protocol::transport::BUILD_NUMBER;
use crate::settings::profile::SystemProfile;
use crate::settings::record::SETTINGS_VERSION;
use crate::settings::{CommMode, SystemType};

/// Identifier that triggers the single-wire high-voltage wake-up.
pub const SINGLE_WIRE_WAKE_ID: u32 = 0x100;
/// Settle time around a wake-up transmission.
const WAKE_SETTLE: Duration = Duration::from_millis(1);
/// Bus count reported to the host, regardless of variant.
const REPORTED_BUS_COUNT: u8 = 3;
const DIGITAL_INPUTS: u8 = 4;
const ANALOG_INPUTS: u8 = 4;
const DIGITAL_OUTPUTS: u8 = 8;

impl<P: Platform> Bridge<P> {
    /// React to one parser event.
    pub fn handle_event(&mut self, event: Event) {
        match event {
            Event::Command(command) => self.execute(command),
            Event::EnableBinaryMode => {
                #[cfg(feature = "defmt")]
                defmt::info!("Binary mode, promiscuous filters");
                self.settings.comm_mode = CommMode::Binary;
                self.lawicel.enabled = false;
                self.set_promiscuous();
            }
            Event::Console(byte) => self.hw.console.receive_byte(byte),
            Event::UnknownOpcode(_opcode) => {
                #[cfg(feature = "defmt")]
                defmt::warn!("Unknown command byte {=u8:#x}", _opcode);
            }
            Event::UnroutableFrame { bus: _bus } => {
                #[cfg(feature = "defmt")]
                defmt::warn!("Frame for bus {} dropped: no such bus", _bus);
            }
            Event::ChecksumRejected {
                computed: _computed,
                received: _received,
            } => {
                #[cfg(feature = "defmt")]
                defmt::warn!(
                    "Frame command dropped: checksum {=u8:#x}, received {=u8:#x}",
                    _computed,
                    _received
                );
            }
        }
    }

    fn execute(&mut self, command: Command) {
        match command {
            Command::Transmit(frame) => self.transmit(frame),
            Command::Echo(frame) => {
                let ctx = RouteContext {
                    settings: &self.settings,
                    profile: &self.profile,
                    host_mode: HostMode::select(self.settings.comm_mode, self.lawicel),
                };
                self.router.echo(frame, &ctx, &mut self.hw);
            }
            Command::TimeSync => {
                let micros = self.hw.clock.now().as_micros() as u32;
                self.respond(Response::TimeSync { micros });
            }
            Command::DigitalInputs => {
                let bits = (0..DIGITAL_INPUTS)
                    .filter(|index| self.hw.io.digital_input(*index))
                    .fold(0u8, |bits, index| bits | 1 << index);
                self.respond(Response::DigitalInputs { bits });
            }
            Command::AnalogInputs => {
                let mut values = [0u16; ANALOG_INPUTS as usize];
                for (index, value) in values.iter_mut().enumerate() {
                    *value = self.hw.io.analog_input(index as u8);
                }
                self.respond(Response::AnalogInputs { values });
            }
            Command::SetDigitalOutputs(bits) => {
                for index in 0..DIGITAL_OUTPUTS {
                    self.hw.io.set_output(index, bits & (1 << index) != 0);
                }
            }
            Command::SetupCanbus { can0, can1 } => {
                self.apply_bus_word(BusIndex::Can0, can0);
                self.apply_bus_word(BusIndex::Can1, can1);
                self.apply_single_wire_mode();
                self.persist_settings();
                self.set_promiscuous();
            }
            Command::GetCanbusParams => self.respond(Response::CanbusParams {
                can0: BusStatus::from(self.settings.bus(BusIndex::Can0)),
                can1: BusStatus::from(self.settings.bus(BusIndex::Can1)),
                single_wire_enabled: self.settings.single_wire_enabled(),
            }),
            Command::GetDeviceInfo => self.respond(Response::DeviceInfo {
                build: BUILD_NUMBER,
                version: SETTINGS_VERSION,
                file_format: self.settings.file_format,
                auto_start_logging: self.settings.auto_start_logging,
                single_wire_enabled: self.settings.single_wire_enabled(),
            }),
            Command::SetSingleWireMode { enabled } => {
                self.settings.bus_mut(BusIndex::SingleWire).enabled = enabled;
                self.persist_settings();
                self.apply_single_wire_mode();
            }
            Command::Keepalive => self.respond(Response::Keepalive),
            Command::SetSystemType(selector) => {
                self.settings.system_type = SystemType::from_u8(selector);
                self.persist_settings();
                self.profile = SystemProfile::for_system(self.settings.system_type);
                self.bootstrap();
            }
            Command::GetNumBuses => self.respond(Response::NumBuses {
                count: REPORTED_BUS_COUNT,
            }),
            Command::GetExtBuses => self.respond(Response::ExtBuses {
                single_wire: BusStatus::from(self.settings.bus(BusIndex::SingleWire)),
            }),
            Command::SetupExtBuses {
                single_wire,
                reserved: _reserved,
            } => {
                #[cfg(feature = "defmt")]
                defmt::debug!("Reserved bus words ignored: {}", _reserved);
                self.setup_single_wire(single_wire);
                self.persist_settings();
            }
        }
    }

    /// Send a host-built frame. On boards without a dedicated controller the
    /// single-wire transceiver hangs off CAN1, so bus 2 goes out there.
    fn transmit(&mut self, frame: Frame) {
        let bus = frame.bus();
        let driver_bus = match bus {
            BusIndex::SingleWire if !self.profile.dedicated_single_wire => BusIndex::Can1,
            other => other,
        };
        let wake = self.settings.single_wire_enabled()
            && frame.id() == SINGLE_WIRE_WAKE_ID
            && (bus == BusIndex::SingleWire
                || (bus == BusIndex::Can1 && !self.profile.dedicated_single_wire));

        if wake {
            if self.profile.single_wire_transceiver {
                self.hw.transceiver.set_mode(SingleWireMode::Wakeup);
            }
            self.hw.clock.delay(WAKE_SETTLE);
        }
        let _ = self.hw.send(driver_bus, &frame);
        if wake {
            self.hw.clock.delay(WAKE_SETTLE);
            self.apply_single_wire_mode();
        }
    }

    /// Apply a SETUP_CANBUS word to one main bus and restart its driver.
    fn apply_bus_word(&mut self, bus: BusIndex, word: BusWord) {
        let config = self.settings.bus_mut(bus);
        config.enabled = word.enabled;
        if let Some(listen_only) = word.listen_only {
            config.listen_only = listen_only;
        }
        if let Some(speed) = word.speed {
            config.speed = speed;
        }
        let config = *config;
        match bus {
            BusIndex::Can0 => start_bus(&mut self.hw.can0, &config),
            BusIndex::Can1 => start_bus(&mut self.hw.can1, &config),
            BusIndex::SingleWire => start_bus(&mut self.hw.single_wire, &config),
        }
    }

    /// SET_EXT_BUSES: a non-zero word configures and starts the single-wire
    /// bus, the zero word disables it and puts the transceiver to sleep.
    fn setup_single_wire(&mut self, word: BusWord) {
        let config = self.settings.bus_mut(BusIndex::SingleWire);
        match word.speed {
            Some(speed) => {
                config.enabled = word.enabled;
                config.speed = speed;
                if let Some(listen_only) = word.listen_only {
                    config.listen_only = listen_only;
                }
            }
            None => config.enabled = false,
        }
        let config = *config;
        if self.profile.dedicated_single_wire {
            start_bus(&mut self.hw.single_wire, &config);
        }
        self.apply_single_wire_mode();
    }

    fn respond(&mut self, response: Response) {
        let mut out: Vec<u8, MAX_RESPONSE_LEN> = Vec::new();
        if let Err(_err) = response.encode_into(&mut out) {
            #[cfg(feature = "defmt")]
            defmt::error!("Response not encoded: {}", defmt::Debug2Format(&_err));
            return;
        }
        if let Err(_err) = self.hw.link.write(&out) {
            #[cfg(feature = "defmt")]
            defmt::warn!("Response not sent: {}", defmt::Debug2Format(&_err));
        }
    }
}
