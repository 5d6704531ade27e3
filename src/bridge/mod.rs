//! The bridge loop: owns the collaborators and the in-memory state, drains
//! the buses through the router, runs the toggle input, flushes the host
//! buffer, and feeds host bytes to the command engine.
//!
//! Everything runs on one cooperative loop. [`Bridge::poll`] is one
//! iteration; [`Bridge::run`] repeats it forever, pausing on a [`LoopTimer`].
pub mod dispatch;
pub mod platform;

use embassy_time::Duration;

use crate::protocol::command::parser::CommandParser;
use crate::protocol::command::ChecksumPolicy;
use crate::protocol::encoding::host::{HostMode, LawicelConfig};
use crate::protocol::routing::{FrameRouter, RouteContext};
use crate::protocol::toggle::DigitalToggle;
use crate::protocol::transport::can_frame::{BusIndex, Frame};
use crate::protocol::transport::can_id::Filter;
use crate::protocol::transport::traits::board::{Clock, SingleWireMode, SingleWireTransceiver};
use crate::protocol::transport::traits::bus_driver::BusDriver;
use crate::protocol::transport::traits::host_link::HostLink;
use crate::protocol::transport::traits::loop_timer::LoopTimer;
use crate::protocol::transport::MAX_BYTES_PER_POLL;
use crate::settings::profile::SystemProfile;
use crate::settings::record::{load_record, store_record};
use crate::settings::{BusConfig, DigitalToggleRule, Settings};

use self::platform::{Peripherals, Platform};

/// Pause between two loop iterations in [`Bridge::run`].
pub const LOOP_INTERVAL: Duration = Duration::from_micros(100);

//==================================================================================CONFIG
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Runtime switches that are not part of the persisted settings.
pub struct BridgeConfig {
    pub checksum_policy: ChecksumPolicy,
    pub lawicel: LawicelConfig,
}

//==================================================================================BRIDGE
pub struct Bridge<P: Platform> {
    hw: Peripherals<P>,
    settings: Settings,
    profile: SystemProfile,
    parser: CommandParser,
    router: FrameRouter,
    toggle: DigitalToggle,
    lawicel: LawicelConfig,
}

impl<P: Platform> Bridge<P> {
    /// Load both persisted records (resetting untrusted ones) and bring the
    /// hardware up from them.
    pub fn new(mut hw: Peripherals<P>, config: BridgeConfig) -> Self {
        let (settings, _settings_outcome) = load_record::<Settings, _>(&mut hw.store);
        let (rule, _rule_outcome) = load_record::<DigitalToggleRule, _>(&mut hw.store);
        #[cfg(feature = "defmt")]
        defmt::info!(
            "Settings: {}, toggle rule: {}",
            _settings_outcome,
            _rule_outcome
        );
        let now = hw.clock.now();
        let mut bridge = Self {
            profile: SystemProfile::for_system(settings.system_type),
            settings,
            parser: CommandParser::new(config.checksum_policy),
            router: FrameRouter::new(now),
            toggle: DigitalToggle::new(rule),
            lawicel: config.lawicel,
            hw,
        };
        bridge.bootstrap();
        bridge
    }

    /// Apply the settings to the hardware: bus drivers, single-wire
    /// transceiver, toggle output, and file logging (auto-start, or kept
    /// running when the new variant still has storage).
    pub fn bootstrap(&mut self) {
        #[cfg(feature = "defmt")]
        defmt::info!("Bootstrapping for {}", self.profile.system_type);
        start_bus(&mut self.hw.can0, self.settings.bus(BusIndex::Can0));
        start_bus(&mut self.hw.can1, self.settings.bus(BusIndex::Can1));
        self.apply_single_wire_mode();
        if self.profile.dedicated_single_wire {
            start_bus(
                &mut self.hw.single_wire,
                self.settings.bus(BusIndex::SingleWire),
            );
        }
        self.toggle.init(&mut self.hw.io);
        // A running log session survives a re-bootstrap if storage remains.
        let logging = (self.router.file_logging() || self.settings.auto_start_logging)
            && self.profile.storage_available
            && self.hw.sink.is_some();
        self.router.set_file_logging(logging);
    }

    /// One loop iteration.
    pub fn poll(&mut self) {
        self.drain_bus(BusIndex::Can0);
        self.drain_bus(BusIndex::Can1);
        if self.profile.dedicated_single_wire && self.settings.single_wire_enabled() {
            self.drain_bus(BusIndex::SingleWire);
        }

        if let Some(frame) = self.toggle.poll_pin(&mut self.hw.io) {
            for bus in self.toggle.target_buses() {
                let _ = self.hw.send(bus, &frame.with_bus(bus));
            }
        }

        self.router.flush_if_due(&mut self.hw);

        for _ in 0..MAX_BYTES_PER_POLL {
            let Some(byte) = self.hw.link.read_byte() else {
                break;
            };
            if let Some(event) = self.parser.push_byte(byte) {
                self.handle_event(event);
            }
        }
    }

    /// Run the loop forever.
    pub async fn run<T: LoopTimer>(&mut self, timer: &mut T) -> ! {
        loop {
            self.poll();
            timer.delay(LOOP_INTERVAL).await;
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn toggle_rule(&self) -> &DigitalToggleRule {
        self.toggle.rule()
    }

    pub fn profile(&self) -> &SystemProfile {
        &self.profile
    }

    pub fn lawicel(&self) -> LawicelConfig {
        self.lawicel
    }

    pub fn set_lawicel(&mut self, lawicel: LawicelConfig) {
        self.lawicel = lawicel;
    }

    /// Encoding currently used on the host link.
    pub fn host_mode(&self) -> HostMode {
        HostMode::select(self.settings.comm_mode, self.lawicel)
    }

    pub fn file_logging(&self) -> bool {
        self.router.file_logging()
    }

    /// Start or stop file logging. Starting needs storage and a mounted sink.
    pub fn set_file_logging(&mut self, active: bool) -> bool {
        let active = active && self.profile.storage_available && self.hw.sink.is_some();
        self.router.set_file_logging(active);
        active
    }

    /// Binary bytes waiting for the next host flush.
    pub fn host_pending(&self) -> usize {
        self.router.host_pending()
    }

    pub fn peripherals(&self) -> &Peripherals<P> {
        &self.hw
    }

    pub fn peripherals_mut(&mut self) -> &mut Peripherals<P> {
        &mut self.hw
    }

    //==============================================================================INTERNALS
    fn drain_bus(&mut self, bus: BusIndex) {
        let ctx = RouteContext {
            settings: &self.settings,
            profile: &self.profile,
            host_mode: HostMode::select(self.settings.comm_mode, self.lawicel),
        };
        loop {
            let frame = match bus {
                BusIndex::Can0 => next_frame(&mut self.hw.can0),
                BusIndex::Can1 => next_frame(&mut self.hw.can1),
                BusIndex::SingleWire => next_frame(&mut self.hw.single_wire),
            };
            let Some(frame) = frame else {
                break;
            };
            self.router
                .route(frame.with_bus(bus), &ctx, &mut self.hw, &mut self.toggle);
        }
    }

    /// Transceiver mode from the settings. A transceiver sharing CAN1 only
    /// wakes when CAN1 is up too.
    fn apply_single_wire_mode(&mut self) {
        if !self.profile.single_wire_transceiver {
            return;
        }
        let awake = self.settings.single_wire_enabled()
            && (self.profile.dedicated_single_wire || self.settings.bus(BusIndex::Can1).enabled);
        let mode = if awake {
            SingleWireMode::Normal
        } else {
            SingleWireMode::Sleep
        };
        self.hw.transceiver.set_mode(mode);
    }

    /// Open filters on both main buses.
    fn set_promiscuous(&mut self) {
        for (slot, filter) in Filter::promiscuous_set().iter().enumerate() {
            self.hw.can0.set_filter(slot as u8, filter);
            self.hw.can1.set_filter(slot as u8, filter);
        }
    }

    fn persist_settings(&mut self) {
        if let Err(_err) = store_record(&self.settings, &mut self.hw.store) {
            #[cfg(feature = "defmt")]
            defmt::error!("Settings not saved: {}", defmt::Debug2Format(&_err));
        }
    }
}

fn next_frame<D: BusDriver>(driver: &mut D) -> Option<Frame> {
    if driver.available() {
        driver.read()
    } else {
        None
    }
}

/// Bring one driver in line with its configuration.
fn start_bus<D: BusDriver>(driver: &mut D, config: &BusConfig) {
    if !config.enabled {
        driver.disable();
        return;
    }
    driver.set_listen_only(config.listen_only);
    driver.enable();
    if let Err(_err) = driver.begin(config.speed) {
        #[cfg(feature = "defmt")]
        defmt::error!(
            "Bus start at {} bit/s failed: {}",
            config.speed,
            defmt::Debug2Format(&_err)
        );
    }
    for (slot, filter) in config.filters.iter().enumerate() {
        if filter.enabled {
            driver.set_filter(slot as u8, filter);
        }
    }
}
