//! Frame router: fans each inbound frame out to its consumers.
//!
//! Per frame, in order: pass-through retransmit, receive indicator, host
//! encode, file encode, toggle evaluation.
use embassy_time::Instant;

use crate::bridge::platform::{Peripherals, Platform};
use crate::protocol::encoding::file::FileEncoder;
use crate::protocol::encoding::host::{HostEncoder, HostMode};
use crate::protocol::toggle::DigitalToggle;
use crate::protocol::transport::can_frame::{BusIndex, Frame};
use crate::protocol::transport::traits::board::{Clock, DigitalIo};
use crate::settings::profile::SystemProfile;
use crate::settings::Settings;

/// Read-only state the router consults for one frame.
pub struct RouteContext<'a> {
    pub settings: &'a Settings,
    pub profile: &'a SystemProfile,
    pub host_mode: HostMode,
}

/// Output side of the bridge: host buffer, file logging switch, RX indicator.
pub struct FrameRouter {
    host: HostEncoder,
    file: FileEncoder,
    rx_indicator: bool,
}

impl FrameRouter {
    pub fn new(now: Instant) -> Self {
        Self {
            host: HostEncoder::new(now),
            file: FileEncoder::new(),
            rx_indicator: false,
        }
    }

    pub fn file_logging(&self) -> bool {
        self.file.is_active()
    }

    pub fn set_file_logging(&mut self, active: bool) {
        self.file.set_active(active);
    }

    /// Binary bytes waiting for the next host flush.
    pub fn host_pending(&self) -> usize {
        self.host.pending()
    }

    /// Route one frame read from a bus.
    pub fn route<P: Platform>(
        &mut self,
        frame: Frame,
        ctx: &RouteContext<'_>,
        hw: &mut Peripherals<P>,
        toggle: &mut DigitalToggle,
    ) {
        let now = hw.clock.now();
        let frame = if frame.timestamp_us() == 0 {
            frame.with_timestamp(now.as_micros() as u32)
        } else {
            frame
        };

        if let Some(peer) = frame.bus().pass_through_peer() {
            let pin = match frame.bus() {
                BusIndex::Can0 => ctx.profile.pass_0to1_pin,
                _ => ctx.profile.pass_1to0_pin,
            };
            // Jumper open (pulled up) enables pass-through.
            if hw.io.read_pin(pin) {
                let _ = hw.send(peer, &frame);
            }
        }

        self.indicate_rx(ctx.profile, &mut hw.io);
        self.encode_host(ctx.host_mode, &frame, now, hw);

        if let Some(sink) = hw.sink.as_mut() {
            if let Err(_err) = self.file.log(ctx.settings.file_format, &frame, now, sink) {
                #[cfg(feature = "defmt")]
                defmt::warn!("Frame not logged: {}", defmt::Debug2Format(&_err));
            }
        }

        if toggle.accepts(frame.bus()) {
            toggle.process_frame(&frame, &mut hw.io);
        }
    }

    /// Loop a host-built frame straight back to the host.
    pub fn echo<P: Platform>(
        &mut self,
        frame: Frame,
        ctx: &RouteContext<'_>,
        hw: &mut Peripherals<P>,
    ) {
        let now = hw.clock.now();
        let frame = frame.with_timestamp(now.as_micros() as u32);
        self.indicate_rx(ctx.profile, &mut hw.io);
        self.encode_host(ctx.host_mode, &frame, now, hw);
    }

    /// Timed flush of the binary host buffer.
    pub fn flush_if_due<P: Platform>(&mut self, hw: &mut Peripherals<P>) {
        let now = hw.clock.now();
        if let Err(_err) = self.host.flush_if_due(now, &mut hw.link) {
            #[cfg(feature = "defmt")]
            defmt::warn!("Host flush failed: {}", defmt::Debug2Format(&_err));
        }
    }

    fn indicate_rx<IO: DigitalIo>(&mut self, profile: &SystemProfile, io: &mut IO) {
        self.rx_indicator = !self.rx_indicator;
        io.write_pin(profile.rx_led_pin, self.rx_indicator);
    }

    fn encode_host<P: Platform>(
        &mut self,
        mode: HostMode,
        frame: &Frame,
        now: Instant,
        hw: &mut Peripherals<P>,
    ) {
        if let Err(_err) = self.host.encode(mode, frame, now, &mut hw.link) {
            #[cfg(feature = "defmt")]
            defmt::warn!("Host encode failed: {}", defmt::Debug2Format(&_err));
        }
    }
}
