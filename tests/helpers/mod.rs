//! Test doubles for every bridge collaborator. Each mock records what the
//! bridge did to it; tests inspect them through `Bridge::peripherals`.
#![allow(dead_code)]
use std::collections::{HashMap, VecDeque};

use embassy_time::{Duration, Instant};
use gvret_bridge::bridge::platform::{Peripherals, Platform};
use gvret_bridge::bridge::{Bridge, BridgeConfig};
use gvret_bridge::protocol::transport::can_frame::Frame;
use gvret_bridge::protocol::transport::can_id::Filter;
use gvret_bridge::protocol::transport::traits::board::{
    Clock, DigitalIo, SingleWireMode, SingleWireTransceiver,
};
use gvret_bridge::protocol::transport::traits::bus_driver::BusDriver;
use gvret_bridge::protocol::transport::traits::host_link::{Console, HostLink};
use gvret_bridge::protocol::transport::traits::loop_timer::LoopTimer;
use gvret_bridge::protocol::transport::traits::storage::{FileSink, Persistence, RecordTag};
use gvret_bridge::settings::record::{store_record, Record, RECORD_BUFFER_SIZE};

//==================================================================================BUS
#[derive(Debug, Default)]
/// CAN controller fed from `inbound`; transmitted frames land in `sent`.
pub struct MockBus {
    pub inbound: VecDeque<Frame>,
    pub sent: Vec<Frame>,
    pub enabled: bool,
    pub listen_only: bool,
    pub speed: Option<u32>,
    pub filters: Vec<(u8, Filter)>,
    pub fail_send: bool,
}

impl BusDriver for MockBus {
    type Error = &'static str;

    fn enable(&mut self) {
        self.enabled = true;
    }

    fn disable(&mut self) {
        self.enabled = false;
    }

    fn begin(&mut self, speed: u32) -> Result<(), Self::Error> {
        self.speed = Some(speed);
        Ok(())
    }

    fn set_listen_only(&mut self, listen_only: bool) {
        self.listen_only = listen_only;
    }

    fn set_filter(&mut self, slot: u8, filter: &Filter) {
        self.filters.push((slot, *filter));
    }

    fn available(&self) -> bool {
        !self.inbound.is_empty()
    }

    fn read(&mut self) -> Option<Frame> {
        self.inbound.pop_front()
    }

    fn send(&mut self, frame: &Frame) -> Result<(), Self::Error> {
        if self.fail_send {
            return Err("bus off");
        }
        self.sent.push(*frame);
        Ok(())
    }
}

//==================================================================================LINK
#[derive(Debug, Default)]
/// Host serial link: bytes queued in `inbound` are read by the bridge.
pub struct MockLink {
    pub inbound: VecDeque<u8>,
    pub written: Vec<u8>,
    pub write_calls: usize,
}

impl MockLink {
    pub fn feed(&mut self, bytes: &[u8]) {
        self.inbound.extend(bytes.iter().copied());
    }

    /// Take everything written so far.
    pub fn drain(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.written)
    }
}

impl HostLink for MockLink {
    type Error = ();

    fn read_byte(&mut self) -> Option<u8> {
        self.inbound.pop_front()
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), ()> {
        self.write_calls += 1;
        self.written.extend_from_slice(bytes);
        Ok(())
    }
}

//==================================================================================STORAGE
#[derive(Debug, Clone)]
/// Two record pages, erased (`0xFF`) until written.
pub struct MockStore {
    pub settings: Vec<u8>,
    pub toggle: Vec<u8>,
    pub writes: Vec<RecordTag>,
}

impl Default for MockStore {
    fn default() -> Self {
        Self {
            settings: vec![0xFF; RECORD_BUFFER_SIZE],
            toggle: vec![0xFF; RECORD_BUFFER_SIZE],
            writes: Vec::new(),
        }
    }
}

impl MockStore {
    /// Store pre-populated with `record`.
    pub fn with_record<R: Record>(mut self, record: &R) -> Self {
        store_record(record, &mut self).unwrap();
        self.writes.clear();
        self
    }

    fn page(&mut self, tag: RecordTag) -> &mut Vec<u8> {
        match tag {
            RecordTag::Settings => &mut self.settings,
            RecordTag::DigitalToggle => &mut self.toggle,
        }
    }
}

impl Persistence for MockStore {
    type Error = ();

    fn read_record(&mut self, tag: RecordTag, buf: &mut [u8]) -> Result<usize, ()> {
        let page = self.page(tag);
        let len = buf.len().min(page.len());
        buf[..len].copy_from_slice(&page[..len]);
        Ok(len)
    }

    fn write_record(&mut self, tag: RecordTag, bytes: &[u8]) -> Result<(), ()> {
        let page = self.page(tag);
        page[..bytes.len()].copy_from_slice(bytes);
        self.writes.push(tag);
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MockSink {
    pub bytes: Vec<u8>,
    pub fail: bool,
}

impl FileSink for MockSink {
    type Error = &'static str;

    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        if self.fail {
            return Err("card removed");
        }
        self.bytes.extend_from_slice(bytes);
        Ok(())
    }
}

//==================================================================================BOARD
#[derive(Debug, Default)]
/// GPIO levels read from `levels` (unset pins read low).
pub struct MockIo {
    pub levels: HashMap<u8, bool>,
    pub writes: Vec<(u8, bool)>,
    pub digital: [bool; 4],
    pub analog: [u16; 4],
    pub outputs: [bool; 8],
}

impl MockIo {
    /// Writes to `pin`, in order.
    pub fn writes_to(&self, pin: u8) -> Vec<bool> {
        self.writes
            .iter()
            .filter(|(p, _)| *p == pin)
            .map(|(_, level)| *level)
            .collect()
    }
}

impl DigitalIo for MockIo {
    fn read_pin(&mut self, pin: u8) -> bool {
        self.levels.get(&pin).copied().unwrap_or(false)
    }

    fn write_pin(&mut self, pin: u8, high: bool) {
        self.writes.push((pin, high));
    }

    fn digital_input(&mut self, index: u8) -> bool {
        self.digital[index as usize]
    }

    fn analog_input(&mut self, index: u8) -> u16 {
        self.analog[index as usize]
    }

    fn set_output(&mut self, index: u8, high: bool) {
        self.outputs[index as usize] = high;
    }
}

#[derive(Debug, Default)]
pub struct MockTransceiver {
    pub modes: Vec<SingleWireMode>,
}

impl MockTransceiver {
    pub fn current(&self) -> Option<SingleWireMode> {
        self.modes.last().copied()
    }
}

impl SingleWireTransceiver for MockTransceiver {
    fn set_mode(&mut self, mode: SingleWireMode) {
        self.modes.push(mode);
    }
}

#[derive(Debug)]
/// Manually advanced clock; `delay` moves time forward and is recorded.
pub struct MockClock {
    pub now: Instant,
    pub delays: Vec<Duration>,
}

impl Default for MockClock {
    fn default() -> Self {
        Self {
            now: Instant::from_millis(1),
            delays: Vec::new(),
        }
    }
}

impl MockClock {
    pub fn advance(&mut self, duration: Duration) {
        self.now += duration;
    }
}

impl Clock for MockClock {
    fn now(&self) -> Instant {
        self.now
    }

    fn delay(&mut self, duration: Duration) {
        self.delays.push(duration);
        self.now += duration;
    }
}

#[derive(Debug, Default)]
pub struct MockConsole {
    pub bytes: Vec<u8>,
}

impl Console for MockConsole {
    fn receive_byte(&mut self, byte: u8) {
        self.bytes.push(byte);
    }
}

/// Timer based on `tokio::time::sleep` to pace `Bridge::run` in tests.
pub struct MockTimer;

impl LoopTimer for MockTimer {
    async fn delay(&mut self, duration: Duration) {
        tokio::time::sleep(std::time::Duration::from_micros(duration.as_micros())).await;
    }
}

//==================================================================================PLATFORM
pub struct TestPlatform;

impl Platform for TestPlatform {
    type Bus = MockBus;
    type SingleWire = MockBus;
    type Transceiver = MockTransceiver;
    type Link = MockLink;
    type Store = MockStore;
    type Sink = MockSink;
    type Io = MockIo;
    type Clock = MockClock;
    type Console = MockConsole;
}

/// Fresh collaborators over `store`, with a mounted sink.
pub fn peripherals(store: MockStore) -> Peripherals<TestPlatform> {
    Peripherals {
        can0: MockBus::default(),
        can1: MockBus::default(),
        single_wire: MockBus::default(),
        transceiver: MockTransceiver::default(),
        link: MockLink::default(),
        store,
        sink: Some(MockSink::default()),
        io: MockIo::default(),
        clock: MockClock::default(),
        console: MockConsole::default(),
    }
}

/// Bridge on erased storage (factory settings).
pub fn factory_bridge() -> Bridge<TestPlatform> {
    Bridge::new(peripherals(MockStore::default()), BridgeConfig::default())
}

/// Bridge over pre-populated storage.
pub fn bridge_with(store: MockStore, config: BridgeConfig) -> Bridge<TestPlatform> {
    Bridge::new(peripherals(store), config)
}

/// Frame as a bus driver would deliver it.
pub fn frame(id: u32, extended: bool, data: &[u8]) -> Frame {
    Frame::new(id, extended, data).unwrap()
}

/// BUILD_CAN_FRAME command bytes with a correct checksum.
pub fn build_frame_command(opcode: u8, wire_id: u32, bus: u8, data: &[u8]) -> Vec<u8> {
    let mut payload = Vec::new();
    payload.extend_from_slice(&wire_id.to_le_bytes());
    payload.push(bus);
    payload.push(data.len() as u8);
    payload.extend_from_slice(data);
    let checksum = payload.iter().fold(0u8, |acc, b| acc ^ b);
    let mut bytes = vec![0xF1, opcode];
    bytes.extend_from_slice(&payload);
    bytes.push(checksum);
    bytes
}
