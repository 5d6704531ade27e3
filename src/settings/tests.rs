//! Settings model, profiles, and record persistence.
extern crate std;
use std::vec::Vec;

use super::profile::SystemProfile;
use super::record::{
    decode, encode, load_record, store_record, LoadOutcome, Record, RECORD_BUFFER_SIZE,
    SETTINGS_VERSION,
};
use super::*;
use crate::error::RecordError;
use crate::protocol::transport::traits::storage::{Persistence, RecordTag};

/// In-memory page store; pages start erased (`0xFF`).
struct PageStore {
    settings: Vec<u8>,
    toggle: Vec<u8>,
    writes: Vec<RecordTag>,
    fail_reads: bool,
}

impl PageStore {
    fn erased() -> Self {
        Self {
            settings: std::vec![0xFF; RECORD_BUFFER_SIZE],
            toggle: std::vec![0xFF; RECORD_BUFFER_SIZE],
            writes: Vec::new(),
            fail_reads: false,
        }
    }

    fn page(&mut self, tag: RecordTag) -> &mut Vec<u8> {
        match tag {
            RecordTag::Settings => &mut self.settings,
            RecordTag::DigitalToggle => &mut self.toggle,
        }
    }
}

impl Persistence for PageStore {
    type Error = ();

    fn read_record(&mut self, tag: RecordTag, buf: &mut [u8]) -> Result<usize, ()> {
        if self.fail_reads {
            return Err(());
        }
        let page = self.page(tag);
        let len = buf.len().min(page.len());
        buf[..len].copy_from_slice(&page[..len]);
        Ok(len)
    }

    fn write_record(&mut self, tag: RecordTag, bytes: &[u8]) -> Result<(), ()> {
        self.writes.push(tag);
        let page = self.page(tag);
        page.clear();
        page.extend_from_slice(bytes);
        Ok(())
    }
}

#[test]
/// Factory settings match the documented defaults.
fn test_factory_settings() {
    let settings = Settings::factory();
    let can0 = settings.bus(BusIndex::Can0);
    let can1 = settings.bus(BusIndex::Can1);
    let sw = settings.bus(BusIndex::SingleWire);
    assert!(can0.enabled && can1.enabled);
    assert_eq!((can0.speed, can1.speed), (500_000, 500_000));
    assert!(!sw.enabled);
    assert_eq!(sw.speed, 33_333);
    assert_eq!(can0.filters, Filter::promiscuous_set());
    assert_eq!(settings.file_format, FileOutputFormat::Gvret);
    assert_eq!(settings.log_level, LogLevel::Warning);
    assert_eq!(settings.comm_mode, CommMode::Ascii);
    assert_eq!(settings.file_naming.file_name().as_str(), "CANBUS1.TXT");
}

#[test]
/// Threshold semantics of the console level.
fn test_log_level_allows() {
    assert!(LogLevel::Warning.allows(LogLevel::Error));
    assert!(LogLevel::Warning.allows(LogLevel::Warning));
    assert!(!LogLevel::Warning.allows(LogLevel::Info));
    assert!(LogLevel::Debug.allows(LogLevel::Debug));
    assert!(!LogLevel::Off.allows(LogLevel::Error));
}

#[test]
/// Only the v2.2 board has a dedicated single-wire controller.
fn test_system_profiles() {
    let due = SystemProfile::from(SystemType::CanDue);
    assert!(!due.dedicated_single_wire);
    assert_eq!(due.rx_led_pin, 72);
    assert_eq!(due.bus_count, 2);

    let gevcu = SystemProfile::from(SystemType::Gevcu);
    assert!(!gevcu.storage_available);
    assert!(!gevcu.single_wire_transceiver);

    let v22 = SystemProfile::from(SystemType::CanDue22);
    assert!(v22.dedicated_single_wire);
    assert_eq!(v22.bus_count, 3);
    assert_eq!((v22.pass_0to1_pin, v22.pass_1to0_pin), (11, 12));

    assert_eq!(SystemType::from_u8(9), SystemType::CanDue);
}

#[test]
/// Toggle mode bits.
fn test_toggle_mode_bits() {
    let mode = ToggleMode(0x83);
    assert!(mode.can_to_pin());
    assert!(mode.includes(BusIndex::Can0));
    assert!(!mode.includes(BusIndex::Can1));
    assert!(!mode.includes(BusIndex::SingleWire));
    assert!(mode.idle_low());
}

#[test]
/// Both layouts fit the scratch buffer.
fn test_record_sizes() {
    assert!(Settings::LEN <= RECORD_BUFFER_SIZE);
    assert_eq!(Settings::LEN, 251);
    assert_eq!(DigitalToggleRule::LEN, 17);
}

#[test]
/// A customized settings record survives save and load.
fn test_settings_round_trip() {
    let mut settings = Settings::factory();
    settings.bus_mut(BusIndex::Can0).speed = 250_000;
    settings.bus_mut(BusIndex::Can1).listen_only = true;
    settings.bus_mut(BusIndex::SingleWire).enabled = true;
    settings.buses[0].filters[4] = Filter {
        id: 0x7E8,
        mask: 0x7FF,
        extended: false,
        enabled: true,
    };
    settings.comm_mode = CommMode::Binary;
    settings.file_format = FileOutputFormat::Crtd;
    settings.file_naming.base.clear();
    settings.file_naming.base.push_str("TRIP").unwrap();
    settings.file_naming.number = 42;
    settings.file_naming.append = true;
    settings.auto_start_logging = true;
    settings.system_type = SystemType::CanDue22;
    settings.valid = 0xBEEF;

    let mut buf = [0u8; RECORD_BUFFER_SIZE];
    let len = encode(&settings, &mut buf).unwrap();
    assert_eq!(len, Settings::LEN);
    assert_eq!(buf[0], SETTINGS_VERSION);
    let decoded: Settings = decode(&buf[..len]).unwrap();
    assert_eq!(decoded, settings);
    assert_eq!(decoded.file_naming.file_name().as_str(), "TRIP42.TXT");
}

#[test]
/// Erased storage resets both records and writes them back.
fn test_load_erased_storage_resets() {
    let mut store = PageStore::erased();
    let (settings, outcome): (Settings, _) = load_record(&mut store);
    assert_eq!(outcome, LoadOutcome::FactoryReset);
    assert_eq!(settings, Settings::factory());

    let (rule, outcome): (DigitalToggleRule, _) = load_record(&mut store);
    assert_eq!(outcome, LoadOutcome::FactoryReset);
    assert_eq!(rule, DigitalToggleRule::factory());
    assert_eq!(store.writes, [RecordTag::Settings, RecordTag::DigitalToggle]);

    // Second boot reads the persisted defaults.
    let (_, outcome): (Settings, _) = load_record(&mut store);
    assert_eq!(outcome, LoadOutcome::Stored);
    assert_eq!(store.writes.len(), 2);
}

#[test]
/// A stale version byte invalidates the whole record, even with sane fields.
fn test_load_version_mismatch_resets() {
    let mut store = PageStore::erased();
    let mut settings = Settings::factory();
    settings.bus_mut(BusIndex::Can0).speed = 125_000;
    store_record(&settings, &mut store).unwrap();
    store.settings[0] = SETTINGS_VERSION - 1;

    let (loaded, outcome): (Settings, _) = load_record(&mut store);
    assert_eq!(outcome, LoadOutcome::FactoryReset);
    assert_eq!(loaded.bus(BusIndex::Can0).speed, 500_000);
    assert_eq!(store.settings[0], SETTINGS_VERSION);
}

#[test]
/// Toggle rule resets independently of a valid settings record.
fn test_toggle_resets_independently() {
    let mut store = PageStore::erased();
    store_record(&Settings::factory(), &mut store).unwrap();
    store.writes.clear();

    let (_, settings_outcome): (Settings, _) = load_record(&mut store);
    let (_, toggle_outcome): (DigitalToggleRule, _) = load_record(&mut store);
    assert_eq!(settings_outcome, LoadOutcome::Stored);
    assert_eq!(toggle_outcome, LoadOutcome::FactoryReset);
    assert_eq!(store.writes, [RecordTag::DigitalToggle]);
}

#[test]
/// Toggle rule round trip and out-of-range length rejection.
fn test_toggle_rule_record() {
    let rule = DigitalToggleRule {
        enabled: true,
        mode: ToggleMode(0x05),
        pin: 7,
        id: 0x18FF_0001,
        len: 2,
        payload: [0xAA, 0x55, 0, 0, 0, 0, 0, 0],
    };
    let mut buf = [0u8; RECORD_BUFFER_SIZE];
    let len = encode(&rule, &mut buf).unwrap();
    assert_eq!(decode::<DigitalToggleRule>(&buf[..len]).unwrap(), rule);

    buf[8] = 9;
    assert!(matches!(
        decode::<DigitalToggleRule>(&buf[..len]),
        Err(RecordError::InvalidField { field: "toggle_len" })
    ));
}

#[test]
/// Short reads and read failures fall back to defaults.
fn test_load_failures() {
    let mut buf = [0u8; RECORD_BUFFER_SIZE];
    let len = encode(&Settings::factory(), &mut buf).unwrap();
    assert!(matches!(
        decode::<Settings>(&buf[..len - 1]),
        Err(RecordError::Truncated { .. })
    ));

    let mut store = PageStore::erased();
    store.fail_reads = true;
    let (settings, outcome): (Settings, _) = load_record(&mut store);
    assert_eq!(outcome, LoadOutcome::FactoryReset);
    assert_eq!(settings, Settings::factory());
}
