//! Persisted records across bridge restarts.
mod helpers;

use gvret_bridge::bridge::BridgeConfig;
use gvret_bridge::protocol::transport::can_frame::BusIndex;
use gvret_bridge::protocol::transport::traits::storage::RecordTag;
use gvret_bridge::settings::record::{decode, SETTINGS_VERSION};
use gvret_bridge::settings::{
    CommMode, DigitalToggleRule, FileOutputFormat, LogLevel, Settings, ToggleMode,
};
use helpers::{bridge_with, factory_bridge, MockStore};

#[test]
fn test_factory_boot() {
    // Erased storage boots on factory values and writes both records back.
    let bridge = factory_bridge();
    let settings = bridge.settings();
    assert_eq!(*settings, Settings::factory());
    assert!(settings.bus(BusIndex::Can0).enabled);
    assert_eq!(settings.bus(BusIndex::Can1).speed, 500_000);
    assert!(!settings.single_wire_enabled());
    assert_eq!(settings.file_format, FileOutputFormat::Gvret);
    assert_eq!(settings.log_level, LogLevel::Warning);
    assert_eq!(*bridge.toggle_rule(), DigitalToggleRule::factory());

    let hw = bridge.peripherals();
    assert_eq!(hw.store.writes, [RecordTag::Settings, RecordTag::DigitalToggle]);
    assert_eq!(hw.store.settings[0], SETTINGS_VERSION);
    assert_eq!(hw.can0.speed, Some(500_000));
    assert!(hw.can0.enabled && hw.can1.enabled);
}

#[test]
fn test_stored_records_used() {
    // Valid stored records are used as-is and not rewritten.
    let mut settings = Settings::factory();
    settings.bus_mut(BusIndex::Can1).speed = 125_000;
    settings.bus_mut(BusIndex::Can1).listen_only = true;
    settings.comm_mode = CommMode::Binary;
    let rule = DigitalToggleRule {
        enabled: true,
        mode: ToggleMode(0x03),
        pin: 4,
        id: 0x222,
        len: 1,
        payload: [0x5A, 0, 0, 0, 0, 0, 0, 0],
    };
    let store = MockStore::default()
        .with_record(&settings)
        .with_record(&rule);
    let bridge = bridge_with(store, BridgeConfig::default());

    assert_eq!(*bridge.settings(), settings);
    assert_eq!(*bridge.toggle_rule(), rule);
    let hw = bridge.peripherals();
    assert!(hw.store.writes.is_empty());
    assert_eq!(hw.can1.speed, Some(125_000));
    assert!(hw.can1.listen_only);
}

#[test]
fn test_version_mismatch_resets() {
    // A record from another layout revision is replaced wholesale.
    let mut settings = Settings::factory();
    settings.bus_mut(BusIndex::Can0).speed = 250_000;
    let mut store = MockStore::default().with_record(&settings);
    store.settings[0] = SETTINGS_VERSION - 1;

    let bridge = bridge_with(store, BridgeConfig::default());
    assert_eq!(*bridge.settings(), Settings::factory());
    let stored: Settings = decode(&bridge.peripherals().store.settings).unwrap();
    assert_eq!(stored, Settings::factory());
}

#[test]
fn test_toggle_resets_independently() {
    // The toggle record resets on its own without touching valid settings.
    let mut settings = Settings::factory();
    settings.auto_start_logging = true;
    let store = MockStore::default().with_record(&settings);
    let bridge = bridge_with(store, BridgeConfig::default());
    assert!(bridge.settings().auto_start_logging);
    assert_eq!(
        bridge.peripherals().store.writes,
        [RecordTag::DigitalToggle]
    );
}

#[test]
fn test_commands_persist_across_restart() {
    // Mutating commands survive a restart; the binary-mode switch alone does not.
    let mut bridge = factory_bridge();
    bridge.peripherals_mut().link.feed(&[0xE7]);
    bridge.poll();
    assert_eq!(bridge.settings().comm_mode, CommMode::Binary);
    let restarted = bridge_with(bridge.peripherals().store.clone(), BridgeConfig::default());
    assert_eq!(restarted.settings().comm_mode, CommMode::Ascii);

    let mut bridge = factory_bridge();
    bridge.peripherals_mut().link.feed(&[0xF1, 0x08, 0x10]);
    bridge.poll();
    let restarted = bridge_with(bridge.peripherals().store.clone(), BridgeConfig::default());
    assert!(restarted.settings().single_wire_enabled());
}
