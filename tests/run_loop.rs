//! The async loop keeps serving the host until cancelled.
mod helpers;

use std::time::Duration;

use helpers::{factory_bridge, MockTimer};

#[tokio::test]
async fn test_run_answers_keepalive() {
    // Keepalive answered while `run` spins.
    let mut bridge = factory_bridge();
    bridge.peripherals_mut().link.feed(&[0xF1, 0x09]);
    let mut timer = MockTimer;

    let result = tokio::time::timeout(Duration::from_millis(20), bridge.run(&mut timer)).await;
    assert!(result.is_err());
    assert_eq!(
        bridge.peripherals_mut().link.drain(),
        [0xF1, 0x09, 0xDE, 0xAD]
    );
}
