//! Frame construction tests.
use super::*;
use crate::protocol::transport::can_id::WireId;

#[test]
/// Validated constructor keeps payload and defaults bus/timestamp.
fn test_frame_new() {
    let frame = Frame::new(0x123, false, &[0xAB, 0xCD]).unwrap();
    assert_eq!(frame.id(), 0x123);
    assert!(!frame.is_extended());
    assert_eq!(frame.len(), 2);
    assert_eq!(frame.data(), &[0xAB, 0xCD]);
    assert_eq!(frame.bus(), BusIndex::Can0);
    assert_eq!(frame.timestamp_us(), 0);
}

#[test]
/// Oversized payloads and ids are refused.
fn test_frame_new_rejects() {
    assert_eq!(
        Frame::new(0x1, false, &[0; 9]),
        Err(FrameError::InvalidLength { len: 9 })
    );
    assert!(Frame::new(0x800, false, &[]).is_err());
    assert!(Frame::new(0x800, true, &[]).is_ok());
}

#[test]
/// Wire construction strips bit 31 and truncates long payloads.
fn test_frame_from_wire() {
    let frame = Frame::from_wire(WireId(0x8000_0700), &[1, 2, 3, 4, 5, 6, 7, 8, 9]);
    assert!(frame.is_extended());
    assert_eq!(frame.id(), 0x700);
    assert_eq!(frame.len(), 8);
    assert_eq!(frame.wire_id(), WireId(0x8000_0700));
}

#[test]
/// Builder helpers set bus and timestamp.
fn test_frame_builders() {
    let frame = Frame::new(0x10, false, &[])
        .unwrap()
        .with_bus(BusIndex::SingleWire)
        .with_timestamp(42);
    assert_eq!(frame.bus(), BusIndex::SingleWire);
    assert_eq!(frame.timestamp_us(), 42);
    assert!(frame.is_empty());
}

#[test]
/// Bus numbering and pass-through peers.
fn test_bus_index() {
    assert_eq!(BusIndex::from_index(2), Some(BusIndex::SingleWire));
    assert_eq!(BusIndex::from_index(3), None);
    assert_eq!(BusIndex::Can0.pass_through_peer(), Some(BusIndex::Can1));
    assert_eq!(BusIndex::Can1.pass_through_peer(), Some(BusIndex::Can0));
    assert_eq!(BusIndex::SingleWire.pass_through_peer(), None);
}

#[test]
/// `embedded_can::Frame` view of the same data.
fn test_embedded_can_frame() {
    let id = embedded_can::ExtendedId::new(0x18FF_1234).unwrap();
    let frame = <Frame as embedded_can::Frame>::new(id, &[0x01]).unwrap();
    assert!(embedded_can::Frame::is_extended(&frame));
    assert_eq!(embedded_can::Frame::dlc(&frame), 1);
    assert_eq!(
        embedded_can::Frame::id(&frame),
        embedded_can::Id::Extended(id)
    );
    assert!(<Frame as embedded_can::Frame>::new_remote(id, 0).is_none());

    // Wire ids wider than the declared width keep their low bits.
    let standard = Frame::from_wire(WireId(0x0000_0800), &[]);
    assert_eq!(
        embedded_can::Frame::id(&standard),
        embedded_can::Id::Standard(embedded_can::StandardId::ZERO)
    );
    let standard = Frame::from_wire(WireId(0x0000_0FA5), &[]);
    assert_eq!(
        embedded_can::Frame::id(&standard),
        embedded_can::Id::Standard(embedded_can::StandardId::new(0x7A5).unwrap())
    );
    let extended = Frame::from_wire(WireId(0xE000_0001), &[]);
    assert_eq!(
        embedded_can::Frame::id(&extended),
        embedded_can::Id::Extended(embedded_can::ExtendedId::new(1).unwrap())
    );
}
