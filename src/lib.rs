//! `gvret-bridge` library: the core of a GVRET-compatible CAN bridge in a
//! `no_std` environment. The crate exposes the infrastructure modules (bit
//! codec, checksum, text formatting), the protocol logic (host command engine,
//! frame routing, host/file encoders, digital toggle), the persisted settings
//! model, and the [`bridge::Bridge`] loop that ties them to the hardware traits.
#![no_std]
//==================================================================================
/// Main loop: owns the collaborators, routes frames, and dispatches host commands.
pub mod bridge;
/// Domain and low-level errors (record codec, encoders, bus transmission).
pub mod error;
/// Byte and bit level helpers shared by the protocol layers.
pub mod infra;
/// GVRET protocol implementation: command engine, encoders, routing, toggle,
/// and the CAN transport abstractions.
pub mod protocol;
/// Versioned persisted configuration and hardware profiles.
pub mod settings;
//==================================================================================
