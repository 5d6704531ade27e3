//! GVRET protocol components: host command engine, frame encoders, frame
//! routing, digital toggle, and the CAN transport abstractions.
pub mod command;
pub mod encoding;
pub mod routing;
pub mod toggle;
pub mod transport;
