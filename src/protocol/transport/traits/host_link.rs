//! Serial/USB link to the host tool, plus the interactive console that
//! receives every byte the command engine does not claim.

/// Byte-oriented, non-blocking host link.
pub trait HostLink {
    type Error: core::fmt::Debug;
    /// Next received byte, if any.
    fn read_byte(&mut self) -> Option<u8>;
    /// Write `bytes` to the host.
    fn write(&mut self, bytes: &[u8]) -> Result<(), Self::Error>;
}

/// Text console fed with stray bytes seen while the engine is idle.
pub trait Console {
    fn receive_byte(&mut self, byte: u8);
}
