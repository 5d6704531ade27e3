//! Infrastructure shared by the protocol layers: bit-packed record codec,
//! XOR checksum, and bounded text formatting.
pub mod codec;
