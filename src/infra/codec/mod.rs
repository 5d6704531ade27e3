//! Low-level encoders used by records, host commands, and log output.
pub mod bits;
pub mod checksum;
pub mod text;
