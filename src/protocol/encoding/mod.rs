//! Frame serializers: the host link formats and the log file formats.
pub mod file;
pub mod host;
