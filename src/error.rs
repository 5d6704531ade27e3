//! Error definitions shared across library modules.
//! Each type models one failure family (record codec, frame construction,
//! encoder output, bus transmission). None of them is fatal for the bridge:
//! callers log and degrade.
use thiserror_no_std::Error;

//==================================================================================FRAME_ERROR
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
/// Errors raised while building a [`Frame`](crate::protocol::transport::can_frame::Frame).
pub enum FrameError {
    /// Classic CAN carries at most eight payload bytes.
    #[error("Invalid payload length: {len}")]
    InvalidLength { len: usize },
    /// Identifier does not fit the requested width (11 or 29 bits).
    #[error("Identifier {id:#x} out of range (extended: {extended})")]
    InvalidId { id: u32, extended: bool },
}

//==================================================================================RECORD_ERROR
#[derive(Error, Debug)]
/// Failures while loading or storing a persisted record.
pub enum RecordError {
    /// The persistence collaborator refused the read or write.
    #[error("Persistence access failed")]
    Storage,
    /// Stored record was written by another layout revision (or never written).
    #[error("Record version mismatch -> expected: {expected}, found: {found}")]
    VersionMismatch { expected: u8, found: u8 },
    /// Stored bytes are shorter than the record layout.
    #[error("Truncated record -> expected: {expected}, available: {available}")]
    Truncated { expected: usize, available: usize },
    /// A field holds a value the layout cannot represent.
    #[error("Invalid value for field {field}")]
    InvalidField { field: &'static str },
    /// Bit-level read failed.
    #[error(transparent)]
    Read(#[from] BitReaderError),
    /// Bit-level write failed.
    #[error(transparent)]
    Write(#[from] BitWriterError),
}

//==================================================================================ENCODE_ERROR
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
/// Failures while serializing a frame or a response.
pub enum EncodeError {
    /// Output buffer cannot hold the record.
    #[error("Output buffer full")]
    BufferFull,
    /// Text line exceeded its fixed capacity.
    #[error("Text line overflow")]
    LineOverflow,
}

#[derive(Error, Debug)]
/// Errors returned when pushing encoded bytes to a collaborator
/// (host link or file sink).
pub enum OutputError<E: core::fmt::Debug> {
    /// The collaborator rejected the write.
    #[error("Output write failed: {0:?}")]
    Io(E),
    /// The record could not be encoded.
    #[error(transparent)]
    Encode(#[from] EncodeError),
}

//==================================================================================TRANSMIT_ERROR
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
/// A bus driver refused to send a frame. The driver-specific error is logged
/// at the call site; only the bus index travels further.
pub enum TransmitError {
    #[error("Bus {bus} rejected the frame")]
    Rejected { bus: u8 },
}

//==================================================================================BITREADER_ERRORS
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
/// Errors raised while reading a bit-packed record.
pub enum BitReaderError {
    /// Attempted to read past the end of the buffer.
    #[error("Attempted to read out of bounds -> asked: {asked}, available: {available}")]
    OutOfBounds { asked: usize, available: usize },
    /// Requested more bits than the target type can hold.
    #[error("Cannot read more than {max} bits. Requested: {asked}")]
    TooLongForType { max: u8, asked: u8 },
    /// Cursor is not aligned on a byte boundary when required.
    #[error("Non aligned bit. Cursor: {cursor}")]
    NonAlignedBit { cursor: usize },
}
//==================================================================================BITWRITER_ERRORS
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
/// Errors raised while writing a bit-packed record.
pub enum BitWriterError {
    /// Attempted to write beyond the provided capacity.
    #[error("Attempted to write out of bounds -> asked: {asked}, available: {available}")]
    OutOfBounds { asked: usize, available: usize },
    /// Field is too large for the provided type.
    #[error("Cannot write more than {max} bits. Requested: {asked}")]
    TooLongForType { max: u8, asked: u8 },
    /// Cursor is not aligned on a byte boundary when the operation requires it.
    #[error("Non aligned bit. Cursor: {cursor}")]
    NonAlignedBit { cursor: usize },
}
