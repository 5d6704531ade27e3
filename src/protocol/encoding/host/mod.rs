//! Host link encoder.
//!
//! Three mutually exclusive formats:
//! * binary GVRET records, appended to a bounded output buffer and flushed on
//!   a timer (never mid-record);
//! * LAWICEL text (`t`/`T` lines terminated by `\r`);
//! * human-readable debug lines.
//!
//! Text formats bypass the buffer and are written to the link directly, after
//! any binary records still buffered from an earlier mode.
//! Buffer backpressure is block-producer: a record that would not fit forces a
//! synchronous flush first, so records are never split or dropped.
use embassy_time::Instant;
use heapless::Vec;

use crate::error::{EncodeError, OutputError};
use crate::infra::codec::text::{push_fmt, HexBytes, HexCase, TextLine};
use crate::protocol::command::SYNC_BYTE;
use crate::protocol::transport::can_frame::{Frame, MAX_DATA_LEN};
use crate::protocol::transport::traits::host_link::HostLink;
use crate::protocol::transport::{FLUSH_INTERVAL, SERIAL_BUFFER_SIZE};
use crate::settings::CommMode;

/// Sync, subtype, timestamp, id, length/bus, payload, checksum field.
pub const BINARY_RECORD_MAX: usize = 2 + 4 + 4 + 1 + MAX_DATA_LEN + 1;

//==================================================================================MODE
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Runtime LAWICEL switches (not persisted).
pub struct LawicelConfig {
    pub enabled: bool,
    /// Append the 16-bit millisecond timestamp to every line.
    pub timestamping: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HostMode {
    Binary,
    Lawicel { timestamping: bool },
    Debug,
}

impl HostMode {
    /// LAWICEL wins when enabled; otherwise the persisted comm mode decides.
    pub fn select(comm_mode: CommMode, lawicel: LawicelConfig) -> Self {
        if lawicel.enabled {
            HostMode::Lawicel {
                timestamping: lawicel.timestamping,
            }
        } else if comm_mode == CommMode::Binary {
            HostMode::Binary
        } else {
            HostMode::Debug
        }
    }
}

//==================================================================================ENCODERS
/// `F1 00 ts(4) id(4) len|bus<<4 data 00`, using the capture timestamp.
pub fn encode_binary_record(frame: &Frame) -> Vec<u8, BINARY_RECORD_MAX> {
    let mut record = Vec::new();
    // BINARY_RECORD_MAX covers the largest frame.
    let _ = record.extend_from_slice(&[SYNC_BYTE, 0x00]);
    let _ = record.extend_from_slice(&frame.timestamp_us().to_le_bytes());
    let _ = record.extend_from_slice(&frame.wire_id().to_le_bytes());
    let _ = record.push(frame.len() as u8 | (frame.bus() as u8) << 4);
    let _ = record.extend_from_slice(frame.data());
    let _ = record.push(0);
    record
}

/// `t1232ABCD\r` / `T000012342ABCD\r`, optionally followed by four hex
/// timestamp digits before the carriage return.
pub fn encode_lawicel(frame: &Frame, timestamp: Option<u16>) -> Result<TextLine, EncodeError> {
    let mut line = TextLine::new();
    if frame.is_extended() {
        push_fmt(&mut line, format_args!("T{:08X}", frame.id()))?;
    } else {
        push_fmt(&mut line, format_args!("t{:03X}", frame.id()))?;
    }
    push_fmt(
        &mut line,
        format_args!(
            "{}{}",
            frame.len(),
            HexBytes::packed(frame.data(), HexCase::Upper)
        ),
    )?;
    if let Some(timestamp) = timestamp {
        push_fmt(&mut line, format_args!("{:04X}", timestamp))?;
    }
    push_fmt(&mut line, format_args!("\r"))?;
    Ok(line)
}

/// `<micros> - <id> <X|S> <bus> <len>[ <byte>]*\r\n`.
pub fn encode_debug(frame: &Frame) -> Result<TextLine, EncodeError> {
    let mut line = TextLine::new();
    push_fmt(
        &mut line,
        format_args!(
            "{} - {:X} {} {} {}{}\r\n",
            frame.timestamp_us(),
            frame.id(),
            if frame.is_extended() { 'X' } else { 'S' },
            frame.bus() as u8,
            frame.len(),
            HexBytes::prefixed(frame.data(), " ", HexCase::Upper)
        ),
    )?;
    Ok(line)
}

//==================================================================================HOST_ENCODER
/// Host output path with the binary record buffer.
pub struct HostEncoder {
    buffer: Vec<u8, SERIAL_BUFFER_SIZE>,
    last_flush: Instant,
}

impl HostEncoder {
    pub fn new(now: Instant) -> Self {
        Self {
            buffer: Vec::new(),
            last_flush: now,
        }
    }

    /// Bytes waiting for the next flush.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Serialize `frame` for the host in `mode`.
    pub fn encode<L: HostLink>(
        &mut self,
        mode: HostMode,
        frame: &Frame,
        now: Instant,
        link: &mut L,
    ) -> Result<(), OutputError<L::Error>> {
        match mode {
            HostMode::Binary => {
                let record = encode_binary_record(frame);
                if self.buffer.capacity() - self.buffer.len() < record.len() {
                    #[cfg(feature = "defmt")]
                    defmt::debug!("Host buffer full, flushing {} bytes early", self.buffer.len());
                    self.flush(link).map_err(OutputError::Io)?;
                }
                self.buffer
                    .extend_from_slice(&record)
                    .map_err(|_| EncodeError::BufferFull)?;
            }
            HostMode::Lawicel { timestamping } => {
                let timestamp = timestamping.then(|| now.as_millis() as u16);
                let line = encode_lawicel(frame, timestamp)?;
                self.flush(link).map_err(OutputError::Io)?;
                link.write(line.as_bytes()).map_err(OutputError::Io)?;
            }
            HostMode::Debug => {
                let line = encode_debug(frame)?;
                self.flush(link).map_err(OutputError::Io)?;
                link.write(line.as_bytes()).map_err(OutputError::Io)?;
            }
        }
        Ok(())
    }

    /// Push the whole buffer to the link. The buffer is emptied even when
    /// the link rejects the write.
    pub fn flush<L: HostLink>(&mut self, link: &mut L) -> Result<(), L::Error> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        let result = link.write(&self.buffer);
        self.buffer.clear();
        result
    }

    /// Flush when [`FLUSH_INTERVAL`] has elapsed since the last timed flush
    /// and data is pending. Returns whether a flush happened.
    pub fn flush_if_due<L: HostLink>(
        &mut self,
        now: Instant,
        link: &mut L,
    ) -> Result<bool, L::Error> {
        if self.buffer.is_empty()
            || now.saturating_duration_since(self.last_flush) <= FLUSH_INTERVAL
        {
            return Ok(false);
        }
        self.last_flush = now;
        self.flush(link)?;
        Ok(true)
    }
}
