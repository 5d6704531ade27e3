//! Log file encoder. Each frame becomes one self-contained record handed to
//! the [`FileSink`] in a single write; file lifecycle belongs to the sink.
use embassy_time::Instant;
use heapless::Vec;

use crate::error::{EncodeError, OutputError};
use crate::infra::codec::text::{push_fmt, HexBytes, HexCase, TextLine, TEXT_LINE_CAPACITY};
use crate::protocol::transport::can_frame::Frame;
use crate::protocol::transport::traits::storage::FileSink;
use crate::settings::FileOutputFormat;

/// Largest file record (text formats dominate).
pub const FILE_RECORD_CAPACITY: usize = TEXT_LINE_CAPACITY;

pub type FileRecord = Vec<u8, FILE_RECORD_CAPACITY>;

/// Encode `frame` in `format`. [`FileOutputFormat::None`] yields an empty record.
///
/// * raw binary: `ts(4) id(4) len|bus<<4 data` (capture timestamp, no delimiter)
/// * GVRET: `millis,id,ext,bus,len[,byte]*\r\n`
/// * CRTD: `secs.micros R11|R29 id[ byte]*\r\n`
///
/// Text formats use lower-case unpadded hex and the clock time `now`.
pub fn encode_record(
    format: FileOutputFormat,
    frame: &Frame,
    now: Instant,
) -> Result<FileRecord, EncodeError> {
    let mut record = FileRecord::new();
    match format {
        FileOutputFormat::None => {}
        FileOutputFormat::RawBinary => {
            let len_bus = frame.len() as u8 | (frame.bus() as u8) << 4;
            let fields: [&[u8]; 4] = [
                &frame.timestamp_us().to_le_bytes(),
                &frame.wire_id().to_le_bytes(),
                &[len_bus],
                frame.data(),
            ];
            for field in fields {
                record
                    .extend_from_slice(field)
                    .map_err(|_| EncodeError::BufferFull)?;
            }
        }
        FileOutputFormat::Gvret => {
            let mut line = TextLine::new();
            push_fmt(
                &mut line,
                format_args!(
                    "{},{:x},{},{},{}{}\r\n",
                    now.as_millis(),
                    frame.id(),
                    frame.is_extended() as u8,
                    frame.bus() as u8,
                    frame.len(),
                    HexBytes::prefixed(frame.data(), ",", HexCase::Lower)
                ),
            )?;
            extend_line(&mut record, &line)?;
        }
        FileOutputFormat::Crtd => {
            let millis = now.as_millis();
            let mut line = TextLine::new();
            push_fmt(
                &mut line,
                format_args!(
                    "{}.{:06} R{} {:x}{}\r\n",
                    millis / 1000,
                    (millis % 1000) * 1000,
                    if frame.is_extended() { 29 } else { 11 },
                    frame.id(),
                    HexBytes::prefixed(frame.data(), " ", HexCase::Lower)
                ),
            )?;
            extend_line(&mut record, &line)?;
        }
    }
    Ok(record)
}

fn extend_line(record: &mut FileRecord, line: &TextLine) -> Result<(), EncodeError> {
    record
        .extend_from_slice(line.as_bytes())
        .map_err(|_| EncodeError::BufferFull)
}

//==================================================================================FILE_ENCODER
/// File logging switch plus the encoding step.
#[derive(Debug, Default)]
pub struct FileEncoder {
    active: bool,
}

impl FileEncoder {
    pub const fn new() -> Self {
        Self { active: false }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    /// Append `frame` to the sink when logging is active. A sink failure
    /// stops logging until it is switched on again.
    pub fn log<S: FileSink>(
        &mut self,
        format: FileOutputFormat,
        frame: &Frame,
        now: Instant,
        sink: &mut S,
    ) -> Result<(), OutputError<S::Error>> {
        if !self.active || format == FileOutputFormat::None {
            return Ok(());
        }
        let record = encode_record(format, frame, now)?;
        if let Err(err) = sink.write_bytes(&record) {
            #[cfg(feature = "defmt")]
            defmt::error!(
                "Log file write failed, logging stopped: {}",
                defmt::Debug2Format(&err)
            );
            self.active = false;
            return Err(OutputError::Io(err));
        }
        Ok(())
    }
}
