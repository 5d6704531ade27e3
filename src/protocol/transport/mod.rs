//! CAN transport layer: frame and identifier representations, collaborator
//! traits, the queued bus adapter, and the timing constants of the host link.
//!
//! ## Host link timing
//!
//! Binary frame records are buffered and pushed to the host in batches. The
//! constants below bound how long a record may sit in the buffer and how much
//! host input one loop iteration may consume.

pub mod can_frame;
pub mod can_id;
pub mod queue;
pub mod traits;

use embassy_time::Duration;

/// Capacity of the binary host output buffer (bytes).
pub const SERIAL_BUFFER_SIZE: usize = 4096;

/// Minimum spacing between two host buffer flushes.
///
/// A flush happens on the first loop iteration after this interval has elapsed
/// since the previous one, and only when the buffer holds data.
pub const FLUSH_INTERVAL: Duration = Duration::from_micros(2000);

/// Host bytes fed to the command engine per loop iteration, so that a busy
/// link cannot starve frame routing.
pub const MAX_BYTES_PER_POLL: usize = 128;

/// Firmware build number reported by GET_DEV_INFO.
pub const BUILD_NUMBER: u16 = 343;
