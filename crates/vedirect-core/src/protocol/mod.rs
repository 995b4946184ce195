//! VE.Direct Text Protocol
//!
//! Reads the line-oriented VE.Direct text protocol that Victron battery
//! monitors and charge controllers emit once per second.
//!
//! Every field arrives as `<label>\t<value>\r\n`. The reader extracts a single
//! requested field per call by scanning the live stream; checksums and the
//! binary HEX protocol are not interpreted.

mod diagnostics;
mod error;
mod fields;
mod line;
mod reader;
pub mod serial;
pub mod stream;

pub use diagnostics::{DiagnosticsSink, TracingSink};
pub use error::ReadError;
pub use fields::{FieldId, LABEL_TABLE};
pub use line::{decode_value, split_line, LineBuffer};
pub use reader::{ProtocolReader, ScanStats};
pub use serial::{clear_buffers, configure_port, list_ports, open_port, PortInfo};
pub use stream::{MemoryChannel, SerialChannel, Transport};

/// Fixed baud rate of the VE.Direct text protocol
pub const VED_BAUD_RATE: u32 = 19200;

/// Default line buffer capacity in bytes
pub const DEFAULT_LINE_CAPACITY: usize = 30;

/// Largest accepted line buffer capacity in bytes
pub const MAX_LINE_CAPACITY: usize = 4096;

/// Default number of raw byte-read attempts per line
pub const DEFAULT_MAX_READ_LOOPS: u32 = 60_000;

/// Default number of non-matching lines scanned before giving up
pub const DEFAULT_MAX_READ_LINES: u32 = 50;

/// Default liveness timeout in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

/// Delay between opening the link and probing it for data
pub const DEFAULT_SETTLE_DELAY_MS: u64 = 500;

/// Sleep between availability polls while the link is quiet
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1;
