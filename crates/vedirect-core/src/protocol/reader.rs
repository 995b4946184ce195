//! Field reader
//!
//! Scans the live VE.Direct stream line by line until the requested label
//! shows up. Three budgets bound every scan:
//!
//! - the loop budget caps raw byte-read attempts per line,
//! - the line budget caps how many non-matching lines are discarded,
//! - the liveness timeout caps how long the link may stay quiet.

use std::thread;
use std::time::{Duration, Instant};

use super::{
    clear_buffers, configure_port, decode_value, open_port, split_line, DiagnosticsSink, FieldId, LineBuffer,
    ReadError, SerialChannel, TracingSink, Transport,
};
use crate::config::ReaderConfig;

/// How accumulation of a line ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineEnd {
    /// Newline seen
    Complete,
    /// Ran out of read attempts; the partial line is still compared
    LoopBudgetExhausted,
}

/// Counters from the most recent scan
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    /// Lines compared and thrown away (every line in dump mode)
    pub lines_discarded: u32,
    /// Bytes pulled off the transport, framing included
    pub bytes_read: usize,
    /// Lines that ended because the loop budget ran out
    pub inconclusive_lines: u32,
    /// Wall-clock duration of the scan
    pub elapsed: Duration,
}

/// Reads single VE.Direct fields from an exclusively owned transport
pub struct ProtocolReader<T: Transport> {
    transport: T,
    config: ReaderConfig,
    line: LineBuffer,
    last_scan: ScanStats,
}

impl ProtocolReader<SerialChannel> {
    /// Open `port_name`, configure it for VE.Direct and probe for a live device.
    ///
    /// Bytes queued before the port was opened are dropped so the probe only
    /// sees fresh data.
    pub fn connect(port_name: &str, config: ReaderConfig) -> Result<Self, ReadError> {
        let mut port = open_port(port_name, Some(config.baud_rate))?;
        configure_port(port.as_mut())?;
        clear_buffers(port.as_mut())?;

        let mut reader = Self::new(SerialChannel::new(port), config);
        reader.open()?;
        Ok(reader)
    }
}

impl<T: Transport> ProtocolReader<T> {
    /// Create a reader over `transport`. No I/O happens until `open` or a read.
    pub fn new(transport: T, config: ReaderConfig) -> Self {
        let line = LineBuffer::new(config.line_capacity);
        Self {
            transport,
            config,
            line,
            last_scan: ScanStats::default(),
        }
    }

    /// Create a reader with the default configuration
    pub fn with_defaults(transport: T) -> Self {
        Self::new(transport, ReaderConfig::default())
    }

    /// Active configuration
    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    /// Borrow the transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Mutably borrow the transport
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Give back the transport
    pub fn into_inner(self) -> T {
        self.transport
    }

    /// Counters from the most recent `read_field` or `dump`
    pub fn last_scan(&self) -> ScanStats {
        self.last_scan
    }

    /// One-shot liveness probe.
    ///
    /// Sets the protocol baud rate, waits the settle delay and succeeds when
    /// the device has sent something in the meantime. A later read can still
    /// time out.
    pub fn open(&mut self) -> Result<(), ReadError> {
        self.transport.set_baud_rate(self.config.baud_rate)?;
        if !self.transport.is_open() {
            return Err(ReadError::NotConnected);
        }

        thread::sleep(self.config.settle_delay());

        if self.transport.available()? {
            self.transport.flush()?;
            tracing::info!(baud_rate = self.config.baud_rate, "VE.Direct device responding");
            Ok(())
        } else {
            tracing::warn!(
                settle_ms = self.config.settle_delay_ms,
                "no data from VE.Direct device"
            );
            Err(ReadError::Silent {
                settle_ms: self.config.settle_delay_ms,
            })
        }
    }

    /// Read the current value of `target`.
    ///
    /// Returns the first occurrence of the label. `FieldId::Dump` logs every
    /// line through [`TracingSink`] and ends with `NotFound` once the line
    /// budget is spent.
    pub fn read_field(&mut self, target: FieldId) -> Result<i32, ReadError> {
        self.scan(target, &mut TracingSink)
    }

    /// Send every line seen within the line budget to `sink`.
    ///
    /// Returns the number of lines emitted.
    pub fn dump(&mut self, sink: &mut dyn DiagnosticsSink) -> Result<u32, ReadError> {
        match self.scan(FieldId::Dump, sink) {
            Ok(_) | Err(ReadError::NotFound { .. }) => Ok(self.last_scan.lines_discarded),
            Err(e) => Err(e),
        }
    }

    fn scan(&mut self, target: FieldId, sink: &mut dyn DiagnosticsSink) -> Result<i32, ReadError> {
        let start = Instant::now();
        let mut stats = ScanStats::default();
        let result = self.scan_lines(target, sink, &mut stats);
        stats.elapsed = start.elapsed();
        self.last_scan = stats;

        match &result {
            Ok(value) => tracing::debug!(
                field = %target,
                value,
                discarded = stats.lines_discarded,
                bytes = stats.bytes_read,
                "field read"
            ),
            Err(e) => tracing::debug!(
                field = %target,
                discarded = stats.lines_discarded,
                bytes = stats.bytes_read,
                "scan ended: {}",
                e
            ),
        }
        result
    }

    fn scan_lines(
        &mut self,
        target: FieldId,
        sink: &mut dyn DiagnosticsSink,
        stats: &mut ScanStats,
    ) -> Result<i32, ReadError> {
        let timeout = self.config.timeout();
        let mut lines = self.config.max_read_lines;
        let mut last_seen = Instant::now();
        self.line.clear();

        while lines > 0 {
            if !self.transport.available()? {
                let idle = last_seen.elapsed();
                if idle > timeout {
                    tracing::warn!(field = %target, idle_ms = idle.as_millis() as u64, "VE.Direct timeout");
                    return Err(ReadError::Timeout {
                        elapsed_ms: idle.as_millis() as u64,
                    });
                }
                thread::sleep(self.config.poll_interval());
                continue;
            }

            if self.accumulate_line(stats)? == LineEnd::LoopBudgetExhausted {
                stats.inconclusive_lines += 1;
                tracing::debug!(
                    len = self.line.len(),
                    partial = %self.line.to_text(),
                    "loop budget exhausted mid-line"
                );
            }

            if target.is_dump() {
                sink.emit_line(&self.line.to_text());
            } else {
                let (label, value) = split_line(self.line.as_bytes());
                if label == Some(target.label().as_bytes()) {
                    return decode_value(target, value).map_err(|e| {
                        tracing::warn!(field = %target, "{}", e);
                        e
                    });
                }
            }

            tracing::debug!(line = %self.line.to_text(), "discarding line");
            lines -= 1;
            stats.lines_discarded += 1;
            self.line.clear();
            last_seen = Instant::now();
        }

        Err(ReadError::NotFound {
            label: target.label(),
            lines: self.config.max_read_lines,
        })
    }

    /// Pull bytes into the line buffer until a newline or the loop budget runs out
    fn accumulate_line(&mut self, stats: &mut ScanStats) -> Result<LineEnd, ReadError> {
        let mut loops = self.config.max_read_loops;

        while loops > 0 {
            loops -= 1;
            let Some(byte) = self.transport.read_byte()? else {
                continue;
            };
            stats.bytes_read += 1;

            match byte {
                b'\r' => {}
                b'\n' => return Ok(LineEnd::Complete),
                _ => {
                    if let Err(e) = self.line.push(byte) {
                        tracing::warn!(
                            capacity = self.line.capacity(),
                            partial = %self.line.to_text(),
                            "{}",
                            e
                        );
                        return Err(e);
                    }
                }
            }
        }

        Ok(LineEnd::LoopBudgetExhausted)
    }
}
