use serialport::SerialPort;
use std::io::{self, Read, Write};

/// Byte source the protocol reader scans
pub trait Transport {
    /// Reconfigure the link speed
    fn set_baud_rate(&mut self, baud_rate: u32) -> io::Result<()>;

    /// Whether the underlying link is usable at all
    fn is_open(&self) -> bool {
        true
    }

    /// Get number of bytes available to read
    fn bytes_to_read(&mut self) -> io::Result<u32>;

    /// True when at least one byte is pending
    fn available(&mut self) -> io::Result<bool> {
        Ok(self.bytes_to_read()? > 0)
    }

    /// Read a single byte without blocking; `None` when nothing is pending
    fn read_byte(&mut self) -> io::Result<Option<u8>>;

    /// Flush pending output
    fn flush(&mut self) -> io::Result<()>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn set_baud_rate(&mut self, baud_rate: u32) -> io::Result<()> {
        (**self).set_baud_rate(baud_rate)
    }

    fn is_open(&self) -> bool {
        (**self).is_open()
    }

    fn bytes_to_read(&mut self) -> io::Result<u32> {
        (**self).bytes_to_read()
    }

    fn available(&mut self) -> io::Result<bool> {
        (**self).available()
    }

    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        (**self).read_byte()
    }

    fn flush(&mut self) -> io::Result<()> {
        (**self).flush()
    }
}

/// Serial port wrapper implementing Transport
pub struct SerialChannel {
    port: Box<dyn SerialPort>,
}

impl SerialChannel {
    /// Wrap an already opened port
    pub fn new(port: Box<dyn SerialPort>) -> Self {
        Self { port }
    }

    /// Name of the underlying port, if known
    pub fn name(&self) -> Option<String> {
        self.port.name()
    }

    /// Give back the wrapped port
    pub fn into_inner(self) -> Box<dyn SerialPort> {
        self.port
    }
}

impl Transport for SerialChannel {
    fn set_baud_rate(&mut self, baud_rate: u32) -> io::Result<()> {
        self.port
            .set_baud_rate(baud_rate)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))
    }

    fn bytes_to_read(&mut self) -> io::Result<u32> {
        self.port
            .bytes_to_read()
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))
    }

    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        if self.bytes_to_read()? == 0 {
            return Ok(None);
        }

        let mut byte = [0u8; 1];
        match self.port.read(&mut byte) {
            Ok(1) => Ok(Some(byte[0])),
            Ok(_) => Ok(None),
            Err(ref e)
                if e.kind() == io::ErrorKind::TimedOut || e.kind() == io::ErrorKind::WouldBlock =>
            {
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        self.port.flush()
    }
}

/// In-memory transport replaying a fixed byte script.
///
/// In looping mode the script repeats forever, like a device re-sending its
/// frame every second.
#[derive(Debug, Clone)]
pub struct MemoryChannel {
    data: Vec<u8>,
    pos: usize,
    consumed: usize,
    looping: bool,
    open: bool,
    baud_rate: Option<u32>,
    flushes: usize,
}

impl MemoryChannel {
    /// Replay `data` once, then go quiet
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: data.into(),
            pos: 0,
            consumed: 0,
            looping: false,
            open: true,
            baud_rate: None,
            flushes: 0,
        }
    }

    /// Replay `data` forever
    pub fn looping(data: impl Into<Vec<u8>>) -> Self {
        Self {
            looping: true,
            ..Self::new(data)
        }
    }

    /// Build a script from text lines, each terminated with CRLF
    pub fn from_lines<S: AsRef<str>>(lines: &[S]) -> Self {
        let mut data = Vec::new();
        for line in lines {
            data.extend_from_slice(line.as_ref().as_bytes());
            data.extend_from_slice(b"\r\n");
        }
        Self::new(data)
    }

    /// A link that reports itself closed
    pub fn closed() -> Self {
        Self {
            open: false,
            ..Self::new(Vec::new())
        }
    }

    /// Total bytes handed out so far
    pub fn consumed(&self) -> usize {
        self.consumed
    }

    /// Bytes left before a non-looping script runs dry
    pub fn remaining(&self) -> &[u8] {
        &self.data[self.pos..]
    }

    /// Rewind to the start of the script
    pub fn rewind(&mut self) {
        self.pos = 0;
        self.consumed = 0;
    }

    /// Last baud rate configured through the transport
    pub fn baud_rate(&self) -> Option<u32> {
        self.baud_rate
    }

    /// Number of flushes requested
    pub fn flush_count(&self) -> usize {
        self.flushes
    }
}

impl Transport for MemoryChannel {
    fn set_baud_rate(&mut self, baud_rate: u32) -> io::Result<()> {
        self.baud_rate = Some(baud_rate);
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn bytes_to_read(&mut self) -> io::Result<u32> {
        let pending = if self.looping {
            self.data.len()
        } else {
            self.data.len() - self.pos
        };
        Ok(pending as u32)
    }

    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        if self.looping && self.pos == self.data.len() {
            self.pos = 0;
        }
        let Some(&byte) = self.data.get(self.pos) else {
            return Ok(None);
        };
        self.pos += 1;
        self.consumed += 1;
        Ok(Some(byte))
    }

    fn flush(&mut self) -> io::Result<()> {
        self.flushes += 1;
        Ok(())
    }
}
