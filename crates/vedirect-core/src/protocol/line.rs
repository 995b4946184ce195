//! Line accumulation, tokenizing and value decoding

use super::{FieldId, ReadError, MAX_LINE_CAPACITY};

/// Fixed-capacity buffer holding one wire line.
///
/// Storage is reserved up front for capacities up to `MAX_LINE_CAPACITY`;
/// larger buffers grow on demand.
#[derive(Debug, Clone)]
pub struct LineBuffer {
    bytes: Vec<u8>,
    capacity: usize,
}

impl LineBuffer {
    /// Create an empty buffer holding at most `capacity` bytes
    pub fn new(capacity: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(capacity.min(MAX_LINE_CAPACITY)),
            capacity,
        }
    }

    /// Append one byte, failing with `BufferOverrun` when already full
    pub fn push(&mut self, byte: u8) -> Result<(), ReadError> {
        if self.bytes.len() >= self.capacity {
            return Err(ReadError::BufferOverrun {
                capacity: self.capacity,
            });
        }
        self.bytes.push(byte);
        Ok(())
    }

    /// Discard the buffered line
    pub fn clear(&mut self) {
        self.bytes.clear();
    }

    /// Buffered bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Number of buffered bytes
    pub(crate) fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Maximum number of bytes the buffer accepts
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Buffered line as text, replacing invalid UTF-8
    pub fn to_text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }
}

/// Split a line into its label and value tokens.
///
/// Runs of tabs act as a single delimiter and leading tabs are skipped, so
/// `"\tV\t\t12950"` yields `("V", "12950")`. Either token may be missing.
pub fn split_line(line: &[u8]) -> (Option<&[u8]>, Option<&[u8]>) {
    let mut tokens = line.split(|&b| b == b'\t').filter(|t| !t.is_empty());
    let label = tokens.next();
    let value = tokens.next();
    (label, value)
}

/// Decode a value token for `field`.
///
/// Tokens starting with `'O'` are the ON/OFF encoding: `1` when the second
/// character is `'N'`, otherwise `0`. Anything else must be a base-10 `i32`.
pub fn decode_value(field: FieldId, token: Option<&[u8]>) -> Result<i32, ReadError> {
    let Some(token) = token else {
        return Err(ReadError::InvalidValue {
            field,
            value: String::new(),
        });
    };

    if token.first() == Some(&b'O') {
        return Ok(if token.get(1) == Some(&b'N') { 1 } else { 0 });
    }

    std::str::from_utf8(token)
        .ok()
        .and_then(|s| s.trim().parse::<i32>().ok())
        .ok_or_else(|| ReadError::InvalidValue {
            field,
            value: String::from_utf8_lossy(token).into_owned(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_accepts_up_to_capacity() {
        let mut buf = LineBuffer::new(4);
        for b in b"abcd" {
            buf.push(*b).unwrap();
        }
        assert_eq!(buf.as_bytes(), b"abcd");

        let err = buf.push(b'e').unwrap_err();
        assert!(matches!(err, ReadError::BufferOverrun { capacity: 4 }));
        // Contents untouched by the rejected byte
        assert_eq!(buf.as_bytes(), b"abcd");
    }

    #[test]
    fn test_buffer_clear() {
        let mut buf = LineBuffer::new(8);
        buf.push(b'V').unwrap();
        buf.clear();
        assert_eq!(buf.len(), 0);
        assert_eq!(buf.capacity(), 8);
    }

    #[test]
    fn test_huge_capacity_does_not_preallocate() {
        let mut buf = LineBuffer::new(usize::MAX);
        assert_eq!(buf.capacity(), usize::MAX);
        buf.push(b'V').unwrap();
        assert_eq!(buf.as_bytes(), b"V");
    }

    #[test]
    fn test_split_line() {
        assert_eq!(
            split_line(b"V\t12950"),
            (Some(&b"V"[..]), Some(&b"12950"[..]))
        );
        assert_eq!(
            split_line(b"\tPPV\t\t7\textra"),
            (Some(&b"PPV"[..]), Some(&b"7"[..]))
        );
        assert_eq!(split_line(b"SOC"), (Some(&b"SOC"[..]), None));
        assert_eq!(split_line(b""), (None, None));
        assert_eq!(split_line(b"\t\t"), (None, None));
    }

    fn decode(field: FieldId, token: &[u8]) -> Result<i32, ReadError> {
        decode_value(field, Some(token))
    }

    #[test]
    fn test_decode_on_off() {
        assert_eq!(decode(FieldId::Alarm, b"ON").unwrap(), 1);
        assert_eq!(decode(FieldId::Alarm, b"OFF").unwrap(), 0);
    }

    #[test]
    fn test_decode_on_off_is_lenient() {
        assert_eq!(decode(FieldId::Alarm, b"O").unwrap(), 0);
        assert_eq!(decode(FieldId::Alarm, b"OK").unwrap(), 0);
        assert_eq!(decode(FieldId::Alarm, b"ONX").unwrap(), 1);
    }

    #[test]
    fn test_decode_integers() {
        let v = FieldId::BatteryVoltage;
        assert_eq!(decode(v, b"12345").unwrap(), 12345);
        assert_eq!(decode(v, b"-250").unwrap(), -250);
        assert_eq!(decode(v, b"+7").unwrap(), 7);
        assert_eq!(decode(v, b" 42 ").unwrap(), 42);
    }

    #[test]
    fn test_decode_invalid() {
        let err = decode(FieldId::StateOfCharge, b"abc").unwrap_err();
        match err {
            ReadError::InvalidValue { field, value } => {
                assert_eq!(field, FieldId::StateOfCharge);
                assert_eq!(value, "abc");
            }
            other => panic!("unexpected error {:?}", other),
        }

        assert!(decode_value(FieldId::BatteryPower, None).is_err());
        assert!(decode(FieldId::BatteryPower, b"99999999999").is_err());
        assert!(decode(FieldId::BatteryPower, &[0xff, 0x31]).is_err());
        assert!(decode(FieldId::BatteryPower, b"12.5").is_err());
    }
}
