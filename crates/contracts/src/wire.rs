//! Line-oriented hex wire format
//!
//! One line per frame, terminated by `\n`:
//!
//! ```text
//! <timestamp:8 bytes><primary:12 x f32>([<class>#<type>#<serial>]<pressed:8 bytes><touched:8 bytes><transform:12 x f32>)*
//! ```
//!
//! Every numeric field is its raw in-memory representation in native byte
//! order, rendered as lowercase hex. Lines are therefore only portable
//! between hosts of the same endianness.

use bytes::Bytes;

use crate::{AuxiliaryDevice, ContractError, DeviceClass, Frame, Matrix34, MATRIX34_LEN};

/// Hex characters for one u64 field
const U64_HEX_LEN: usize = 16;

/// Hex characters for one 3x4 f32 matrix
const MATRIX_HEX_LEN: usize = MATRIX34_LEN * 8;

/// Encode a frame as one newline-terminated line.
///
/// Auxiliary device records are appended only when `report_auxiliary` is set.
pub fn encode_frame(frame: &Frame, report_auxiliary: bool) -> Bytes {
    let device_count = if report_auxiliary { frame.devices.len() } else { 0 };
    let mut line = String::with_capacity(
        U64_HEX_LEN + MATRIX_HEX_LEN + device_count * (64 + 2 * U64_HEX_LEN + MATRIX_HEX_LEN) + 1,
    );

    line.push_str(&hex::encode(frame.timestamp.to_ne_bytes()));
    push_matrix(&mut line, &frame.primary);

    if report_auxiliary {
        for device in &frame.devices {
            line.push('[');
            line.push_str(&device.identifier());
            line.push(']');
            line.push_str(&hex::encode(device.pressed_mask.to_ne_bytes()));
            line.push_str(&hex::encode(device.touched_mask.to_ne_bytes()));
            push_matrix(&mut line, &device.transform);
        }
    }

    line.push('\n');
    Bytes::from(line)
}

fn push_matrix(line: &mut String, matrix: &Matrix34) {
    for value in matrix.iter() {
        line.push_str(&hex::encode(value.to_ne_bytes()));
    }
}

/// Decode one line produced by [`encode_frame`].
///
/// A trailing `\n` (or `\r\n`) is accepted and ignored.
pub fn decode_line(line: &str) -> Result<Frame, ContractError> {
    let line = line.trim_end_matches(&['\n', '\r'][..]);
    let mut cursor = Cursor { rest: line, offset: 0 };

    let timestamp = cursor.take_u64("timestamp")?;
    let primary = cursor.take_matrix("primary transform")?;

    let mut devices = Vec::new();
    while !cursor.rest.is_empty() {
        devices.push(cursor.take_device()?);
    }

    Ok(Frame {
        timestamp,
        primary,
        devices,
    })
}

/// Decoding position within a line
struct Cursor<'a> {
    rest: &'a str,
    offset: usize,
}

impl<'a> Cursor<'a> {
    fn take(&mut self, len: usize, field: &str) -> Result<&'a str, ContractError> {
        if self.rest.len() < len || !self.rest.is_char_boundary(len) {
            return Err(ContractError::wire_decode(
                self.offset,
                format!("truncated {field}"),
            ));
        }
        let (head, tail) = self.rest.split_at(len);
        self.rest = tail;
        self.offset += len;
        Ok(head)
    }

    fn take_bytes<const N: usize>(&mut self, field: &str) -> Result<[u8; N], ContractError> {
        let offset = self.offset;
        let text = self.take(N * 2, field)?;
        let mut out = [0u8; N];
        hex::decode_to_slice(text, &mut out)
            .map_err(|e| ContractError::wire_decode(offset, format!("{field}: {e}")))?;
        Ok(out)
    }

    fn take_u64(&mut self, field: &str) -> Result<u64, ContractError> {
        Ok(u64::from_ne_bytes(self.take_bytes::<8>(field)?))
    }

    fn take_matrix(&mut self, field: &str) -> Result<Matrix34, ContractError> {
        let mut values = [0.0f32; MATRIX34_LEN];
        for value in values.iter_mut() {
            *value = f32::from_ne_bytes(self.take_bytes::<4>(field)?);
        }
        Ok(Matrix34::from_row_major(values))
    }

    fn take_device(&mut self) -> Result<AuxiliaryDevice, ContractError> {
        let start = self.offset;
        let inner = self
            .rest
            .strip_prefix('[')
            .and_then(|s| s.split_once(']'))
            .map(|(inner, _)| inner)
            .ok_or_else(|| ContractError::wire_decode(start, "expected '[identifier]'"))?;
        self.take(inner.len() + 2, "device identifier")?;

        let mut parts = inner.splitn(3, '#');
        let (Some(tag), Some(device_type), Some(serial)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(ContractError::wire_decode(
                start,
                format!("malformed device identifier '{inner}'"),
            ));
        };
        let class = DeviceClass::from_tag(tag).ok_or_else(|| {
            ContractError::wire_decode(start, format!("unknown device class '{tag}'"))
        })?;

        Ok(AuxiliaryDevice {
            class,
            device_type: device_type.to_string(),
            serial: serial.to_string(),
            pressed_mask: self.take_u64("pressed mask")?,
            touched_mask: self.take_u64("touched mask")?,
            transform: self.take_matrix("device transform")?,
        })
    }
}
