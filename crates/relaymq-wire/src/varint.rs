//! Protobuf wire-format primitives: varints, field keys, and field skipping.

use bytes::{Buf, BufMut, BytesMut};

use crate::error::{Result, WireError};

/// Wire type 0: varint-encoded scalar.
pub(crate) const WT_VARINT: u8 = 0;
/// Wire type 1: fixed 64-bit scalar.
pub(crate) const WT_FIXED64: u8 = 1;
/// Wire type 2: length-delimited bytes.
pub(crate) const WT_LEN: u8 = 2;
/// Wire type 5: fixed 32-bit scalar.
pub(crate) const WT_FIXED32: u8 = 5;

const MAX_VARINT_BYTES: usize = 10;

pub(crate) fn put_varint(dst: &mut BytesMut, mut value: u64) {
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            dst.put_u8(byte);
            return;
        }
        dst.put_u8(byte | 0x80);
    }
}

pub(crate) fn put_key(dst: &mut BytesMut, field: u32, wire_type: u8) {
    put_varint(dst, (u64::from(field) << 3) | u64::from(wire_type));
}

pub(crate) fn put_bytes_field(dst: &mut BytesMut, field: u32, value: &[u8]) {
    put_key(dst, field, WT_LEN);
    put_varint(dst, value.len() as u64);
    dst.put_slice(value);
}

pub(crate) fn put_str_field(dst: &mut BytesMut, field: u32, value: &str) {
    put_bytes_field(dst, field, value.as_bytes());
}

pub(crate) fn put_u64_field(dst: &mut BytesMut, field: u32, value: u64) {
    put_key(dst, field, WT_VARINT);
    put_varint(dst, value);
}

pub(crate) fn put_u32_field(dst: &mut BytesMut, field: u32, value: u32) {
    put_u64_field(dst, field, u64::from(value));
}

pub(crate) fn put_bool_field(dst: &mut BytesMut, field: u32, value: bool) {
    put_u64_field(dst, field, u64::from(value));
}

/// Signed 32-bit fields are sign-extended to 64 bits before varint
/// encoding, so negative values occupy the full 10 bytes.
pub(crate) fn put_i32_field(dst: &mut BytesMut, field: u32, value: i32) {
    put_u64_field(dst, field, i64::from(value) as u64);
}

pub(crate) fn get_varint(buf: &mut &[u8]) -> Result<u64> {
    let mut value = 0u64;
    for i in 0..MAX_VARINT_BYTES {
        if !buf.has_remaining() {
            return Err(WireError::Truncated);
        }
        let byte = buf.get_u8();
        value |= u64::from(byte & 0x7f) << (7 * i);
        if byte & 0x80 == 0 {
            return Ok(value);
        }
    }
    Err(WireError::VarintOverflow)
}

/// Read a field key, returning `(field_number, wire_type)`.
/// Returns `Ok(None)` at end of input.
pub(crate) fn get_key(buf: &mut &[u8]) -> Result<Option<(u32, u8)>> {
    if !buf.has_remaining() {
        return Ok(None);
    }
    let key = get_varint(buf)?;
    Ok(Some(((key >> 3) as u32, (key & 0x7) as u8)))
}

pub(crate) fn get_len_bytes<'a>(buf: &mut &'a [u8]) -> Result<&'a [u8]> {
    let len = get_varint(buf)? as usize;
    if buf.remaining() < len {
        return Err(WireError::Truncated);
    }
    let (head, tail) = buf.split_at(len);
    *buf = tail;
    Ok(head)
}

/// Skip an unknown field according to its wire type.
pub(crate) fn skip_field(buf: &mut &[u8], field: u32, wire_type: u8) -> Result<()> {
    match wire_type {
        WT_VARINT => {
            get_varint(buf)?;
        }
        WT_FIXED64 => {
            if buf.remaining() < 8 {
                return Err(WireError::Truncated);
            }
            buf.advance(8);
        }
        WT_LEN => {
            get_len_bytes(buf)?;
        }
        WT_FIXED32 => {
            if buf.remaining() < 4 {
                return Err(WireError::Truncated);
            }
            buf.advance(4);
        }
        other => {
            return Err(WireError::UnexpectedWireType {
                field,
                wire_type: other,
            })
        }
    }
    Ok(())
}

/// Check that a known field carries the wire type its declaration requires.
pub(crate) fn expect_wire_type(field: u32, actual: u8, expected: u8) -> Result<()> {
    if actual == expected {
        Ok(())
    } else {
        Err(WireError::UnexpectedWireType {
            field,
            wire_type: actual,
        })
    }
}

pub(crate) fn require_utf8(bytes: &[u8], field: &'static str) -> Result<String> {
    String::from_utf8(bytes.to_vec()).map_err(|_| WireError::InvalidUtf8 { field })
}
