//! Variable-length integer encoding used by posting records.
//!
//! Seven payload bits per byte, least significant group first, with the high
//! bit set on every byte except the last.

use std::io::{ErrorKind, Read, Write};

use byteorder::ReadBytesExt;

use crate::error::{QuiverError, Result};

/// Largest number of bytes a u64 can occupy once encoded.
pub const MAX_VARINT_LEN: usize = 10;

/// Encode `value` into a fixed scratch array, returning it with its length.
fn encode(value: u64) -> ([u8; MAX_VARINT_LEN], usize) {
    let mut bytes = [0u8; MAX_VARINT_LEN];
    let mut val = value;
    let mut len = 0;

    loop {
        let mut byte = (val & 0x7F) as u8;
        val >>= 7;
        if val != 0 {
            byte |= 0x80;
        }
        bytes[len] = byte;
        len += 1;
        if val == 0 {
            return (bytes, len);
        }
    }
}

/// Number of bytes `value` occupies once encoded.
pub fn encoded_len(value: u64) -> usize {
    encode(value).1
}

/// Write `value` to `writer`, returning the number of bytes written.
pub fn write_u64<W: Write>(writer: &mut W, value: u64) -> Result<usize> {
    let (bytes, len) = encode(value);
    writer.write_all(&bytes[..len])?;
    Ok(len)
}

/// Write a u32 as a varint.
pub fn write_u32<W: Write>(writer: &mut W, value: u32) -> Result<usize> {
    write_u64(writer, value as u64)
}

/// Read a varint from `reader`.
///
/// Running out of input mid-value or overflowing 64 bits is a decode error.
pub fn read_u64<R: Read>(reader: &mut R) -> Result<u64> {
    let mut result = 0u64;
    let mut shift = 0;

    loop {
        let byte = reader.read_u8().map_err(|e| match e.kind() {
            ErrorKind::UnexpectedEof => QuiverError::decode("Incomplete varint"),
            _ => QuiverError::Io(e),
        })?;

        if shift >= 64 || (shift == 63 && byte > 1) {
            return Err(QuiverError::decode("Varint overflow"));
        }

        result |= ((byte & 0x7F) as u64) << shift;
        if byte & 0x80 == 0 {
            return Ok(result);
        }
        shift += 7;
    }
}

/// Read a varint that must fit in a u32.
pub fn read_u32<R: Read>(reader: &mut R) -> Result<u32> {
    let value = read_u64(reader)?;
    u32::try_from(value).map_err(|_| QuiverError::decode(format!("Varint {value} overflows u32")))
}
