//! Append-style encoders.
//!
//! Every function appends a complete wire value to a `Vec<u8>`. Collection
//! headers use the narrowest size class that can hold the count; numeric
//! values always carry their declared width (tag byte plus big-endian
//! payload), so the byte layout of a generated codec is a pure function of
//! the schema.
use crate::{
    ext::{Complex128, Complex64},
    tags,
};

/// Append a map header for `n` key/value pairs.
#[inline]
pub fn append_map_header(o: &mut Vec<u8>, n: u32) {
    if n <= 15 {
        o.push(tags::FIXMAP | n as u8);
    } else if n <= u16::MAX as u32 {
        o.push(tags::MAP16);
        o.extend_from_slice(&(n as u16).to_be_bytes());
    } else {
        o.push(tags::MAP32);
        o.extend_from_slice(&n.to_be_bytes());
    }
}

/// Append an array header for `n` elements.
#[inline]
pub fn append_array_header(o: &mut Vec<u8>, n: u32) {
    if n <= 15 {
        o.push(tags::FIXARRAY | n as u8);
    } else if n <= u16::MAX as u32 {
        o.push(tags::ARRAY16);
        o.extend_from_slice(&(n as u16).to_be_bytes());
    } else {
        o.push(tags::ARRAY32);
        o.extend_from_slice(&n.to_be_bytes());
    }
}

/// Append a UTF-8 string, header plus payload.
#[inline]
pub fn append_str(o: &mut Vec<u8>, s: &str) {
    let n = s.len();
    if n <= 31 {
        o.push(tags::FIXSTR | n as u8);
    } else if n <= u8::MAX as usize {
        o.push(tags::STR8);
        o.push(n as u8);
    } else if n <= u16::MAX as usize {
        o.push(tags::STR16);
        o.extend_from_slice(&(n as u16).to_be_bytes());
    } else {
        o.push(tags::STR32);
        o.extend_from_slice(&(n as u32).to_be_bytes());
    }
    o.extend_from_slice(s.as_bytes());
}

/// Append a binary blob, header plus payload.
#[inline]
pub fn append_bytes(o: &mut Vec<u8>, b: &[u8]) {
    let n = b.len();
    if n <= u8::MAX as usize {
        o.push(tags::BIN8);
        o.push(n as u8);
    } else if n <= u16::MAX as usize {
        o.push(tags::BIN16);
        o.extend_from_slice(&(n as u16).to_be_bytes());
    } else {
        o.push(tags::BIN32);
        o.extend_from_slice(&(n as u32).to_be_bytes());
    }
    o.extend_from_slice(b);
}

/// Append the nil marker.
#[inline]
pub fn append_nil(o: &mut Vec<u8>) {
    o.push(tags::NIL);
}

#[inline]
pub fn append_bool(o: &mut Vec<u8>, v: bool) {
    o.push(if v { tags::TRUE } else { tags::FALSE });
}

#[inline]
pub fn append_u8(o: &mut Vec<u8>, v: u8) {
    o.extend_from_slice(&[tags::U8, v]);
}

#[inline]
pub fn append_u16(o: &mut Vec<u8>, v: u16) {
    o.push(tags::U16);
    o.extend_from_slice(&v.to_be_bytes());
}

#[inline]
pub fn append_u32(o: &mut Vec<u8>, v: u32) {
    o.push(tags::U32);
    o.extend_from_slice(&v.to_be_bytes());
}

#[inline]
pub fn append_u64(o: &mut Vec<u8>, v: u64) {
    o.push(tags::U64);
    o.extend_from_slice(&v.to_be_bytes());
}

#[inline]
pub fn append_i8(o: &mut Vec<u8>, v: i8) {
    o.extend_from_slice(&[tags::I8, v as u8]);
}

#[inline]
pub fn append_i16(o: &mut Vec<u8>, v: i16) {
    o.push(tags::I16);
    o.extend_from_slice(&v.to_be_bytes());
}

#[inline]
pub fn append_i32(o: &mut Vec<u8>, v: i32) {
    o.push(tags::I32);
    o.extend_from_slice(&v.to_be_bytes());
}

#[inline]
pub fn append_i64(o: &mut Vec<u8>, v: i64) {
    o.push(tags::I64);
    o.extend_from_slice(&v.to_be_bytes());
}

#[inline]
pub fn append_f32(o: &mut Vec<u8>, v: f32) {
    o.push(tags::F32);
    o.extend_from_slice(&v.to_be_bytes());
}

#[inline]
pub fn append_f64(o: &mut Vec<u8>, v: f64) {
    o.push(tags::F64);
    o.extend_from_slice(&v.to_be_bytes());
}

/// Append a complex number as a fixext8 value (extension type 3).
#[inline]
pub fn append_complex64(o: &mut Vec<u8>, v: Complex64) {
    o.extend_from_slice(&[tags::FIXEXT8, tags::COMPLEX64_EXT as u8]);
    o.extend_from_slice(&v.re.to_be_bytes());
    o.extend_from_slice(&v.im.to_be_bytes());
}

/// Append a complex number as a fixext16 value (extension type 4).
#[inline]
pub fn append_complex128(o: &mut Vec<u8>, v: Complex128) {
    o.extend_from_slice(&[tags::FIXEXT16, tags::COMPLEX128_EXT as u8]);
    o.extend_from_slice(&v.re.to_be_bytes());
    o.extend_from_slice(&v.im.to_be_bytes());
}
