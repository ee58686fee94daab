//! Wire tag bytes.
//!
//! One byte of self-description precedes every value. Fixed-size families
//! (fixmap, fixarray, fixstr, fixint) fold small payloads into the tag
//! itself; everything else is a tag byte followed by a big-endian length or
//! payload.

pub(crate) const NIL: u8 = 0xc0;
pub(crate) const FALSE: u8 = 0xc2;
pub(crate) const TRUE: u8 = 0xc3;

pub(crate) const FIXMAP: u8 = 0x80;
pub(crate) const MAP16: u8 = 0xde;
pub(crate) const MAP32: u8 = 0xdf;

pub(crate) const FIXARRAY: u8 = 0x90;
pub(crate) const ARRAY16: u8 = 0xdc;
pub(crate) const ARRAY32: u8 = 0xdd;

pub(crate) const FIXSTR: u8 = 0xa0;
pub(crate) const STR8: u8 = 0xd9;
pub(crate) const STR16: u8 = 0xda;
pub(crate) const STR32: u8 = 0xdb;

pub(crate) const BIN8: u8 = 0xc4;
pub(crate) const BIN16: u8 = 0xc5;
pub(crate) const BIN32: u8 = 0xc6;

pub(crate) const U8: u8 = 0xcc;
pub(crate) const U16: u8 = 0xcd;
pub(crate) const U32: u8 = 0xce;
pub(crate) const U64: u8 = 0xcf;
pub(crate) const I8: u8 = 0xd0;
pub(crate) const I16: u8 = 0xd1;
pub(crate) const I32: u8 = 0xd2;
pub(crate) const I64: u8 = 0xd3;
pub(crate) const F32: u8 = 0xca;
pub(crate) const F64: u8 = 0xcb;

pub(crate) const EXT8: u8 = 0xc7;
pub(crate) const EXT16: u8 = 0xc8;
pub(crate) const EXT32: u8 = 0xc9;
pub(crate) const FIXEXT1: u8 = 0xd4;
pub(crate) const FIXEXT2: u8 = 0xd5;
pub(crate) const FIXEXT4: u8 = 0xd6;
pub(crate) const FIXEXT8: u8 = 0xd7;
pub(crate) const FIXEXT16: u8 = 0xd8;

/// Extension type codes for the complex wire kinds.
pub(crate) const COMPLEX64_EXT: i8 = 3;
pub(crate) const COMPLEX128_EXT: i8 = 4;

pub(crate) const fn is_fixmap(tag: u8) -> bool {
    tag & 0xf0 == FIXMAP
}

pub(crate) const fn is_fixarray(tag: u8) -> bool {
    tag & 0xf0 == FIXARRAY
}

pub(crate) const fn is_fixstr(tag: u8) -> bool {
    tag & 0xe0 == FIXSTR
}

pub(crate) const fn is_posfixint(tag: u8) -> bool {
    tag & 0x80 == 0
}

pub(crate) const fn is_negfixint(tag: u8) -> bool {
    tag & 0xe0 == 0xe0
}
