//! Runtime support for `tagpack`-generated codecs.
//!
//! `tagpack-gen` turns a schema into four procedures per type: an append
//! marshaler, a slice unmarshaler, and a streaming encode/decode pair. The
//! code it emits is ordinary Rust that calls into this crate, so this crate
//! owns the wire format: a compact, self-describing binary encoding in the
//! MessagePack family (tag byte, then a big-endian payload or a counted
//! collection).
//!
//! # Layout of a generated codec
//!
//! A generated impl looks like hand-written code against this crate:
//!
//! ```
//! use tagpack::{Marshal, Unmarshal, Result};
//!
//! #[derive(Default, Debug, PartialEq)]
//! struct Point {
//!     x: i32,
//!     y: i32,
//! }
//!
//! // What tagpack-gen emits for `Point { x, y }` (abbreviated).
//! impl Marshal for Point {
//!     fn marshal_msg(&self, o: &mut Vec<u8>) -> Result<()> {
//!         // fixmap(2), "x" -- statically known bytes, fused into one run
//!         o.extend_from_slice(&[0x82, 0xa1, 0x78]);
//!         tagpack::append_i32(o, (*self).x);
//!         o.extend_from_slice(&[0xa1, 0x79]);
//!         tagpack::append_i32(o, (*self).y);
//!         Ok(())
//!     }
//! }
//!
//! impl Unmarshal for Point {
//!     fn unmarshal_msg<'a>(&mut self, bts: &'a [u8]) -> Result<&'a [u8]> {
//!         let mut bts = bts;
//!         let mut n: u32;
//!         {
//!             let (v, rest) = tagpack::read_map_header(bts)?;
//!             n = v;
//!             bts = rest;
//!         }
//!         while n > 0 {
//!             n -= 1;
//!             let k;
//!             {
//!                 let (v, rest) = tagpack::read_str(bts)?;
//!                 k = v;
//!                 bts = rest;
//!             }
//!             match k {
//!                 "x" => {
//!                     let (v, rest) = tagpack::read_i32(bts).map_err(|err| err.at("x"))?;
//!                     (*self).x = v;
//!                     bts = rest;
//!                 }
//!                 "y" => {
//!                     let (v, rest) = tagpack::read_i32(bts).map_err(|err| err.at("y"))?;
//!                     (*self).y = v;
//!                     bts = rest;
//!                 }
//!                 _ => {
//!                     bts = tagpack::skip(bts)?;
//!                 }
//!             }
//!         }
//!         Ok(bts)
//!     }
//! }
//!
//! let p = Point { x: 1, y: -2 };
//! let bytes = tagpack::to_vec(&p).unwrap();
//! let back: Point = tagpack::from_slice(&bytes).unwrap();
//! assert_eq!(back, p);
//! ```
//!
//! Failures inside nested values carry a diagnostic path
//! (`items[3].name: unexpected tag ...`) attached via [`Error::at`].

pub mod error;
pub use error::{Error, Result};
pub mod io;
mod ext;
pub use ext::{append_ext, Complex128, Complex64, Extension};
mod read;
pub use read::*;
mod tags;
mod value;
pub use value::Value;
mod write;
pub use write::*;

/// Types with a generated (or hand-written) append marshaler.
pub trait Marshal {
    /// Append the wire encoding of `self` to `o`.
    fn marshal_msg(&self, o: &mut Vec<u8>) -> Result<()>;
}

/// Types with a generated (or hand-written) slice unmarshaler.
///
/// Decoding fills `self` in place; absent optional content leaves prior
/// values untouched unless the schema says otherwise. Container decoding
/// default-constructs elements before filling them, so element types must
/// implement [`Default`].
pub trait Unmarshal {
    /// Read one value from the front of `bts` into `self`, returning the
    /// unconsumed tail.
    fn unmarshal_msg<'a>(&mut self, bts: &'a [u8]) -> Result<&'a [u8]>;
}

/// Streaming counterpart of [`Marshal`].
///
/// Encoding buffers in the [`Writer`](io::Writer); callers flush when a
/// message is complete.
pub trait Encode {
    fn encode_msg<W: std::io::Write>(&self, w: &mut io::Writer<W>) -> Result<()>;
}

/// Streaming counterpart of [`Unmarshal`]; the same [`Default`] requirement
/// applies to container elements.
pub trait Decode {
    fn decode_msg<R: std::io::Read>(&mut self, r: &mut io::Reader<R>) -> Result<()>;
}

/// Marshal `v` into a fresh buffer.
pub fn to_vec<T: Marshal>(v: &T) -> Result<Vec<u8>> {
    let mut o = Vec::new();
    v.marshal_msg(&mut o)?;
    Ok(o)
}

/// Unmarshal one value of `T` from the front of `bts`. Trailing bytes are
/// not an error; use [`Unmarshal::unmarshal_msg`] directly to observe the
/// tail.
pub fn from_slice<T: Unmarshal + Default>(bts: &[u8]) -> Result<T> {
    let mut v = T::default();
    v.unmarshal_msg(bts)?;
    Ok(v)
}
