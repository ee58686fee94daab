//! Parse-style decoders over byte slices.
//!
//! Every function reads one complete wire value off the front of a slice and
//! returns it together with the unconsumed tail, so generated codecs can
//! thread a single `&[u8]` through a whole parse without any cursor state.
//!
//! Integer reads are lenient: any integer wire form whose value fits the
//! requested width is accepted, including the fixint folds. All other reads
//! require their own tag family.
use crate::{
    error::{self, Result},
    ext::{Complex128, Complex64, Extension},
    tags,
};

#[inline]
fn take(b: &[u8], n: usize) -> Result<(&[u8], &[u8])> {
    if b.len() < n {
        return Err(error::short_bytes());
    }
    Ok(b.split_at(n))
}

#[inline]
fn tag(b: &[u8]) -> Result<(u8, &[u8])> {
    match b.split_first() {
        Some((t, rest)) => Ok((*t, rest)),
        None => Err(error::short_bytes()),
    }
}

#[inline]
fn be16(b: &[u8]) -> Result<(u16, &[u8])> {
    let (h, rest) = take(b, 2)?;
    Ok((u16::from_be_bytes([h[0], h[1]]), rest))
}

#[inline]
fn be32(b: &[u8]) -> Result<(u32, &[u8])> {
    let (h, rest) = take(b, 4)?;
    Ok((u32::from_be_bytes([h[0], h[1], h[2], h[3]]), rest))
}

#[inline]
fn be64(b: &[u8]) -> Result<(u64, &[u8])> {
    let (h, rest) = take(b, 8)?;
    let mut raw = [0u8; 8];
    raw.copy_from_slice(h);
    Ok((u64::from_be_bytes(raw), rest))
}

/// Read a map header, returning the pair count.
#[inline]
pub fn read_map_header(b: &[u8]) -> Result<(u32, &[u8])> {
    let (t, rest) = tag(b)?;
    match t {
        _ if tags::is_fixmap(t) => Ok(((t & 0x0f) as u32, rest)),
        tags::MAP16 => {
            let (n, rest) = be16(rest)?;
            Ok((n as u32, rest))
        }
        tags::MAP32 => be32(rest),
        _ => Err(error::type_mismatch(t, "map header")),
    }
}

/// Read an array header, returning the element count.
#[inline]
pub fn read_array_header(b: &[u8]) -> Result<(u32, &[u8])> {
    let (t, rest) = tag(b)?;
    match t {
        _ if tags::is_fixarray(t) => Ok(((t & 0x0f) as u32, rest)),
        tags::ARRAY16 => {
            let (n, rest) = be16(rest)?;
            Ok((n as u32, rest))
        }
        tags::ARRAY32 => be32(rest),
        _ => Err(error::type_mismatch(t, "array header")),
    }
}

/// Read a string, borrowing its payload from the input.
#[inline]
pub fn read_str(b: &[u8]) -> Result<(&str, &[u8])> {
    let (t, rest) = tag(b)?;
    let (n, rest) = match t {
        _ if tags::is_fixstr(t) => ((t & 0x1f) as usize, rest),
        tags::STR8 => {
            let (h, rest) = take(rest, 1)?;
            (h[0] as usize, rest)
        }
        tags::STR16 => {
            let (n, rest) = be16(rest)?;
            (n as usize, rest)
        }
        tags::STR32 => {
            let (n, rest) = be32(rest)?;
            (n as usize, rest)
        }
        _ => return Err(error::type_mismatch(t, "string")),
    };
    let (payload, rest) = take(rest, n)?;
    Ok((core::str::from_utf8(payload)?, rest))
}

/// Read a binary blob, borrowing its payload from the input.
#[inline]
pub fn read_bin(b: &[u8]) -> Result<(&[u8], &[u8])> {
    let (t, rest) = tag(b)?;
    let (n, rest) = match t {
        tags::BIN8 => {
            let (h, rest) = take(rest, 1)?;
            (h[0] as usize, rest)
        }
        tags::BIN16 => {
            let (n, rest) = be16(rest)?;
            (n as usize, rest)
        }
        tags::BIN32 => {
            let (n, rest) = be32(rest)?;
            (n as usize, rest)
        }
        _ => return Err(error::type_mismatch(t, "binary")),
    };
    take(rest, n)
}

/// Read a binary blob whose length must equal `dst.len()`, copying the
/// payload into `dst`. Used for fixed-size byte arrays.
#[inline]
pub fn read_bin_exact<'a>(b: &'a [u8], dst: &mut [u8]) -> Result<&'a [u8]> {
    let (payload, rest) = read_bin(b)?;
    if payload.len() != dst.len() {
        return Err(error::array_size(dst.len() as u32, payload.len() as u32));
    }
    dst.copy_from_slice(payload);
    Ok(rest)
}

/// True if the next value in `b` is the nil marker.
#[inline]
pub fn is_nil(b: &[u8]) -> bool {
    b.first() == Some(&tags::NIL)
}

/// Consume a nil marker.
#[inline]
pub fn read_nil(b: &[u8]) -> Result<&[u8]> {
    let (t, rest) = tag(b)?;
    if t != tags::NIL {
        return Err(error::type_mismatch(t, "nil"));
    }
    Ok(rest)
}

#[inline]
pub fn read_bool(b: &[u8]) -> Result<(bool, &[u8])> {
    let (t, rest) = tag(b)?;
    match t {
        tags::TRUE => Ok((true, rest)),
        tags::FALSE => Ok((false, rest)),
        _ => Err(error::type_mismatch(t, "bool")),
    }
}

/// Read any integer form as an `i64`.
pub fn read_i64(b: &[u8]) -> Result<(i64, &[u8])> {
    let (t, rest) = tag(b)?;
    match t {
        _ if tags::is_posfixint(t) => Ok((t as i64, rest)),
        _ if tags::is_negfixint(t) => Ok((t as i8 as i64, rest)),
        tags::U8 => {
            let (h, rest) = take(rest, 1)?;
            Ok((h[0] as i64, rest))
        }
        tags::U16 => {
            let (v, rest) = be16(rest)?;
            Ok((v as i64, rest))
        }
        tags::U32 => {
            let (v, rest) = be32(rest)?;
            Ok((v as i64, rest))
        }
        tags::U64 => {
            let (v, rest) = be64(rest)?;
            let v = i64::try_from(v).map_err(|_| error::int_range(v as i128))?;
            Ok((v, rest))
        }
        tags::I8 => {
            let (h, rest) = take(rest, 1)?;
            Ok((h[0] as i8 as i64, rest))
        }
        tags::I16 => {
            let (v, rest) = be16(rest)?;
            Ok((v as i16 as i64, rest))
        }
        tags::I32 => {
            let (v, rest) = be32(rest)?;
            Ok((v as i32 as i64, rest))
        }
        tags::I64 => {
            let (v, rest) = be64(rest)?;
            Ok((v as i64, rest))
        }
        _ => Err(error::type_mismatch(t, "integer")),
    }
}

/// Read any non-negative integer form as a `u64`.
pub fn read_u64(b: &[u8]) -> Result<(u64, &[u8])> {
    let (t, _) = tag(b)?;
    if t == tags::U64 {
        let (_, rest) = tag(b)?;
        return be64(rest);
    }
    let (v, rest) = read_i64(b)?;
    let v = u64::try_from(v).map_err(|_| error::int_range(v as i128))?;
    Ok((v, rest))
}

macro_rules! narrowing_reads {
    ($(($name:ident, $ty:ty, $wide:ident)),* $(,)?) => {
        $(
            #[inline]
            pub fn $name(b: &[u8]) -> Result<($ty, &[u8])> {
                let (v, rest) = $wide(b)?;
                let v = <$ty>::try_from(v).map_err(|_| error::int_range(v as i128))?;
                Ok((v, rest))
            }
        )*
    };
}

narrowing_reads!(
    (read_u8, u8, read_u64),
    (read_u16, u16, read_u64),
    (read_u32, u32, read_u64),
    (read_i8, i8, read_i64),
    (read_i16, i16, read_i64),
    (read_i32, i32, read_i64),
);

#[inline]
pub fn read_f32(b: &[u8]) -> Result<(f32, &[u8])> {
    let (t, rest) = tag(b)?;
    if t != tags::F32 {
        return Err(error::type_mismatch(t, "f32"));
    }
    let (bits, rest) = be32(rest)?;
    Ok((f32::from_bits(bits), rest))
}

/// Read an `f64`, accepting an `f32` payload widened losslessly.
#[inline]
pub fn read_f64(b: &[u8]) -> Result<(f64, &[u8])> {
    let (t, rest) = tag(b)?;
    match t {
        tags::F64 => {
            let (bits, rest) = be64(rest)?;
            Ok((f64::from_bits(bits), rest))
        }
        tags::F32 => {
            let (bits, rest) = be32(rest)?;
            Ok((f32::from_bits(bits) as f64, rest))
        }
        _ => Err(error::type_mismatch(t, "f64")),
    }
}

pub fn read_complex64(b: &[u8]) -> Result<(Complex64, &[u8])> {
    let (t, rest) = tag(b)?;
    if t != tags::FIXEXT8 {
        return Err(error::type_mismatch(t, "complex64"));
    }
    let (ty, rest) = tag(rest)?;
    if ty as i8 != tags::COMPLEX64_EXT {
        return Err(error::ext_type(tags::COMPLEX64_EXT, ty as i8));
    }
    let (re, rest) = be32(rest)?;
    let (im, rest) = be32(rest)?;
    Ok((
        Complex64 {
            re: f32::from_bits(re),
            im: f32::from_bits(im),
        },
        rest,
    ))
}

pub fn read_complex128(b: &[u8]) -> Result<(Complex128, &[u8])> {
    let (t, rest) = tag(b)?;
    if t != tags::FIXEXT16 {
        return Err(error::type_mismatch(t, "complex128"));
    }
    let (ty, rest) = tag(rest)?;
    if ty as i8 != tags::COMPLEX128_EXT {
        return Err(error::ext_type(tags::COMPLEX128_EXT, ty as i8));
    }
    let (re, rest) = be64(rest)?;
    let (im, rest) = be64(rest)?;
    Ok((
        Complex128 {
            re: f64::from_bits(re),
            im: f64::from_bits(im),
        },
        rest,
    ))
}

/// Read an extension value of any size class.
pub fn read_ext(b: &[u8]) -> Result<(Extension, &[u8])> {
    let (t, rest) = tag(b)?;
    let (n, rest) = match t {
        tags::FIXEXT1 => (1, rest),
        tags::FIXEXT2 => (2, rest),
        tags::FIXEXT4 => (4, rest),
        tags::FIXEXT8 => (8, rest),
        tags::FIXEXT16 => (16, rest),
        tags::EXT8 => {
            let (h, rest) = take(rest, 1)?;
            (h[0] as usize, rest)
        }
        tags::EXT16 => {
            let (n, rest) = be16(rest)?;
            (n as usize, rest)
        }
        tags::EXT32 => {
            let (n, rest) = be32(rest)?;
            (n as usize, rest)
        }
        _ => return Err(error::type_mismatch(t, "extension")),
    };
    let (ty, rest) = tag(rest)?;
    let (data, rest) = take(rest, n)?;
    Ok((
        Extension {
            typ: ty as i8,
            data: data.to_vec(),
        },
        rest,
    ))
}

/// Skip one complete wire value of any kind, returning the tail.
pub fn skip(b: &[u8]) -> Result<&[u8]> {
    let (t, rest) = tag(b)?;
    match t {
        tags::NIL | tags::TRUE | tags::FALSE => Ok(rest),
        _ if tags::is_posfixint(t) || tags::is_negfixint(t) => Ok(rest),
        tags::U8 | tags::I8 => Ok(take(rest, 1)?.1),
        tags::U16 | tags::I16 => Ok(take(rest, 2)?.1),
        tags::U32 | tags::I32 | tags::F32 => Ok(take(rest, 4)?.1),
        tags::U64 | tags::I64 | tags::F64 => Ok(take(rest, 8)?.1),
        _ if tags::is_fixstr(t) => Ok(take(rest, (t & 0x1f) as usize)?.1),
        tags::STR8 | tags::BIN8 => {
            let (h, rest) = take(rest, 1)?;
            Ok(take(rest, h[0] as usize)?.1)
        }
        tags::STR16 | tags::BIN16 => {
            let (n, rest) = be16(rest)?;
            Ok(take(rest, n as usize)?.1)
        }
        tags::STR32 | tags::BIN32 => {
            let (n, rest) = be32(rest)?;
            Ok(take(rest, n as usize)?.1)
        }
        tags::FIXEXT1 => Ok(take(rest, 2)?.1),
        tags::FIXEXT2 => Ok(take(rest, 3)?.1),
        tags::FIXEXT4 => Ok(take(rest, 5)?.1),
        tags::FIXEXT8 => Ok(take(rest, 9)?.1),
        tags::FIXEXT16 => Ok(take(rest, 17)?.1),
        tags::EXT8 => {
            let (h, rest) = take(rest, 1)?;
            Ok(take(rest, h[0] as usize + 1)?.1)
        }
        tags::EXT16 => {
            let (n, rest) = be16(rest)?;
            Ok(take(rest, n as usize + 1)?.1)
        }
        tags::EXT32 => {
            let (n, rest) = be32(rest)?;
            Ok(take(rest, n as usize + 1)?.1)
        }
        _ if tags::is_fixarray(t) => skip_n(rest, (t & 0x0f) as usize),
        tags::ARRAY16 => {
            let (n, rest) = be16(rest)?;
            skip_n(rest, n as usize)
        }
        tags::ARRAY32 => {
            let (n, rest) = be32(rest)?;
            skip_n(rest, n as usize)
        }
        _ if tags::is_fixmap(t) => skip_n(rest, (t & 0x0f) as usize * 2),
        tags::MAP16 => {
            let (n, rest) = be16(rest)?;
            skip_n(rest, n as usize * 2)
        }
        tags::MAP32 => {
            let (n, rest) = be32(rest)?;
            skip_n(rest, n as usize * 2)
        }
        _ => Err(error::type_mismatch(t, "any value")),
    }
}

fn skip_n(mut b: &[u8], n: usize) -> Result<&[u8]> {
    for _ in 0..n {
        b = skip(b)?;
    }
    Ok(b)
}

#[cfg(test)]
mod tests {
    use {super::*, crate::write::*, proptest::prelude::*};

    #[test]
    fn header_read_matches_write() {
        for n in [0u32, 1, 15, 16, 65535, 65536] {
            let mut o = Vec::new();
            append_map_header(&mut o, n);
            assert_eq!(read_map_header(&o).unwrap(), (n, &[][..]));

            o.clear();
            append_array_header(&mut o, n);
            assert_eq!(read_array_header(&o).unwrap(), (n, &[][..]));
        }
    }

    #[test]
    fn lenient_integer_reads() {
        // Fixints fold the value into the tag byte.
        assert_eq!(read_u32(&[0x07]).unwrap().0, 7);
        assert_eq!(read_i32(&[0xff]).unwrap().0, -1);
        // A u8-tagged value satisfies a wider read.
        assert_eq!(read_u64(&[0xcc, 0x2a]).unwrap().0, 42);
        // Out-of-range narrows fail.
        let err = read_u8(&[0xcd, 0x01, 0x00]).unwrap_err();
        assert!(matches!(err, crate::Error::IntRange(256)));
        // Negative into unsigned fails.
        assert!(read_u64(&[0xff]).is_err());
    }

    #[test]
    fn wrong_tag_reports_mismatch() {
        let err = read_str(&[0xc0]).unwrap_err();
        assert!(matches!(
            err,
            crate::Error::TypeMismatch { got: 0xc0, want: "string" }
        ));
    }

    #[test]
    fn skip_composites() {
        // {"a": [1, "xy"], "b": nil} followed by a trailing bool.
        let mut o = Vec::new();
        append_map_header(&mut o, 2);
        append_str(&mut o, "a");
        append_array_header(&mut o, 2);
        append_u8(&mut o, 1);
        append_str(&mut o, "xy");
        append_str(&mut o, "b");
        append_nil(&mut o);
        append_bool(&mut o, true);

        let rest = skip(&o).unwrap();
        assert_eq!(rest, &[0xc3]);
    }

    #[test]
    fn bin_exact_checks_length() {
        let mut o = Vec::new();
        append_bytes(&mut o, &[1, 2, 3, 4]);
        let mut dst = [0u8; 4];
        assert!(read_bin_exact(&o, &mut dst).unwrap().is_empty());
        assert_eq!(dst, [1, 2, 3, 4]);

        let mut short = [0u8; 3];
        assert!(read_bin_exact(&o, &mut short).is_err());
    }

    proptest! {
        #[test]
        fn str_roundtrip(s in ".{0,300}") {
            let mut o = Vec::new();
            append_str(&mut o, &s);
            let (back, rest) = read_str(&o).unwrap();
            prop_assert_eq!(back, s);
            prop_assert!(rest.is_empty());
        }

        #[test]
        fn u64_roundtrip(v in any::<u64>()) {
            let mut o = Vec::new();
            append_u64(&mut o, v);
            prop_assert_eq!(read_u64(&o).unwrap().0, v);
        }

        #[test]
        fn i64_roundtrip(v in any::<i64>()) {
            let mut o = Vec::new();
            append_i64(&mut o, v);
            prop_assert_eq!(read_i64(&o).unwrap().0, v);
        }

        #[test]
        fn f64_roundtrip(v in any::<f64>()) {
            let mut o = Vec::new();
            append_f64(&mut o, v);
            let got = read_f64(&o).unwrap().0;
            prop_assert_eq!(got.to_bits(), v.to_bits());
        }
    }
}
