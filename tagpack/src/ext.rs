//! Extension values and the complex wire kinds.
use crate::{
    error::Result,
    io::{Reader, Writer},
    read, tags, Decode, Encode, Marshal, Unmarshal,
};

/// A raw extension value: an application-defined type code and payload.
///
/// Lengths of 1, 2, 4, 8, and 16 bytes use the fixext forms; anything else
/// is length-prefixed with the narrowest ext size class.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Extension {
    pub typ: i8,
    pub data: Vec<u8>,
}

/// Append an extension value, header plus payload.
pub fn append_ext(o: &mut Vec<u8>, e: &Extension) {
    let n = e.data.len();
    match n {
        1 => o.push(tags::FIXEXT1),
        2 => o.push(tags::FIXEXT2),
        4 => o.push(tags::FIXEXT4),
        8 => o.push(tags::FIXEXT8),
        16 => o.push(tags::FIXEXT16),
        _ if n <= u8::MAX as usize => {
            o.push(tags::EXT8);
            o.push(n as u8);
        }
        _ if n <= u16::MAX as usize => {
            o.push(tags::EXT16);
            o.extend_from_slice(&(n as u16).to_be_bytes());
        }
        _ => {
            o.push(tags::EXT32);
            o.extend_from_slice(&(n as u32).to_be_bytes());
        }
    }
    o.push(e.typ as u8);
    o.extend_from_slice(&e.data);
}

impl Marshal for Extension {
    fn marshal_msg(&self, o: &mut Vec<u8>) -> Result<()> {
        append_ext(o, self);
        Ok(())
    }
}

impl Unmarshal for Extension {
    fn unmarshal_msg<'a>(&mut self, bts: &'a [u8]) -> Result<&'a [u8]> {
        let (e, rest) = read::read_ext(bts)?;
        *self = e;
        Ok(rest)
    }
}

impl Encode for Extension {
    fn encode_msg<W: std::io::Write>(&self, w: &mut Writer<W>) -> Result<()> {
        w.write_ext(self)
    }
}

impl Decode for Extension {
    fn decode_msg<R: std::io::Read>(&mut self, r: &mut Reader<R>) -> Result<()> {
        *self = r.read_ext()?;
        Ok(())
    }
}

/// A complex number with `f32` components; extension type 3 on the wire.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Complex64 {
    pub re: f32,
    pub im: f32,
}

impl Complex64 {
    pub const ZERO: Complex64 = Complex64 { re: 0.0, im: 0.0 };
}

/// A complex number with `f64` components; extension type 4 on the wire.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Complex128 {
    pub re: f64,
    pub im: f64,
}

impl Complex128 {
    pub const ZERO: Complex128 = Complex128 { re: 0.0, im: 0.0 };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ext_size_classes() {
        let fix = Extension { typ: 7, data: vec![0xaa; 8] };
        let mut o = Vec::new();
        append_ext(&mut o, &fix);
        assert_eq!(&o[..2], &[0xd7, 7]);

        let odd = Extension { typ: -1, data: vec![1, 2, 3] };
        o.clear();
        append_ext(&mut o, &odd);
        assert_eq!(&o[..3], &[0xc7, 3, 0xff]);

        let big = Extension { typ: 2, data: vec![0; 300] };
        o.clear();
        append_ext(&mut o, &big);
        assert_eq!(&o[..4], &[0xc8, 0x01, 0x2c, 2]);
    }

    #[test]
    fn ext_roundtrip() {
        for data in [vec![], vec![9], vec![1; 5], vec![2; 16], vec![3; 257]] {
            let e = Extension { typ: 12, data };
            let mut o = Vec::new();
            append_ext(&mut o, &e);
            let (back, rest) = crate::read::read_ext(&o).unwrap();
            assert_eq!(back, e);
            assert!(rest.is_empty());
        }
    }

    #[test]
    fn complex_roundtrip() {
        let v = Complex64 { re: 1.5, im: -2.25 };
        let mut o = Vec::new();
        crate::write::append_complex64(&mut o, v);
        assert_eq!(crate::read::read_complex64(&o).unwrap().0, v);

        let w = Complex128 { re: 0.0, im: 3.5 };
        o.clear();
        crate::write::append_complex128(&mut o, w);
        assert_eq!(crate::read::read_complex128(&o).unwrap().0, w);
    }
}
