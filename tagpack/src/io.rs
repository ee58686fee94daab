//! Streaming [`Writer`] and [`Reader`] for the wire format.
//!
//! These wrap any [`std::io::Write`] / [`std::io::Read`] and expose the same
//! families of operations as the in-memory [`write`](crate::write) and
//! [`read`](crate::read) modules. The writer buffers internally so that the
//! many small appends a generated codec produces do not each hit the
//! underlying stream; callers must [`Writer::flush`] when done. The reader
//! performs small exact reads and is best paired with a buffered source.
use crate::{
    error::{self, Error, Result},
    ext::{append_ext, Complex128, Complex64, Extension},
    tags, write,
};

const WRITER_BUF_SIZE: usize = 2048;

/// Buffered streaming encoder.
pub struct Writer<W: std::io::Write> {
    inner: W,
    buf: Vec<u8>,
    threshold: usize,
}

impl<W: std::io::Write> Writer<W> {
    pub fn new(inner: W) -> Self {
        Self::with_capacity(inner, WRITER_BUF_SIZE)
    }

    pub fn with_capacity(inner: W, capacity: usize) -> Self {
        Writer {
            inner,
            buf: Vec::with_capacity(capacity),
            threshold: capacity.max(1),
        }
    }

    /// Append raw, already-encoded bytes.
    #[inline]
    pub fn append(&mut self, b: &[u8]) -> Result<()> {
        self.buf.extend_from_slice(b);
        self.maybe_flush()
    }

    #[inline]
    fn maybe_flush(&mut self) -> Result<()> {
        if self.buf.len() >= self.threshold {
            self.flush_buf()?;
        }
        Ok(())
    }

    fn flush_buf(&mut self) -> Result<()> {
        if !self.buf.is_empty() {
            self.inner.write_all(&self.buf)?;
            self.buf.clear();
        }
        Ok(())
    }

    /// Flush buffered bytes and the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        self.flush_buf()?;
        self.inner.flush()?;
        Ok(())
    }

    /// Flush and return the underlying stream.
    pub fn into_inner(mut self) -> Result<W> {
        self.flush_buf()?;
        Ok(self.inner)
    }

    #[inline]
    pub fn write_map_header(&mut self, n: u32) -> Result<()> {
        write::append_map_header(&mut self.buf, n);
        self.maybe_flush()
    }

    #[inline]
    pub fn write_array_header(&mut self, n: u32) -> Result<()> {
        write::append_array_header(&mut self.buf, n);
        self.maybe_flush()
    }

    #[inline]
    pub fn write_str(&mut self, s: &str) -> Result<()> {
        write::append_str(&mut self.buf, s);
        self.maybe_flush()
    }

    #[inline]
    pub fn write_bytes(&mut self, b: &[u8]) -> Result<()> {
        write::append_bytes(&mut self.buf, b);
        self.maybe_flush()
    }

    #[inline]
    pub fn write_nil(&mut self) -> Result<()> {
        write::append_nil(&mut self.buf);
        self.maybe_flush()
    }

    #[inline]
    pub fn write_ext(&mut self, e: &Extension) -> Result<()> {
        append_ext(&mut self.buf, e);
        self.maybe_flush()
    }
}

macro_rules! writer_scalars {
    ($(($name:ident, $ty:ty, $append:path)),* $(,)?) => {
        impl<W: std::io::Write> Writer<W> {
            $(
                #[inline]
                pub fn $name(&mut self, v: $ty) -> Result<()> {
                    $append(&mut self.buf, v);
                    self.maybe_flush()
                }
            )*
        }
    };
}

writer_scalars!(
    (write_bool, bool, write::append_bool),
    (write_u8, u8, write::append_u8),
    (write_u16, u16, write::append_u16),
    (write_u32, u32, write::append_u32),
    (write_u64, u64, write::append_u64),
    (write_i8, i8, write::append_i8),
    (write_i16, i16, write::append_i16),
    (write_i32, i32, write::append_i32),
    (write_i64, i64, write::append_i64),
    (write_f32, f32, write::append_f32),
    (write_f64, f64, write::append_f64),
    (write_complex64, Complex64, write::append_complex64),
    (write_complex128, Complex128, write::append_complex128),
);

/// Streaming decoder with one byte of lookahead (for nil probing).
pub struct Reader<R: std::io::Read> {
    inner: R,
    peeked: Option<u8>,
}

impl<R: std::io::Read> Reader<R> {
    pub fn new(inner: R) -> Self {
        Reader { inner, peeked: None }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    #[inline]
    fn byte(&mut self) -> Result<u8> {
        if let Some(t) = self.peeked.take() {
            return Ok(t);
        }
        let mut b = [0u8; 1];
        self.inner.read_exact(&mut b)?;
        Ok(b[0])
    }

    #[inline]
    fn fill<const N: usize>(&mut self) -> Result<[u8; N]> {
        debug_assert!(self.peeked.is_none());
        let mut b = [0u8; N];
        self.inner.read_exact(&mut b)?;
        Ok(b)
    }

    fn fill_vec(&mut self, n: usize) -> Result<Vec<u8>> {
        debug_assert!(self.peeked.is_none());
        let mut v = vec![0u8; n];
        self.inner.read_exact(&mut v)?;
        Ok(v)
    }

    fn discard(&mut self, n: usize) -> Result<()> {
        let copied = std::io::copy(
            &mut std::io::Read::take(&mut self.inner, n as u64),
            &mut std::io::sink(),
        )?;
        if copied != n as u64 {
            return Err(error::short_bytes());
        }
        Ok(())
    }

    /// Look at the next tag byte without consuming it.
    #[inline]
    pub fn peek_tag(&mut self) -> Result<u8> {
        match self.peeked {
            Some(t) => Ok(t),
            None => {
                let mut b = [0u8; 1];
                self.inner.read_exact(&mut b)?;
                self.peeked = Some(b[0]);
                Ok(b[0])
            }
        }
    }

    /// True if the next value is the nil marker. Does not consume it.
    #[inline]
    pub fn is_nil(&mut self) -> Result<bool> {
        Ok(self.peek_tag()? == tags::NIL)
    }

    pub fn read_map_header(&mut self) -> Result<u32> {
        let t = self.byte()?;
        match t {
            _ if tags::is_fixmap(t) => Ok((t & 0x0f) as u32),
            tags::MAP16 => Ok(u16::from_be_bytes(self.fill()?) as u32),
            tags::MAP32 => Ok(u32::from_be_bytes(self.fill()?)),
            _ => Err(error::type_mismatch(t, "map header")),
        }
    }

    pub fn read_array_header(&mut self) -> Result<u32> {
        let t = self.byte()?;
        match t {
            _ if tags::is_fixarray(t) => Ok((t & 0x0f) as u32),
            tags::ARRAY16 => Ok(u16::from_be_bytes(self.fill()?) as u32),
            tags::ARRAY32 => Ok(u32::from_be_bytes(self.fill()?)),
            _ => Err(error::type_mismatch(t, "array header")),
        }
    }

    fn str_len(&mut self) -> Result<usize> {
        let t = self.byte()?;
        match t {
            _ if tags::is_fixstr(t) => Ok((t & 0x1f) as usize),
            tags::STR8 => Ok(self.fill::<1>()?[0] as usize),
            tags::STR16 => Ok(u16::from_be_bytes(self.fill()?) as usize),
            tags::STR32 => Ok(u32::from_be_bytes(self.fill()?) as usize),
            _ => Err(error::type_mismatch(t, "string")),
        }
    }

    pub fn read_str(&mut self) -> Result<String> {
        let n = self.str_len()?;
        let raw = self.fill_vec(n)?;
        String::from_utf8(raw).map_err(|e| Error::Utf8(e.utf8_error()))
    }

    fn bin_len(&mut self) -> Result<usize> {
        let t = self.byte()?;
        match t {
            tags::BIN8 => Ok(self.fill::<1>()?[0] as usize),
            tags::BIN16 => Ok(u16::from_be_bytes(self.fill()?) as usize),
            tags::BIN32 => Ok(u32::from_be_bytes(self.fill()?) as usize),
            _ => Err(error::type_mismatch(t, "binary")),
        }
    }

    pub fn read_bin(&mut self) -> Result<Vec<u8>> {
        let n = self.bin_len()?;
        self.fill_vec(n)
    }

    /// Read a binary blob whose length must equal `dst.len()`.
    pub fn read_bin_exact(&mut self, dst: &mut [u8]) -> Result<()> {
        let n = self.bin_len()?;
        if n != dst.len() {
            return Err(error::array_size(dst.len() as u32, n as u32));
        }
        self.inner.read_exact(dst)?;
        Ok(())
    }

    pub fn read_nil(&mut self) -> Result<()> {
        let t = self.byte()?;
        if t != tags::NIL {
            return Err(error::type_mismatch(t, "nil"));
        }
        Ok(())
    }

    pub fn read_bool(&mut self) -> Result<bool> {
        let t = self.byte()?;
        match t {
            tags::TRUE => Ok(true),
            tags::FALSE => Ok(false),
            _ => Err(error::type_mismatch(t, "bool")),
        }
    }

    /// Read any integer form as an `i64`; same leniency as the slice reader.
    pub fn read_i64(&mut self) -> Result<i64> {
        let t = self.byte()?;
        match t {
            _ if tags::is_posfixint(t) => Ok(t as i64),
            _ if tags::is_negfixint(t) => Ok(t as i8 as i64),
            tags::U8 => Ok(self.fill::<1>()?[0] as i64),
            tags::U16 => Ok(u16::from_be_bytes(self.fill()?) as i64),
            tags::U32 => Ok(u32::from_be_bytes(self.fill()?) as i64),
            tags::U64 => {
                let v = u64::from_be_bytes(self.fill()?);
                i64::try_from(v).map_err(|_| error::int_range(v as i128))
            }
            tags::I8 => Ok(self.fill::<1>()?[0] as i8 as i64),
            tags::I16 => Ok(i16::from_be_bytes(self.fill()?) as i64),
            tags::I32 => Ok(i32::from_be_bytes(self.fill()?) as i64),
            tags::I64 => Ok(i64::from_be_bytes(self.fill()?)),
            _ => Err(error::type_mismatch(t, "integer")),
        }
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        if self.peek_tag()? == tags::U64 {
            let _ = self.byte()?;
            return Ok(u64::from_be_bytes(self.fill()?));
        }
        let v = self.read_i64()?;
        u64::try_from(v).map_err(|_| error::int_range(v as i128))
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        let t = self.byte()?;
        if t != tags::F32 {
            return Err(error::type_mismatch(t, "f32"));
        }
        Ok(f32::from_bits(u32::from_be_bytes(self.fill()?)))
    }

    pub fn read_f64(&mut self) -> Result<f64> {
        let t = self.byte()?;
        match t {
            tags::F64 => Ok(f64::from_bits(u64::from_be_bytes(self.fill()?))),
            tags::F32 => Ok(f32::from_bits(u32::from_be_bytes(self.fill()?)) as f64),
            _ => Err(error::type_mismatch(t, "f64")),
        }
    }

    pub fn read_complex64(&mut self) -> Result<Complex64> {
        let t = self.byte()?;
        if t != tags::FIXEXT8 {
            return Err(error::type_mismatch(t, "complex64"));
        }
        let ty = self.byte()? as i8;
        if ty != tags::COMPLEX64_EXT {
            return Err(error::ext_type(tags::COMPLEX64_EXT, ty));
        }
        Ok(Complex64 {
            re: f32::from_bits(u32::from_be_bytes(self.fill()?)),
            im: f32::from_bits(u32::from_be_bytes(self.fill()?)),
        })
    }

    pub fn read_complex128(&mut self) -> Result<Complex128> {
        let t = self.byte()?;
        if t != tags::FIXEXT16 {
            return Err(error::type_mismatch(t, "complex128"));
        }
        let ty = self.byte()? as i8;
        if ty != tags::COMPLEX128_EXT {
            return Err(error::ext_type(tags::COMPLEX128_EXT, ty));
        }
        Ok(Complex128 {
            re: f64::from_bits(u64::from_be_bytes(self.fill()?)),
            im: f64::from_bits(u64::from_be_bytes(self.fill()?)),
        })
    }

    pub fn read_ext(&mut self) -> Result<Extension> {
        let t = self.byte()?;
        let n = match t {
            tags::FIXEXT1 => 1,
            tags::FIXEXT2 => 2,
            tags::FIXEXT4 => 4,
            tags::FIXEXT8 => 8,
            tags::FIXEXT16 => 16,
            tags::EXT8 => self.fill::<1>()?[0] as usize,
            tags::EXT16 => u16::from_be_bytes(self.fill()?) as usize,
            tags::EXT32 => u32::from_be_bytes(self.fill()?) as usize,
            _ => return Err(error::type_mismatch(t, "extension")),
        };
        let typ = self.byte()? as i8;
        let data = self.fill_vec(n)?;
        Ok(Extension { typ, data })
    }

    /// Skip one complete wire value of any kind.
    pub fn skip(&mut self) -> Result<()> {
        let t = self.byte()?;
        match t {
            tags::NIL | tags::TRUE | tags::FALSE => Ok(()),
            _ if tags::is_posfixint(t) || tags::is_negfixint(t) => Ok(()),
            tags::U8 | tags::I8 => self.discard(1),
            tags::U16 | tags::I16 => self.discard(2),
            tags::U32 | tags::I32 | tags::F32 => self.discard(4),
            tags::U64 | tags::I64 | tags::F64 => self.discard(8),
            _ if tags::is_fixstr(t) => self.discard((t & 0x1f) as usize),
            tags::STR8 | tags::BIN8 => {
                let n = self.fill::<1>()?[0] as usize;
                self.discard(n)
            }
            tags::STR16 | tags::BIN16 => {
                let n = u16::from_be_bytes(self.fill()?) as usize;
                self.discard(n)
            }
            tags::STR32 | tags::BIN32 => {
                let n = u32::from_be_bytes(self.fill()?) as usize;
                self.discard(n)
            }
            tags::FIXEXT1 => self.discard(2),
            tags::FIXEXT2 => self.discard(3),
            tags::FIXEXT4 => self.discard(5),
            tags::FIXEXT8 => self.discard(9),
            tags::FIXEXT16 => self.discard(17),
            tags::EXT8 => {
                let n = self.fill::<1>()?[0] as usize;
                self.discard(n + 1)
            }
            tags::EXT16 => {
                let n = u16::from_be_bytes(self.fill()?) as usize;
                self.discard(n + 1)
            }
            tags::EXT32 => {
                let n = u32::from_be_bytes(self.fill()?) as usize;
                self.discard(n + 1)
            }
            _ if tags::is_fixarray(t) => self.skip_n((t & 0x0f) as usize),
            tags::ARRAY16 => {
                let n = u16::from_be_bytes(self.fill()?) as usize;
                self.skip_n(n)
            }
            tags::ARRAY32 => {
                let n = u32::from_be_bytes(self.fill()?) as usize;
                self.skip_n(n)
            }
            _ if tags::is_fixmap(t) => self.skip_n((t & 0x0f) as usize * 2),
            tags::MAP16 => {
                let n = u16::from_be_bytes(self.fill()?) as usize;
                self.skip_n(n * 2)
            }
            tags::MAP32 => {
                let n = u32::from_be_bytes(self.fill()?) as usize;
                self.skip_n(n * 2)
            }
            _ => Err(error::type_mismatch(t, "any value")),
        }
    }

    fn skip_n(&mut self, n: usize) -> Result<()> {
        for _ in 0..n {
            self.skip()?;
        }
        Ok(())
    }
}

macro_rules! reader_narrowing {
    ($(($name:ident, $ty:ty, $wide:ident)),* $(,)?) => {
        impl<R: std::io::Read> Reader<R> {
            $(
                #[inline]
                pub fn $name(&mut self) -> Result<$ty> {
                    let v = self.$wide()?;
                    <$ty>::try_from(v).map_err(|_| error::int_range(v as i128))
                }
            )*
        }
    };
}

reader_narrowing!(
    (read_u8, u8, read_u64),
    (read_u16, u16, read_u64),
    (read_u32, u32, read_u64),
    (read_i8, i8, read_i64),
    (read_i16, i16, read_i64),
    (read_i32, i32, read_i64),
);

#[cfg(test)]
mod tests {
    use {super::*, std::io::Cursor};

    #[test]
    fn writer_matches_append_forms() {
        let mut o = Vec::new();
        write::append_map_header(&mut o, 2);
        write::append_str(&mut o, "k");
        write::append_u32(&mut o, 9);
        write::append_str(&mut o, "b");
        write::append_bool(&mut o, false);

        let mut w = Writer::new(Vec::new());
        w.write_map_header(2).unwrap();
        w.write_str("k").unwrap();
        w.write_u32(9).unwrap();
        w.write_str("b").unwrap();
        w.write_bool(false).unwrap();
        assert_eq!(w.into_inner().unwrap(), o);
    }

    #[test]
    fn writer_flushes_across_threshold() {
        let mut w = Writer::with_capacity(Vec::new(), 4);
        for i in 0..64 {
            w.write_u8(i).unwrap();
        }
        let out = w.into_inner().unwrap();
        assert_eq!(out.len(), 128);
        let mut r = Reader::new(Cursor::new(out));
        for i in 0..64 {
            assert_eq!(r.read_u8().unwrap(), i);
        }
    }

    #[test]
    fn reader_peek_does_not_consume() {
        let mut o = Vec::new();
        write::append_nil(&mut o);
        write::append_u8(&mut o, 3);
        let mut r = Reader::new(Cursor::new(o));
        assert!(r.is_nil().unwrap());
        assert!(r.is_nil().unwrap());
        r.read_nil().unwrap();
        assert!(!r.is_nil().unwrap());
        assert_eq!(r.read_u8().unwrap(), 3);
    }

    #[test]
    fn reader_skip_composite() {
        let mut o = Vec::new();
        write::append_array_header(&mut o, 3);
        write::append_str(&mut o, "abc");
        write::append_map_header(&mut o, 1);
        write::append_str(&mut o, "k");
        write::append_i64(&mut o, -5);
        write::append_nil(&mut o);
        write::append_u16(&mut o, 700);

        let mut r = Reader::new(Cursor::new(o));
        r.skip().unwrap();
        assert_eq!(r.read_u16().unwrap(), 700);
    }

    #[test]
    fn reader_str_and_bin() {
        let mut o = Vec::new();
        write::append_str(&mut o, "teststr");
        write::append_bytes(&mut o, &[1, 2, 3]);
        let mut r = Reader::new(Cursor::new(o));
        assert_eq!(r.read_str().unwrap(), "teststr");
        assert_eq!(r.read_bin().unwrap(), vec![1, 2, 3]);
    }
}
