//! Dynamically typed wire values.
//!
//! [`Value`] can hold any value the wire format can express, and implements
//! all four codec traits, so schemas can declare opaque positions that
//! round-trip unknown data. Map entries preserve wire order.
use crate::{
    error::{self, Result},
    ext::Extension,
    io::{Reader, Writer},
    read, tags, write, Decode, Encode, Marshal, Unmarshal,
};

#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    #[default]
    Nil,
    Bool(bool),
    Int(i64),
    Uint(u64),
    F32(f32),
    F64(f64),
    Str(String),
    Bin(Vec<u8>),
    Array(Vec<Value>),
    Map(Vec<(String, Value)>),
    Ext(Extension),
}

impl Marshal for Value {
    fn marshal_msg(&self, o: &mut Vec<u8>) -> Result<()> {
        match self {
            Value::Nil => write::append_nil(o),
            Value::Bool(v) => write::append_bool(o, *v),
            Value::Int(v) => write::append_i64(o, *v),
            Value::Uint(v) => write::append_u64(o, *v),
            Value::F32(v) => write::append_f32(o, *v),
            Value::F64(v) => write::append_f64(o, *v),
            Value::Str(v) => write::append_str(o, v),
            Value::Bin(v) => write::append_bytes(o, v),
            Value::Array(els) => {
                write::append_array_header(o, els.len() as u32);
                for el in els {
                    el.marshal_msg(o)?;
                }
            }
            Value::Map(entries) => {
                write::append_map_header(o, entries.len() as u32);
                for (k, v) in entries {
                    write::append_str(o, k);
                    v.marshal_msg(o)?;
                }
            }
            Value::Ext(e) => e.marshal_msg(o)?,
        }
        Ok(())
    }
}

impl Unmarshal for Value {
    fn unmarshal_msg<'a>(&mut self, bts: &'a [u8]) -> Result<&'a [u8]> {
        let t = match bts.first() {
            Some(t) => *t,
            None => return Err(error::short_bytes()),
        };
        match t {
            tags::NIL => {
                *self = Value::Nil;
                read::read_nil(bts)
            }
            tags::TRUE | tags::FALSE => {
                let (v, rest) = read::read_bool(bts)?;
                *self = Value::Bool(v);
                Ok(rest)
            }
            tags::U8 | tags::U16 | tags::U32 | tags::U64 => {
                let (v, rest) = read::read_u64(bts)?;
                *self = Value::Uint(v);
                Ok(rest)
            }
            _ if tags::is_posfixint(t) || tags::is_negfixint(t) => {
                let (v, rest) = read::read_i64(bts)?;
                *self = Value::Int(v);
                Ok(rest)
            }
            tags::I8 | tags::I16 | tags::I32 | tags::I64 => {
                let (v, rest) = read::read_i64(bts)?;
                *self = Value::Int(v);
                Ok(rest)
            }
            tags::F32 => {
                let (v, rest) = read::read_f32(bts)?;
                *self = Value::F32(v);
                Ok(rest)
            }
            tags::F64 => {
                let (v, rest) = read::read_f64(bts)?;
                *self = Value::F64(v);
                Ok(rest)
            }
            _ if tags::is_fixstr(t) => self.unmarshal_str(bts),
            tags::STR8 | tags::STR16 | tags::STR32 => self.unmarshal_str(bts),
            tags::BIN8 | tags::BIN16 | tags::BIN32 => {
                let (v, rest) = read::read_bin(bts)?;
                *self = Value::Bin(v.to_vec());
                Ok(rest)
            }
            _ if tags::is_fixarray(t) => self.unmarshal_array(bts),
            tags::ARRAY16 | tags::ARRAY32 => self.unmarshal_array(bts),
            _ if tags::is_fixmap(t) => self.unmarshal_map(bts),
            tags::MAP16 | tags::MAP32 => self.unmarshal_map(bts),
            tags::EXT8
            | tags::EXT16
            | tags::EXT32
            | tags::FIXEXT1
            | tags::FIXEXT2
            | tags::FIXEXT4
            | tags::FIXEXT8
            | tags::FIXEXT16 => {
                let (e, rest) = read::read_ext(bts)?;
                *self = Value::Ext(e);
                Ok(rest)
            }
            _ => Err(error::type_mismatch(t, "any value")),
        }
    }
}

impl Value {
    fn unmarshal_str<'a>(&mut self, bts: &'a [u8]) -> Result<&'a [u8]> {
        let (v, rest) = read::read_str(bts)?;
        *self = Value::Str(v.to_owned());
        Ok(rest)
    }

    fn unmarshal_array<'a>(&mut self, bts: &'a [u8]) -> Result<&'a [u8]> {
        let (n, mut bts) = read::read_array_header(bts)?;
        let mut els = Vec::with_capacity(n as usize);
        for _ in 0..n {
            let mut el = Value::Nil;
            bts = el.unmarshal_msg(bts)?;
            els.push(el);
        }
        *self = Value::Array(els);
        Ok(bts)
    }

    fn unmarshal_map<'a>(&mut self, bts: &'a [u8]) -> Result<&'a [u8]> {
        let (n, mut bts) = read::read_map_header(bts)?;
        let mut entries = Vec::with_capacity(n as usize);
        for _ in 0..n {
            let key;
            {
                let (k, rest) = read::read_str(bts)?;
                key = k.to_owned();
                bts = rest;
            }
            let mut val = Value::Nil;
            bts = val.unmarshal_msg(bts)?;
            entries.push((key, val));
        }
        *self = Value::Map(entries);
        Ok(bts)
    }
}

impl Encode for Value {
    fn encode_msg<W: std::io::Write>(&self, w: &mut Writer<W>) -> Result<()> {
        // One value is one contiguous byte run; reuse the append form.
        let mut o = Vec::new();
        self.marshal_msg(&mut o)?;
        w.append(&o)
    }
}

impl Decode for Value {
    fn decode_msg<R: std::io::Read>(&mut self, r: &mut Reader<R>) -> Result<()> {
        let t = r.peek_tag()?;
        match t {
            tags::NIL => {
                r.read_nil()?;
                *self = Value::Nil;
            }
            tags::TRUE | tags::FALSE => *self = Value::Bool(r.read_bool()?),
            tags::U8 | tags::U16 | tags::U32 | tags::U64 => *self = Value::Uint(r.read_u64()?),
            _ if tags::is_posfixint(t) || tags::is_negfixint(t) => {
                *self = Value::Int(r.read_i64()?)
            }
            tags::I8 | tags::I16 | tags::I32 | tags::I64 => *self = Value::Int(r.read_i64()?),
            tags::F32 => *self = Value::F32(r.read_f32()?),
            tags::F64 => *self = Value::F64(r.read_f64()?),
            _ if tags::is_fixstr(t) => *self = Value::Str(r.read_str()?),
            tags::STR8 | tags::STR16 | tags::STR32 => *self = Value::Str(r.read_str()?),
            tags::BIN8 | tags::BIN16 | tags::BIN32 => *self = Value::Bin(r.read_bin()?),
            _ if tags::is_fixarray(t) => self.decode_array(r)?,
            tags::ARRAY16 | tags::ARRAY32 => self.decode_array(r)?,
            _ if tags::is_fixmap(t) => self.decode_map(r)?,
            tags::MAP16 | tags::MAP32 => self.decode_map(r)?,
            tags::EXT8
            | tags::EXT16
            | tags::EXT32
            | tags::FIXEXT1
            | tags::FIXEXT2
            | tags::FIXEXT4
            | tags::FIXEXT8
            | tags::FIXEXT16 => *self = Value::Ext(r.read_ext()?),
            _ => return Err(error::type_mismatch(t, "any value")),
        }
        Ok(())
    }
}

impl Value {
    fn decode_array<R: std::io::Read>(&mut self, r: &mut Reader<R>) -> Result<()> {
        let n = r.read_array_header()?;
        let mut els = Vec::with_capacity(n as usize);
        for _ in 0..n {
            let mut el = Value::Nil;
            el.decode_msg(r)?;
            els.push(el);
        }
        *self = Value::Array(els);
        Ok(())
    }

    fn decode_map<R: std::io::Read>(&mut self, r: &mut Reader<R>) -> Result<()> {
        let n = r.read_map_header()?;
        let mut entries = Vec::with_capacity(n as usize);
        for _ in 0..n {
            let key = r.read_str()?;
            let mut val = Value::Nil;
            val.decode_msg(r)?;
            entries.push((key, val));
        }
        *self = Value::Map(entries);
        Ok(())
    }
}
