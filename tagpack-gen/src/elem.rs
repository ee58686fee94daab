//! The type model: a tree of `Elem` nodes describing one schema position.
//!
//! The front end (attribute parsing, type resolution) builds this graph and
//! hands it over immutable; the generators only read it. Dispatch over the
//! variants is an exhaustive `match` in each generator.
use {
    proc_macro2::Span,
    syn::{Ident, Path},
};

/// One node in the schema graph.
#[derive(Clone, Debug)]
pub enum Elem {
    Base(BaseElem),
    Record(Record),
    Map(MapElem),
    Seq(Box<Elem>),
    Array(ArrayElem),
    Nullable(Box<Elem>),
}

impl Elem {
    pub fn base(value: BaseType) -> Elem {
        Elem::Base(BaseElem::new(value))
    }

    pub fn seq(els: Elem) -> Elem {
        Elem::Seq(Box::new(els))
    }

    pub fn nullable(inner: Elem) -> Elem {
        Elem::Nullable(Box::new(inner))
    }

    /// False only for nodes the front end deliberately hid. Hidden nodes are
    /// skipped silently; an empty record is still printable.
    pub fn printable(&self) -> bool {
        match self {
            Elem::Base(b) => !b.hidden,
            Elem::Record(_) => true,
            Elem::Map(m) => m.value.printable(),
            Elem::Seq(e) | Elem::Nullable(e) => e.printable(),
            Elem::Array(a) => a.els.printable(),
        }
    }

    /// True if marshaling this elem can fail at run time (delegation or a
    /// fallible shim somewhere in the subtree). Drives whether loops need an
    /// index variable for diagnostic paths.
    pub(crate) fn fallible_marshal(&self) -> bool {
        match self {
            Elem::Base(b) => {
                matches!(b.value, BaseType::Ident(_) | BaseType::Intf | BaseType::Ext)
                    || matches!(
                        b.shim,
                        Some(Shim {
                            kind: ShimKind::Fallible,
                            ..
                        })
                    )
            }
            Elem::Record(r) => r.live_fields().iter().any(|f| f.elem.fallible_marshal()),
            Elem::Map(m) => m.value.fallible_marshal(),
            Elem::Seq(e) | Elem::Nullable(e) => e.fallible_marshal(),
            Elem::Array(a) => a.els.fallible_marshal(),
        }
    }
}

/// Wire kinds a leaf can take.
#[derive(Clone, Debug, PartialEq)]
pub enum BaseType {
    Bool,
    U8,
    U16,
    U32,
    U64,
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
    Complex64,
    Complex128,
    Str,
    Bytes,
    /// A named type with its own generated (or hand-written) codec.
    Ident(Path),
    /// A dynamically typed position (`tagpack::Value`).
    Intf,
    /// A raw extension value (`tagpack::Extension`).
    Ext,
}

impl BaseType {
    /// Runtime function suffix for the scalar kinds
    /// (`append_u32`, `read_u32`, `write_u32`, ...).
    pub(crate) fn scalar_suffix(&self) -> Option<&'static str> {
        Some(match self {
            BaseType::Bool => "bool",
            BaseType::U8 => "u8",
            BaseType::U16 => "u16",
            BaseType::U32 => "u32",
            BaseType::U64 => "u64",
            BaseType::I8 => "i8",
            BaseType::I16 => "i16",
            BaseType::I32 => "i32",
            BaseType::I64 => "i64",
            BaseType::F32 => "f32",
            BaseType::F64 => "f64",
            BaseType::Complex64 => "complex64",
            BaseType::Complex128 => "complex128",
            _ => return None,
        })
    }
}

/// A leaf node: a primitive wire kind plus an optional conversion shim.
#[derive(Clone, Debug)]
pub struct BaseElem {
    pub value: BaseType,
    pub shim: Option<Shim>,
    /// Front-end signal: this position could not be resolved and must be
    /// skipped (silently) during generation.
    pub hidden: bool,
}

impl BaseElem {
    pub fn new(value: BaseType) -> BaseElem {
        BaseElem {
            value,
            shim: None,
            hidden: false,
        }
    }

    /// The kind that actually crosses the wire (the shim target if a shim is
    /// declared, otherwise the declared kind).
    pub(crate) fn wire_kind(&self) -> &BaseType {
        match &self.shim {
            Some(s) => &s.wire,
            None => &self.value,
        }
    }
}

/// Whether a shim is a pure representation cast or can fail.
///
/// Pure shims are plain function calls; fallible shims return
/// `tagpack::Result` and the generated code propagates their failure with
/// the diagnostic path of the position being converted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShimKind {
    Pure,
    Fallible,
}

/// A named base-type coercion applied before/after the wire operation.
#[derive(Clone, Debug)]
pub struct Shim {
    /// Wire-side kind; must not itself be a delegating kind.
    pub wire: BaseType,
    pub kind: ShimKind,
    /// `fn(&T) -> Wire` (pure) or `fn(&T) -> tagpack::Result<Wire>`.
    pub into_wire: Path,
    /// `fn(Wire) -> T` (pure) or `fn(Wire) -> tagpack::Result<T>`.
    pub from_wire: Path,
}

/// A composite with a fixed, ordered set of named fields.
#[derive(Clone, Debug)]
pub struct Record {
    pub fields: Vec<Field>,
    /// Positional mode: encode as a plain array in declared order, no keys.
    pub positional: bool,
}

impl Record {
    pub fn keyed(fields: Vec<Field>) -> Record {
        Record {
            fields,
            positional: false,
        }
    }

    pub fn positional(fields: Vec<Field>) -> Record {
        Record {
            fields,
            positional: true,
        }
    }

    /// Fields that take part in generation: not skipped by the front end and
    /// printable.
    pub(crate) fn live_fields(&self) -> Vec<&Field> {
        self.fields
            .iter()
            .filter(|f| !f.skip && f.elem.printable())
            .collect()
    }
}

/// One record field.
#[derive(Clone, Debug)]
pub struct Field {
    /// Rust-side member name.
    pub name: Ident,
    /// Wire key; unique within the record.
    pub tag: String,
    /// Parsed directive tokens; unrecognized tokens are ignored.
    pub directives: Vec<String>,
    pub elem: Elem,
    /// Front-end signal: omit this field from generation entirely.
    pub skip: bool,
}

impl Field {
    pub fn new(name: &str, tag: &str, elem: Elem) -> Field {
        Field {
            name: Ident::new(name, Span::call_site()),
            tag: tag.to_owned(),
            directives: Vec::new(),
            elem,
            skip: false,
        }
    }

    pub fn with_directives(mut self, dirs: &[&str]) -> Field {
        self.directives = dirs.iter().map(|d| (*d).to_owned()).collect();
        self
    }
}

/// A homogeneous map; keys are always wire strings. Traversal variables are
/// generator-assigned so nested maps never shadow each other.
#[derive(Clone, Debug)]
pub struct MapElem {
    pub value: Box<Elem>,
}

impl MapElem {
    pub fn new(value: Elem) -> MapElem {
        MapElem {
            value: Box::new(value),
        }
    }
}

/// A fixed-length homogeneous collection. A `U8`-valued array is encoded as
/// one binary blob instead of element-by-element.
#[derive(Clone, Debug)]
pub struct ArrayElem {
    pub size: usize,
    pub els: Box<Elem>,
}

impl ArrayElem {
    pub fn new(size: usize, els: Elem) -> ArrayElem {
        ArrayElem {
            size,
            els: Box::new(els),
        }
    }

    pub(crate) fn is_bytes(&self) -> bool {
        matches!(&*self.els, Elem::Base(b) if b.shim.is_none() && b.value == BaseType::U8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hidden_leaves_are_unprintable() {
        let mut b = BaseElem::new(BaseType::Str);
        b.hidden = true;
        assert!(!Elem::Base(b).printable());
        assert!(Elem::base(BaseType::Str).printable());
        // An empty record is still printable.
        assert!(Elem::Record(Record::keyed(vec![])).printable());
    }

    #[test]
    fn live_fields_drop_skipped_and_hidden() {
        let mut hidden = BaseElem::new(BaseType::U32);
        hidden.hidden = true;
        let mut skipped = Field::new("b", "b", Elem::base(BaseType::U32));
        skipped.skip = true;

        let rec = Record::keyed(vec![
            Field::new("a", "a", Elem::base(BaseType::Str)),
            skipped,
            Field::new("c", "c", Elem::Base(hidden)),
            Field::new("d", "d", Elem::base(BaseType::Bool)),
        ]);
        let live: Vec<_> = rec.live_fields().iter().map(|f| f.tag.clone()).collect();
        assert_eq!(live, ["a", "d"]);
    }

    #[test]
    fn byte_arrays_are_distinguished() {
        assert!(ArrayElem::new(4, Elem::base(BaseType::U8)).is_bytes());
        assert!(!ArrayElem::new(4, Elem::base(BaseType::U16)).is_bytes());
    }
}
