//! Schema-driven code generation for the `tagpack` wire format.
//!
//! A schema is a tree of [`elem::Elem`] nodes; for each named type the four
//! generators produce ordinary Rust implementing the runtime's codec traits:
//!
//! * [`marshal`] — `tagpack::Marshal`, appending to a `Vec<u8>`;
//! * [`unmarshal`] — `tagpack::Unmarshal`, reading from a byte slice and
//!   returning the unread tail;
//! * [`encode`] — `tagpack::Encode`, writing through a buffered
//!   `tagpack::io::Writer`;
//! * [`decode`] — `tagpack::Decode`, reading from a `tagpack::io::Reader`.
//!
//! Output is a [`proc_macro2::TokenStream`], so the generators slot into a
//! derive macro or a build-script front end unchanged.
//!
//! Generated writers coalesce statically known bytes (headers, field keys)
//! into single runs, and records can drop empty fields per the `omitempty`
//! family of tag directives; see the module docs for the mechanics.
//!
//! ```
//! use tagpack_gen::elem::{BaseType, Elem, Field, Record};
//!
//! let schema = Elem::Record(Record::keyed(vec![
//!     Field::new("x", "x", Elem::base(BaseType::I32)),
//!     Field::new("y", "y", Elem::base(BaseType::I32)),
//! ]));
//! let name = syn::Ident::new("Point", proc_macro2::Span::call_site());
//! let code = tagpack_gen::generate_all(&name, &schema);
//! assert!(code.to_string().contains("impl :: tagpack :: Marshal for Point"));
//! ```

pub mod elem;

mod bitmask;
mod fuse;
mod gensym;
mod header;
mod omitempty;
mod path;

pub mod decode;
pub mod encode;
pub mod marshal;
pub mod unmarshal;

use {proc_macro2::TokenStream, syn::Ident};

/// Generate all four trait impls for `name`. Hidden schemas produce no
/// output.
pub fn generate_all(name: &Ident, elem: &Elem) -> TokenStream {
    let mut out = TokenStream::new();
    out.extend(marshal::generate(name, elem));
    out.extend(unmarshal::generate(name, elem));
    out.extend(encode::generate(name, elem));
    out.extend(decode::generate(name, elem));
    out
}

pub use elem::Elem;
