//! The slice unmarshaler: `impl tagpack::Unmarshal` threading the unread
//! tail through every read.
//!
//! Each read takes the current slice and yields the value plus the remaining
//! tail; the generated code rebinds `bts` after every step so a failure
//! leaves no half-consumed state visible to the caller.
use {
    crate::{
        bitmask::MaskPlan,
        elem::{ArrayElem, BaseElem, BaseType, Elem, MapElem, Record, ShimKind},
        gensym::Gensym,
        omitempty,
        path::Path,
    },
    proc_macro2::TokenStream,
    quote::{format_ident, quote},
    syn::Ident,
};

/// Generate `impl tagpack::Unmarshal for #name` for the given schema, or
/// `None` if the elem is hidden.
pub fn generate(name: &Ident, elem: &Elem) -> Option<TokenStream> {
    if !elem.printable() {
        return None;
    }
    let mut g = Gen { sym: Gensym::new() };
    let mut body = TokenStream::new();
    g.emit(elem, &quote! { (*self) }, &Path::root(), &mut body);
    Some(quote! {
        impl ::tagpack::Unmarshal for #name {
            fn unmarshal_msg<'a>(&mut self, bts: &'a [u8]) -> ::tagpack::Result<&'a [u8]> {
                let mut bts = bts;
                #body
                ::core::result::Result::Ok(bts)
            }
        }
    })
}

struct Gen {
    sym: Gensym,
}

impl Gen {
    fn emit(&mut self, elem: &Elem, place: &TokenStream, path: &Path, out: &mut TokenStream) {
        match elem {
            Elem::Base(b) => self.base(b, place, path, out),
            Elem::Record(r) => self.record(r, place, path, out),
            Elem::Map(m) => self.map(m, place, path, out),
            Elem::Seq(els) => self.seq(els, place, path, out),
            Elem::Array(a) => self.array(a, place, path, out),
            Elem::Nullable(inner) => self.nullable(inner, place, path, out),
        }
    }

    fn base(&mut self, b: &BaseElem, place: &TokenStream, path: &Path, out: &mut TokenStream) {
        if b.hidden {
            return;
        }
        let wrap = path.wrap();
        if b.shim.is_none() {
            if let BaseType::Ident(_) | BaseType::Intf | BaseType::Ext = b.value {
                out.extend(quote! {
                    bts = ::tagpack::Unmarshal::unmarshal_msg(&mut #place, bts)#wrap?;
                });
                return;
            }
        }
        // Owned conversion for the borrowing reads, identity otherwise.
        let own = |v: TokenStream, kind: &BaseType| match kind {
            BaseType::Str => quote! { #v.to_owned() },
            BaseType::Bytes => quote! { #v.to_vec() },
            _ => v,
        };
        let wire = b.wire_kind().clone();
        let read = match &wire {
            BaseType::Str => quote! { ::tagpack::read_str(bts) },
            BaseType::Bytes => quote! { ::tagpack::read_bin(bts) },
            k => {
                let Some(s) = k.scalar_suffix() else { return };
                let f = format_ident!("read_{s}");
                quote! { ::tagpack::#f(bts) }
            }
        };
        let assign = match &b.shim {
            None => {
                let v = own(quote! { v }, &wire);
                quote! { #place = #v; }
            }
            Some(s) => {
                let from = &s.from_wire;
                let v = own(quote! { v }, &wire);
                match s.kind {
                    ShimKind::Pure => quote! { #place = #from(#v); },
                    ShimKind::Fallible => quote! { #place = #from(#v)#wrap?; },
                }
            }
        };
        out.extend(quote! {
            {
                let (v, rest) = #read #wrap?;
                #assign
                bts = rest;
            }
        });
    }

    fn record(&mut self, r: &Record, place: &TokenStream, path: &Path, out: &mut TokenStream) {
        let live = r.live_fields();
        let wrap = path.wrap();
        let nvar = self.sym.next("n");
        if r.positional {
            let want = live.len() as u32;
            let at = path.at();
            out.extend(quote! {
                let #nvar: u32;
                {
                    let (v, rest) = ::tagpack::read_array_header(bts)#wrap?;
                    #nvar = v;
                    bts = rest;
                }
                if #nvar != #want {
                    return ::core::result::Result::Err(
                        ::tagpack::error::array_size(#want, #nvar)#at,
                    );
                }
            });
            for f in &live {
                let name = &f.name;
                let fp = quote! { #place.#name };
                self.emit(&f.elem, &fp, &path.field(&f.tag), out);
            }
            return;
        }

        let omit: Vec<bool> = live.iter().map(|f| omitempty::resolve(f).dec).collect();
        let track = omit.iter().any(|&x| x);
        let plan = MaskPlan::new(live.len());
        let seenvar = self.sym.next("seen");
        let seen_decl = if track {
            plan.decl(&seenvar)
        } else {
            TokenStream::new()
        };

        let kvar = self.sym.next("k");
        let mut arms = TokenStream::new();
        for (i, f) in live.iter().enumerate() {
            let tag = &f.tag;
            let name = &f.name;
            let fp = quote! { #place.#name };
            let mut body = TokenStream::new();
            self.emit(&f.elem, &fp, &path.field(&f.tag), &mut body);
            if omit[i] {
                let set = plan.set(&seenvar, i);
                body.extend(set);
            }
            arms.extend(quote! { #tag => { #body } });
        }

        out.extend(quote! {
            let mut #nvar: u32;
            {
                let (v, rest) = ::tagpack::read_map_header(bts)#wrap?;
                #nvar = v;
                bts = rest;
            }
            #seen_decl
            while #nvar > 0 {
                #nvar -= 1;
                let #kvar;
                {
                    let (v, rest) = ::tagpack::read_str(bts)#wrap?;
                    #kvar = v;
                    bts = rest;
                }
                match #kvar {
                    #arms
                    _ => {
                        bts = ::tagpack::skip(bts)#wrap?;
                    }
                }
            }
        });

        if track {
            // Fields marked for reader-side omission and absent from the map
            // reset to empty rather than keeping stale contents.
            for (i, f) in live.iter().enumerate() {
                if !omit[i] {
                    continue;
                }
                let name = &f.name;
                let fp = quote! { #place.#name };
                let read = plan.read(&seenvar, i);
                let zero = omitempty::zero_assign(&fp);
                out.extend(quote! {
                    if #read == 0 {
                        #zero
                    }
                });
            }
        }
    }

    fn seq(&mut self, els: &Elem, place: &TokenStream, path: &Path, out: &mut TokenStream) {
        let wrap = path.wrap();
        let nvar = self.sym.next("n");
        let i = self.sym.next("i");
        let ep = quote! { #place[#i] };
        let mut body = TokenStream::new();
        self.emit(els, &ep, &path.index(&i), &mut body);
        out.extend(quote! {
            let #nvar: u32;
            {
                let (v, rest) = ::tagpack::read_array_header(bts)#wrap?;
                #nvar = v;
                bts = rest;
            }
            #place.clear();
            #place.resize_with(#nvar as usize, ::core::default::Default::default);
            for #i in 0..#nvar as usize {
                #body
            }
        });
    }

    fn array(&mut self, a: &ArrayElem, place: &TokenStream, path: &Path, out: &mut TokenStream) {
        let wrap = path.wrap();
        if a.is_bytes() {
            out.extend(quote! {
                bts = ::tagpack::read_bin_exact(bts, &mut #place[..])#wrap?;
            });
            return;
        }
        let nvar = self.sym.next("n");
        let i = self.sym.next("i");
        let want = a.size as u32;
        let at = path.at();
        let ep = quote! { #place[#i] };
        let mut body = TokenStream::new();
        self.emit(&a.els, &ep, &path.index(&i), &mut body);
        out.extend(quote! {
            let #nvar: u32;
            {
                let (v, rest) = ::tagpack::read_array_header(bts)#wrap?;
                #nvar = v;
                bts = rest;
            }
            if #nvar != #want {
                return ::core::result::Result::Err(
                    ::tagpack::error::array_size(#want, #nvar)#at,
                );
            }
            for #i in 0..#nvar as usize {
                #body
            }
        });
    }

    fn map(&mut self, m: &MapElem, place: &TokenStream, path: &Path, out: &mut TokenStream) {
        let wrap = path.wrap();
        let nvar = self.sym.next("n");
        let kvar = self.sym.next("k");
        let vvar = self.sym.next("v");
        let vp = quote! { #vvar };
        let mut body = TokenStream::new();
        self.emit(&m.value, &vp, &path.index(&kvar), &mut body);
        out.extend(quote! {
            let mut #nvar: u32;
            {
                let (v, rest) = ::tagpack::read_map_header(bts)#wrap?;
                #nvar = v;
                bts = rest;
            }
            #place.clear();
            while #nvar > 0 {
                #nvar -= 1;
                let #kvar: ::std::string::String;
                {
                    let (v, rest) = ::tagpack::read_str(bts)#wrap?;
                    #kvar = v.to_owned();
                    bts = rest;
                }
                let mut #vvar = ::core::default::Default::default();
                #body
                #place.insert(#kvar, #vvar);
            }
        });
    }

    fn nullable(&mut self, inner: &Elem, place: &TokenStream, path: &Path, out: &mut TokenStream) {
        let wrap = path.wrap();
        let iv = self.sym.next("v");
        let ip = quote! { (*#iv) };
        let mut body = TokenStream::new();
        self.emit(inner, &ip, path, &mut body);
        out.extend(quote! {
            if ::tagpack::is_nil(bts) {
                bts = ::tagpack::read_nil(bts)#wrap?;
                #place = ::core::option::Option::None;
            } else {
                let #iv = #place.get_or_insert_with(::core::default::Default::default);
                #body
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::elem::{Field, Record},
        proc_macro2::Span,
    };

    fn gen(elem: &Elem) -> String {
        let name = Ident::new("T", Span::call_site());
        generate(&name, elem).unwrap().to_string()
    }

    #[test]
    fn record_loop_skips_unknown_keys() {
        let src = gen(&Elem::Record(Record::keyed(vec![
            Field::new("x", "x", Elem::base(BaseType::I32)),
            Field::new("y", "y", Elem::base(BaseType::I32)),
        ])));
        assert!(src.contains(":: tagpack :: read_map_header (bts) ?"));
        assert!(src.contains("\"x\" => {"));
        assert!(src.contains("\"y\" => {"));
        assert!(src.contains("_ => { bts = :: tagpack :: skip (bts) ? ; }"));
        // Field reads carry their diagnostic path; the header read at the
        // root does not.
        assert!(src.contains(". map_err (| err | err . at (\"x\"))"));
        assert!(!src.contains("map_err (| err | err . at (\"\"))"));
    }

    #[test]
    fn positional_record_checks_arity() {
        let src = gen(&Elem::Record(Record::positional(vec![
            Field::new("x", "x", Elem::base(BaseType::F64)),
            Field::new("y", "y", Elem::base(BaseType::F64)),
        ])));
        assert!(src.contains("read_array_header"));
        assert!(src.contains(":: tagpack :: error :: array_size (2u32 , n0001)"));
        assert!(!src.contains("match"));
    }

    #[test]
    fn seq_reinitializes_before_filling() {
        let src = gen(&Elem::Record(Record::keyed(vec![Field::new(
            "xs",
            "xs",
            Elem::seq(Elem::base(BaseType::U16)),
        )])));
        assert!(src.contains("(* self) . xs . clear () ;"));
        assert!(src
            .contains("(* self) . xs . resize_with (n0004 as usize , :: core :: default :: Default :: default) ;"));
        assert!(src.contains("for i0005 in 0 .. n0004 as usize"));
        assert!(src.contains("(* self) . xs [i0005] = v ;"));
        assert!(src.contains("xs[{}]"));
    }

    #[test]
    fn byte_array_reads_exact() {
        let src = gen(&Elem::Record(Record::keyed(vec![Field::new(
            "id",
            "id",
            Elem::Array(ArrayElem::new(16, Elem::base(BaseType::U8))),
        )])));
        assert!(src
            .contains("bts = :: tagpack :: read_bin_exact (bts , & mut (* self) . id [..]) . map_err (| err | err . at (\"id\")) ? ;"));
    }

    #[test]
    fn map_decodes_through_a_default_slot() {
        let src = gen(&Elem::Record(Record::keyed(vec![Field::new(
            "attrs",
            "attrs",
            Elem::Map(MapElem::new(Elem::base(BaseType::Str))),
        )])));
        assert!(src.contains("(* self) . attrs . clear () ;"));
        assert!(src.contains("let mut v0006 = :: core :: default :: Default :: default () ;"));
        assert!(src.contains("(* self) . attrs . insert (k0005 , v0006) ;"));
        assert!(src.contains("attrs[{}]"));
    }

    #[test]
    fn nullable_branches_on_nil() {
        let src = gen(&Elem::Record(Record::keyed(vec![Field::new(
            "nick",
            "nick",
            Elem::nullable(Elem::base(BaseType::Str)),
        )])));
        assert!(src.contains("if :: tagpack :: is_nil (bts)"));
        assert!(src.contains("= :: core :: option :: Option :: None ;"));
        assert!(src.contains(". get_or_insert_with (:: core :: default :: Default :: default)"));
    }

    #[test]
    fn reader_side_omission_zeroes_unseen_fields() {
        let src = gen(&Elem::Record(Record::keyed(vec![
            Field::new("a", "a", Elem::base(BaseType::Str)).with_directives(&["omitempty"]),
            Field::new("b", "b", Elem::base(BaseType::U32)),
        ])));
        assert!(src.contains("let mut seen0002 : u8 = 0 ;"));
        assert!(src.contains("seen0002 |= 0x1 ;"));
        assert!(src.contains(
            "if (seen0002 & 0x1) == 0 { (* self) . a = :: core :: default :: Default :: default () ; }"
        ));
        // The enc-only directive must not produce reader tracking.
        let enc_only = gen(&Elem::Record(Record::keyed(vec![Field::new(
            "a",
            "a",
            Elem::base(BaseType::Str),
        )
        .with_directives(&["omitemptyenc"])])));
        assert!(!enc_only.contains("seen"));
    }

    #[test]
    fn shims_convert_after_the_read() {
        let shimmed = BaseElem {
            value: BaseType::Ident(syn::parse_quote!(Celsius)),
            shim: Some(crate::elem::Shim {
                wire: BaseType::F64,
                kind: ShimKind::Fallible,
                into_wire: syn::parse_quote!(celsius_to_f64),
                from_wire: syn::parse_quote!(f64_to_celsius),
            }),
            hidden: false,
        };
        let src = gen(&Elem::Record(Record::keyed(vec![Field::new(
            "temp",
            "temp",
            Elem::Base(shimmed),
        )])));
        assert!(src.contains(":: tagpack :: read_f64 (bts)"));
        assert!(src.contains(
            "(* self) . temp = f64_to_celsius (v) . map_err (| err | err . at (\"temp\")) ? ;"
        ));
    }
}
