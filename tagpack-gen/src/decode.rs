//! The streaming decoder: `impl tagpack::Decode` reading through a
//! `tagpack::io::Reader`.
//!
//! Mirrors the slice unmarshaler, with the reader owning position state so
//! there is no tail to thread.
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

/// Generate `impl tagpack::Decode for #name` for the given schema, or
/// `None` if the elem is hidden.
pub fn generate(name: &Ident, elem: &Elem) -> Option<TokenStream> {
    if !elem.printable() {
        return None;
    }
    let mut g = Gen { sym: Gensym::new() };
    let mut body = TokenStream::new();
    g.emit(elem, &quote! { (*self) }, &Path::root(), &mut body);
    Some(quote! {
        impl ::tagpack::Decode for #name {
            fn decode_msg<R: ::std::io::Read>(
                &mut self,
                r: &mut ::tagpack::io::Reader<R>,
            ) -> ::tagpack::Result<()> {
                #body
                ::core::result::Result::Ok(())
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
                    ::tagpack::Decode::decode_msg(&mut #place, r)#wrap?;
                });
                return;
            }
        }
        let read = match b.wire_kind() {
            BaseType::Str => quote! { r.read_str() },
            BaseType::Bytes => quote! { r.read_bin() },
            k => {
                let Some(s) = k.scalar_suffix() else { return };
                let f = format_ident!("read_{s}");
                quote! { r.#f() }
            }
        };
        match &b.shim {
            None => out.extend(quote! { #place = #read #wrap?; }),
            Some(s) => {
                let from = &s.from_wire;
                let conv = match s.kind {
                    ShimKind::Pure => quote! { #place = #from(v); },
                    ShimKind::Fallible => quote! { #place = #from(v)#wrap?; },
                };
                out.extend(quote! {
                    {
                        let v = #read #wrap?;
                        #conv
                    }
                });
            }
        }
    }

    fn record(&mut self, r: &Record, place: &TokenStream, path: &Path, out: &mut TokenStream) {
        let live = r.live_fields();
        let wrap = path.wrap();
        let nvar = self.sym.next("n");
        if r.positional {
            let want = live.len() as u32;
            let at = path.at();
            out.extend(quote! {
                let #nvar = r.read_array_header()#wrap?;
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
                body.extend(plan.set(&seenvar, i));
            }
            arms.extend(quote! { #tag => { #body } });
        }

        out.extend(quote! {
            let mut #nvar = r.read_map_header()#wrap?;
            #seen_decl
            while #nvar > 0 {
                #nvar -= 1;
                let #kvar = r.read_str()#wrap?;
                match #kvar.as_str() {
                    #arms
                    _ => {
                        r.skip()#wrap?;
                    }
                }
            }
        });

        if track {
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
            let #nvar = r.read_array_header()#wrap?;
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
                r.read_bin_exact(&mut #place[..])#wrap?;
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
            let #nvar = r.read_array_header()#wrap?;
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
            let mut #nvar = r.read_map_header()#wrap?;
            #place.clear();
            while #nvar > 0 {
                #nvar -= 1;
                let #kvar = r.read_str()#wrap?;
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
            if r.is_nil()#wrap? {
                r.read_nil()#wrap?;
                #place = ::core::option::Option::None;
            } else {
                let #iv = #place.get_or_insert_with(::core::default::Default::default);
                #body
            }
        });
    }
}
