//! The append marshaler: `impl tagpack::Marshal` emitting into a `Vec<u8>`.
//!
//! This is the baseline writer the other generators mirror. Statically known
//! bytes (headers, keys) are computed here at generation time and coalesced
//! through the fusion buffer; only value payloads and omission-dependent
//! headers cost a call at run time.
use {
    crate::{
        bitmask::MaskPlan,
        elem::{BaseElem, BaseType, Elem, Field, MapElem, Record, ShimKind},
        fuse::{Fuse, Sink},
        gensym::Gensym,
        header::{self, Flavor},
        omitempty,
        path::Path,
    },
    proc_macro2::TokenStream,
    quote::{format_ident, quote},
    syn::Ident,
};

/// Generate `impl tagpack::Marshal for #name` for the given schema, or
/// `None` if the elem is hidden.
pub fn generate(name: &Ident, elem: &Elem) -> Option<TokenStream> {
    if !elem.printable() {
        return None;
    }
    let mut g = Gen {
        sym: Gensym::new(),
        fuse: Fuse::new(Sink::Vec),
    };
    let mut body = TokenStream::new();
    g.emit(elem, &quote! { (*self) }, &Path::root(), true, &mut body);
    g.fuse.flush(&mut body);
    Some(quote! {
        impl ::tagpack::Marshal for #name {
            fn marshal_msg(&self, o: &mut ::std::vec::Vec<u8>) -> ::tagpack::Result<()> {
                #body
                ::core::result::Result::Ok(())
            }
        }
    })
}

struct Gen {
    sym: Gensym,
    fuse: Fuse,
}

impl Gen {
    fn emit(&mut self, elem: &Elem, place: &TokenStream, path: &Path, root: bool, out: &mut TokenStream) {
        match elem {
            Elem::Base(b) => self.base(b, place, path, out),
            Elem::Record(r) => self.record(r, place, path, root, out),
            Elem::Map(m) => self.map(m, place, path, out),
            Elem::Seq(els) => self.seq(els, place, path, true, out),
            Elem::Array(a) => {
                if a.is_bytes() {
                    self.fuse.flush(out);
                    out.extend(quote! { ::tagpack::append_bytes(o, &#place[..]); });
                } else {
                    // The length is static, so the header fuses with whatever
                    // precedes it.
                    let mut hdr = Vec::new();
                    tagpack::append_array_header(&mut hdr, a.size as u32);
                    self.fuse.push(&hdr);
                    self.seq(&a.els, place, path, false, out);
                }
            }
            Elem::Nullable(inner) => self.nullable(inner, place, path, out),
        }
    }

    fn base(&mut self, b: &BaseElem, place: &TokenStream, path: &Path, out: &mut TokenStream) {
        if b.hidden {
            return;
        }
        self.fuse.flush(out);
        let wrap = path.wrap();
        if b.shim.is_none() {
            if let BaseType::Ident(_) | BaseType::Intf | BaseType::Ext = b.value {
                out.extend(quote! { ::tagpack::Marshal::marshal_msg(&#place, o)#wrap?; });
                return;
            }
        }
        let mut pre = TokenStream::new();
        let arg = match &b.shim {
            None => place.clone(),
            Some(s) => {
                let into = &s.into_wire;
                match s.kind {
                    ShimKind::Pure => quote! { #into(&#place) },
                    ShimKind::Fallible => {
                        let tmp = self.sym.next("tmp");
                        pre = quote! { let #tmp = #into(&#place)#wrap?; };
                        quote! { #tmp }
                    }
                }
            }
        };
        out.extend(pre);
        match b.wire_kind() {
            BaseType::Str => out.extend(quote! { ::tagpack::append_str(o, &#arg); }),
            BaseType::Bytes => out.extend(quote! { ::tagpack::append_bytes(o, &#arg); }),
            k => {
                let Some(s) = k.scalar_suffix() else { return };
                let f = format_ident!("append_{s}");
                out.extend(quote! { ::tagpack::#f(o, #arg); });
            }
        }
    }

    fn record(&mut self, r: &Record, place: &TokenStream, path: &Path, root: bool, out: &mut TokenStream) {
        let live = r.live_fields();
        if r.positional {
            let mut hdr = Vec::new();
            tagpack::append_array_header(&mut hdr, live.len() as u32);
            self.fuse.push(&hdr);
            if live.is_empty() {
                self.fuse.flush(out);
                return;
            }
            for f in &live {
                let name = &f.name;
                let fp = quote! { #place.#name };
                self.emit(&f.elem, &fp, &path.field(&f.tag), false, out);
            }
            return;
        }
        let omit: Vec<bool> = live.iter().map(|f| omitempty::resolve(f).enc).collect();
        if omit.iter().any(|&x| x) {
            self.record_omitting(&live, &omit, place, path, root, out);
            return;
        }
        let mut hdr = Vec::new();
        tagpack::append_map_header(&mut hdr, live.len() as u32);
        self.fuse.push(&hdr);
        if live.is_empty() {
            self.fuse.flush(out);
            return;
        }
        for f in &live {
            self.fuse_key(&f.tag);
            let name = &f.name;
            let fp = quote! { #place.#name };
            self.emit(&f.elem, &fp, &path.field(&f.tag), false, out);
        }
    }

    /// Keyed record with at least one writer-side omission field: count the
    /// live entries first, record the omitted ones in a mask, then emit a
    /// header sized at run time and guard each omission field's key/value
    /// pair on its mask bit.
    fn record_omitting(
        &mut self,
        live: &[&Field],
        omit: &[bool],
        place: &TokenStream,
        path: &Path,
        root: bool,
        out: &mut TokenStream,
    ) {
        self.fuse.flush(out);
        let nvar = self.sym.next("n");
        let maskvar = self.sym.next("mask");
        let plan = MaskPlan::new(live.len());
        let total = live.len() as u32;
        let decl = plan.decl(&maskvar);

        let mut prologue = TokenStream::new();
        for (i, f) in live.iter().enumerate() {
            if !omit[i] {
                continue;
            }
            let name = &f.name;
            let fp = quote! { #place.#name };
            let Some(empty) = omitempty::empty_expr(&f.elem, &fp) else {
                continue;
            };
            let set = plan.set(&maskvar, i);
            prologue.extend(quote! { if #empty { #nvar -= 1; #set } });
        }
        out.extend(quote! {
            let mut #nvar: u32 = #total;
            #decl
            #prologue
        });
        out.extend(header::dyn_map_header(&nvar, live.len(), Flavor::Vec));

        let mut fields = TokenStream::new();
        for (i, f) in live.iter().enumerate() {
            let name = &f.name;
            let fp = quote! { #place.#name };
            let fpath = path.field(&f.tag);
            if omit[i] {
                self.fuse.flush(&mut fields);
                let mut inner = TokenStream::new();
                self.fuse_key(&f.tag);
                self.emit(&f.elem, &fp, &fpath, false, &mut inner);
                self.fuse.flush(&mut inner);
                let read = plan.read(&maskvar, i);
                fields.extend(quote! { if #read == 0 { #inner } });
            } else {
                self.fuse_key(&f.tag);
                self.emit(&f.elem, &fp, &fpath, false, &mut fields);
            }
        }
        self.fuse.flush(&mut fields);

        if root {
            // Nothing follows the record at the root, so a fully empty map
            // is complete as soon as its header is out.
            out.extend(quote! {
                if #nvar == 0 {
                    return ::core::result::Result::Ok(());
                }
            });
            out.extend(fields);
        } else {
            out.extend(quote! {
                if #nvar != 0 {
                    #fields
                }
            });
        }
    }

    fn seq(
        &mut self,
        els: &Elem,
        place: &TokenStream,
        path: &Path,
        dynamic_header: bool,
        out: &mut TokenStream,
    ) {
        self.fuse.flush(out);
        if dynamic_header {
            out.extend(quote! { ::tagpack::append_array_header(o, #place.len() as u32); });
        }
        let it = self.sym.next("v");
        let iv = quote! { (*#it) };
        let mut body = TokenStream::new();
        if els.fallible_marshal() {
            let i = self.sym.next("i");
            self.emit(els, &iv, &path.index(&i), false, &mut body);
            self.fuse.flush(&mut body);
            out.extend(quote! {
                for (#i, #it) in #place.iter().enumerate() {
                    #body
                }
            });
        } else {
            self.emit(els, &iv, path, false, &mut body);
            self.fuse.flush(&mut body);
            out.extend(quote! {
                for #it in #place.iter() {
                    #body
                }
            });
        }
    }

    fn map(&mut self, m: &MapElem, place: &TokenStream, path: &Path, out: &mut TokenStream) {
        self.fuse.flush(out);
        out.extend(quote! { ::tagpack::append_map_header(o, #place.len() as u32); });
        let k = self.sym.next("k");
        let v = self.sym.next("v");
        let vp = quote! { (*#v) };
        let mut body = TokenStream::new();
        self.emit(&m.value, &vp, &path.index(&k), false, &mut body);
        self.fuse.flush(&mut body);
        out.extend(quote! {
            for (#k, #v) in #place.iter() {
                ::tagpack::append_str(o, #k);
                #body
            }
        });
    }

    fn nullable(&mut self, inner: &Elem, place: &TokenStream, path: &Path, out: &mut TokenStream) {
        self.fuse.flush(out);
        let iv = self.sym.next("v");
        let ip = quote! { (*#iv) };
        let mut some_body = TokenStream::new();
        self.emit(inner, &ip, path, false, &mut some_body);
        self.fuse.flush(&mut some_body);
        out.extend(quote! {
            match &#place {
                ::core::option::Option::Some(#iv) => { #some_body }
                ::core::option::Option::None => {
                    ::tagpack::append_nil(o);
                }
            }
        });
    }

    fn fuse_key(&mut self, tag: &str) {
        let mut key = Vec::new();
        tagpack::append_str(&mut key, tag);
        self.fuse.push(&key);
    }
}
