//! Tag directive resolution for empty-field omission.
//!
//! Three directives control omission per field: `omitempty` applies to both
//! directions, `omitemptyenc` to writing only, `omitemptydec` to reading
//! only. Omission is supported for primitive leaves with a meaningful empty
//! state; on any other elem the directive degrades silently to normal
//! handling, so a schema never fails to generate because of it.
use {
    crate::elem::{BaseType, Elem, Field},
    proc_macro2::TokenStream,
    quote::quote,
};

pub(crate) const OMITEMPTY: &str = "omitempty";
pub(crate) const OMITEMPTY_ENC: &str = "omitemptyenc";
pub(crate) const OMITEMPTY_DEC: &str = "omitemptydec";

/// Per-direction omission flags for one field.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct OmitPolicy {
    pub enc: bool,
    pub dec: bool,
}

impl OmitPolicy {
    pub(crate) fn none(self) -> bool {
        !self.enc && !self.dec
    }
}

/// Resolve a field's directives against what its elem supports.
pub(crate) fn resolve(field: &Field) -> OmitPolicy {
    let mut p = OmitPolicy::default();
    for d in &field.directives {
        match d.as_str() {
            OMITEMPTY => {
                p.enc = true;
                p.dec = true;
            }
            OMITEMPTY_ENC => p.enc = true,
            OMITEMPTY_DEC => p.dec = true,
            _ => {}
        }
    }
    if !p.none() && !supported(&field.elem) {
        return OmitPolicy::default();
    }
    p
}

/// Omission needs a generable emptiness test, which only the shimless
/// primitive leaves have.
fn supported(elem: &Elem) -> bool {
    match elem {
        Elem::Base(b) if b.shim.is_none() => !matches!(
            b.value,
            BaseType::Ident(_) | BaseType::Intf | BaseType::Ext
        ),
        _ => false,
    }
}

/// The expression testing whether `place` holds the empty value, or `None`
/// when the elem does not support omission.
pub(crate) fn empty_expr(elem: &Elem, place: &TokenStream) -> Option<TokenStream> {
    let b = match elem {
        Elem::Base(b) if b.shim.is_none() => b,
        _ => return None,
    };
    Some(match &b.value {
        BaseType::Str | BaseType::Bytes => quote! { #place.is_empty() },
        BaseType::Bool => quote! { !#place },
        BaseType::U8
        | BaseType::U16
        | BaseType::U32
        | BaseType::U64
        | BaseType::I8
        | BaseType::I16
        | BaseType::I32
        | BaseType::I64 => quote! { #place == 0 },
        BaseType::F32 | BaseType::F64 => quote! { #place == 0.0 },
        BaseType::Complex64 => quote! { #place == ::tagpack::Complex64::ZERO },
        BaseType::Complex128 => quote! { #place == ::tagpack::Complex128::ZERO },
        BaseType::Ident(_) | BaseType::Intf | BaseType::Ext => return None,
    })
}

/// The statement resetting `place` to its empty value on the reader side.
pub(crate) fn zero_assign(place: &TokenStream) -> TokenStream {
    quote! { #place = ::core::default::Default::default(); }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::elem::{BaseElem, Shim, ShimKind},
        proc_macro2::Span,
        syn::Ident,
    };

    fn field(dirs: &[&str], elem: Elem) -> Field {
        Field::new("f", "f", elem).with_directives(dirs)
    }

    #[test]
    fn directives_split_by_direction() {
        let both = resolve(&field(&[OMITEMPTY], Elem::base(BaseType::Str)));
        assert_eq!(both, OmitPolicy { enc: true, dec: true });

        let enc = resolve(&field(&[OMITEMPTY_ENC], Elem::base(BaseType::U32)));
        assert_eq!(enc, OmitPolicy { enc: true, dec: false });

        let dec = resolve(&field(&[OMITEMPTY_DEC], Elem::base(BaseType::Bool)));
        assert_eq!(dec, OmitPolicy { enc: false, dec: true });

        // Split directives combine.
        let split = resolve(&field(
            &[OMITEMPTY_ENC, OMITEMPTY_DEC],
            Elem::base(BaseType::I64),
        ));
        assert_eq!(split, OmitPolicy { enc: true, dec: true });
    }

    #[test]
    fn unknown_directives_are_ignored() {
        let p = resolve(&field(&["allownil", "zerocopy"], Elem::base(BaseType::Str)));
        assert!(p.none());
    }

    #[test]
    fn unsupported_elems_degrade_silently() {
        // Composites, delegating leaves and shimmed leaves cannot be tested
        // for emptiness; the directive is dropped, not rejected.
        assert!(resolve(&field(&[OMITEMPTY], Elem::seq(Elem::base(BaseType::U8)))).none());
        assert!(resolve(&field(&[OMITEMPTY], Elem::base(BaseType::Intf))).none());

        let ident: syn::Path = syn::parse_quote!(MyId);
        assert!(resolve(&field(&[OMITEMPTY], Elem::base(BaseType::Ident(ident.clone())))).none());

        let shimmed = BaseElem {
            value: BaseType::Ident(ident),
            shim: Some(Shim {
                wire: BaseType::U32,
                kind: ShimKind::Pure,
                into_wire: syn::parse_quote!(my_id_to_u32),
                from_wire: syn::parse_quote!(u32_to_my_id),
            }),
            hidden: false,
        };
        assert!(resolve(&field(&[OMITEMPTY], Elem::Base(shimmed))).none());
    }

    #[test]
    fn empty_tests_match_the_kind() {
        let place = {
            let f = Ident::new("f", Span::call_site());
            quote! { (*self).#f }
        };
        let cases: &[(BaseType, &str)] = &[
            (BaseType::Str, "(* self) . f . is_empty ()"),
            (BaseType::Bytes, "(* self) . f . is_empty ()"),
            (BaseType::Bool, "! (* self) . f"),
            (BaseType::U64, "(* self) . f == 0"),
            (BaseType::F64, "(* self) . f == 0.0"),
        ];
        for (kind, want) in cases {
            let got = empty_expr(&Elem::base(kind.clone()), &place).unwrap();
            assert_eq!(got.to_string(), *want);
        }
        let c = empty_expr(&Elem::base(BaseType::Complex64), &place).unwrap();
        assert!(c.to_string().contains("Complex64 :: ZERO"));
    }
}
