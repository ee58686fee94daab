//! Dynamic map headers for records that omit empty fields.
//!
//! The live count is only known at run time, but it is bounded above by the
//! static field count, so size classes the bound rules out are never
//! generated. The common case (15 fields or fewer) compiles to a single
//! unconditional byte push.
use {proc_macro2::TokenStream, quote::quote, syn::Ident};

pub(crate) enum Flavor {
    /// Append into `o: &mut Vec<u8>`.
    Vec,
    /// Write through `w: &mut tagpack::io::Writer<_>`.
    Writer,
}

/// Emit a map header for a count held in `nvar: u32`, bounded by `max`.
pub(crate) fn dyn_map_header(nvar: &Ident, max: usize, flavor: Flavor) -> TokenStream {
    let fix = match flavor {
        Flavor::Vec => quote! { o.push(0x80 | (#nvar as u8 & 0x0f)); },
        Flavor::Writer => quote! { w.append(&[0x80 | (#nvar as u8 & 0x0f)])?; },
    };
    if max <= 15 {
        return fix;
    }
    let map16 = match flavor {
        Flavor::Vec => quote! { o.extend_from_slice(&[0xde, (#nvar >> 8) as u8, #nvar as u8]); },
        Flavor::Writer => quote! { w.append(&[0xde, (#nvar >> 8) as u8, #nvar as u8])?; },
    };
    if max <= 65535 {
        return quote! {
            if #nvar <= 15 {
                #fix
            } else {
                #map16
            }
        };
    }
    let map32 = match flavor {
        Flavor::Vec => quote! {
            o.extend_from_slice(&[
                0xdf,
                (#nvar >> 24) as u8,
                (#nvar >> 16) as u8,
                (#nvar >> 8) as u8,
                #nvar as u8,
            ]);
        },
        Flavor::Writer => quote! {
            w.append(&[
                0xdf,
                (#nvar >> 24) as u8,
                (#nvar >> 16) as u8,
                (#nvar >> 8) as u8,
                #nvar as u8,
            ])?;
        },
    };
    quote! {
        if #nvar <= 15 {
            #fix
        } else if #nvar <= 65535 {
            #map16
        } else {
            #map32
        }
    }
}

#[cfg(test)]
mod tests {
    use {super::*, proc_macro2::Span};

    fn nvar() -> Ident {
        Ident::new("n0001", Span::call_site())
    }

    #[test]
    fn small_records_push_one_byte_unconditionally() {
        let t = dyn_map_header(&nvar(), 15, Flavor::Vec);
        assert_eq!(
            t.to_string(),
            quote! { o.push(0x80 | (n0001 as u8 & 0x0f)); }.to_string(),
        );
    }

    #[test]
    fn mid_records_branch_once() {
        let t = dyn_map_header(&nvar(), 16, Flavor::Vec).to_string();
        assert!(t.contains("0xde"));
        assert!(!t.contains("0xdf"));
        assert_eq!(
            t,
            quote! {
                if n0001 <= 15 {
                    o.push(0x80 | (n0001 as u8 & 0x0f));
                } else {
                    o.extend_from_slice(&[0xde, (n0001 >> 8) as u8, n0001 as u8]);
                }
            }
            .to_string(),
        );
    }

    #[test]
    fn huge_records_reach_the_wide_class() {
        let t = dyn_map_header(&nvar(), 70000, Flavor::Vec).to_string();
        assert!(t.contains("0xde"));
        assert!(t.contains("0xdf"));
        assert!(t.contains("(n0001 >> 24) as u8"));
    }

    #[test]
    fn writer_flavor_goes_through_append() {
        let t = dyn_map_header(&nvar(), 15, Flavor::Writer);
        assert_eq!(
            t.to_string(),
            quote! { w.append(&[0x80 | (n0001 as u8 & 0x0f)])?; }.to_string(),
        );
        let mid = dyn_map_header(&nvar(), 100, Flavor::Writer).to_string();
        assert!(mid.contains("w . append"));
        assert!(!mid.contains("extend_from_slice"));
    }
}
