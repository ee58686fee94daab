//! Field-presence masks sized to the record.
//!
//! Records that omit empty fields track which fields were dropped (writer
//! side) or seen (reader side) in a mask. The mask is the narrowest unsigned
//! scalar that holds one bit per live field, falling back to a `[u64; K]`
//! array past 64 fields.
use {
    proc_macro2::{Span, TokenStream},
    quote::quote,
    syn::{Ident, LitInt},
};

pub(crate) struct MaskPlan {
    n: usize,
}

impl MaskPlan {
    pub(crate) fn new(n: usize) -> MaskPlan {
        MaskPlan { n }
    }

    fn words(&self) -> usize {
        (self.n >> 6) + 1
    }

    fn scalar(&self) -> Option<TokenStream> {
        match self.n {
            0..=8 => Some(quote! { u8 }),
            9..=16 => Some(quote! { u16 }),
            17..=32 => Some(quote! { u32 }),
            33..=64 => Some(quote! { u64 }),
            _ => None,
        }
    }

    fn bit(&self, i: usize) -> LitInt {
        LitInt::new(&format!("0x{:X}", 1u64 << (i & 63)), Span::call_site())
    }

    /// `let mut var = 0;` at the planned width.
    pub(crate) fn decl(&self, var: &Ident) -> TokenStream {
        match self.scalar() {
            Some(ty) => quote! { let mut #var: #ty = 0; },
            None => {
                let k = self.words();
                quote! { let mut #var = [0u64; #k]; }
            }
        }
    }

    /// `var |= bit;` for field `i`.
    pub(crate) fn set(&self, var: &Ident, i: usize) -> TokenStream {
        let bit = self.bit(i);
        match self.scalar() {
            Some(_) => quote! { #var |= #bit; },
            None => {
                let w = i >> 6;
                quote! { #var[#w] |= #bit; }
            }
        }
    }

    /// The masked value for field `i`, for use in `if read == 0` guards.
    pub(crate) fn read(&self, var: &Ident, i: usize) -> TokenStream {
        let bit = self.bit(i);
        match self.scalar() {
            Some(_) => quote! { (#var & #bit) },
            None => {
                let w = i >> 6;
                quote! { (#var[#w] & #bit) }
            }
        }
    }
}
