//! Diagnostic paths threaded through generation.
//!
//! Every recursion frame carries the wire location of the value it is
//! generating code for. Error propagation points interpolate the rendered
//! path so a failure deep inside a nested value reports
//! `items[3].name: unexpected tag ...` rather than just the leaf error.
use {proc_macro2::TokenStream, quote::quote, syn::Ident};

#[derive(Clone, Debug)]
enum Seg {
    /// A field tag, known at generation time.
    Lit(String),
    /// An element index or map key, only known at run time.
    Var(Ident),
}

/// An immutable path; child frames construct extended copies.
#[derive(Clone, Debug, Default)]
pub(crate) struct Path {
    segs: Vec<Seg>,
}

impl Path {
    pub(crate) fn root() -> Path {
        Path::default()
    }

    pub(crate) fn field(&self, tag: &str) -> Path {
        let mut segs = self.segs.clone();
        segs.push(Seg::Lit(tag.to_owned()));
        Path { segs }
    }

    pub(crate) fn index(&self, var: &Ident) -> Path {
        let mut segs = self.segs.clone();
        segs.push(Seg::Var(var.clone()));
        Path { segs }
    }

    /// `.map_err(|err| err.at(..))` tokens for a fallible call at this
    /// position. Empty at the root, where there is nothing to report beyond
    /// the leaf error itself.
    pub(crate) fn wrap(&self) -> TokenStream {
        if self.segs.is_empty() {
            return TokenStream::new();
        }
        let expr = self.expr();
        quote! { .map_err(|err| err.at(#expr)) }
    }

    /// `.at(..)` tokens for annotating a directly constructed error.
    pub(crate) fn at(&self) -> TokenStream {
        if self.segs.is_empty() {
            return TokenStream::new();
        }
        let expr = self.expr();
        quote! { .at(#expr) }
    }

    /// The expression producing the rendered path string.
    fn expr(&self) -> TokenStream {
        let mut tpl = String::new();
        let mut args = Vec::new();
        for seg in &self.segs {
            match seg {
                Seg::Lit(tag) => {
                    if !tpl.is_empty() {
                        tpl.push('.');
                    }
                    tpl.push_str(tag);
                }
                Seg::Var(v) => {
                    tpl.push_str("[{}]");
                    args.push(v);
                }
            }
        }
        if args.is_empty() {
            quote! { #tpl }
        } else {
            quote! { ::std::format!(#tpl, #(#args),*) }
        }
    }
}
