use {proc_macro2::Span, syn::Ident};

/// Generator-local name supply. Every temporary in emitted code gets a
/// serial-numbered name so nested scopes never collide with user fields or
/// each other.
pub(crate) struct Gensym {
    n: u32,
}

impl Gensym {
    pub(crate) fn new() -> Gensym {
        Gensym { n: 0 }
    }

    pub(crate) fn next(&mut self, base: &str) -> Ident {
        self.n += 1;
        Ident::new(&format!("{base}{:04}", self.n), Span::call_site())
    }
}
