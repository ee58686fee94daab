//! Static byte coalescing for the writer-side generators.
//!
//! Map headers, field keys and other statically known encodings are computed
//! at generation time and buffered here; the first dynamic step drains the
//! buffer as a single contiguous write. Adjacent static runs therefore cost
//! one call at run time no matter how many schema positions produced them.
use {
    proc_macro2::{Span, TokenStream},
    quote::quote,
    syn::LitInt,
};

/// Which write primitive a drained run turns into.
pub(crate) enum Sink {
    /// `o.extend_from_slice(&[..]);`
    Vec,
    /// `w.append(&[..])?;`
    Writer,
}

pub(crate) struct Fuse {
    pending: Vec<u8>,
    sink: Sink,
}

impl Fuse {
    pub(crate) fn new(sink: Sink) -> Fuse {
        Fuse {
            pending: Vec::new(),
            sink,
        }
    }

    pub(crate) fn push(&mut self, bytes: &[u8]) {
        self.pending.extend_from_slice(bytes);
    }

    /// Drain the buffer into `out`; a no-op when nothing is pending.
    pub(crate) fn flush(&mut self, out: &mut TokenStream) {
        if self.pending.is_empty() {
            return;
        }
        let bytes: Vec<LitInt> = self
            .pending
            .drain(..)
            .map(|b| LitInt::new(&format!("0x{b:02x}"), Span::call_site()))
            .collect();
        out.extend(match self.sink {
            Sink::Vec => quote! { o.extend_from_slice(&[#(#bytes),*]); },
            Sink::Writer => quote! { w.append(&[#(#bytes),*])?; },
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coalesces_adjacent_runs() {
        let mut split = Fuse::new(Sink::Vec);
        split.push(&[0x82]);
        split.push(&[0xa1, 0x78]);
        let mut a = TokenStream::new();
        split.flush(&mut a);

        let mut whole = Fuse::new(Sink::Vec);
        whole.push(&[0x82, 0xa1, 0x78]);
        let mut b = TokenStream::new();
        whole.flush(&mut b);

        assert_eq!(a.to_string(), b.to_string());
        assert_eq!(
            a.to_string(),
            quote! { o.extend_from_slice(&[0x82, 0xa1, 0x78]); }.to_string(),
        );
    }

    #[test]
    fn flush_is_idempotent_when_empty() {
        let mut f = Fuse::new(Sink::Vec);
        f.push(&[0x90]);
        let mut out = TokenStream::new();
        f.flush(&mut out);
        f.flush(&mut out);
        assert_eq!(
            out.to_string(),
            quote! { o.extend_from_slice(&[0x90]); }.to_string(),
        );

        let mut empty = TokenStream::new();
        f.flush(&mut empty);
        assert!(empty.is_empty());
    }

    #[test]
    fn writer_runs_propagate_io_failures() {
        let mut f = Fuse::new(Sink::Writer);
        f.push(&[0xc0]);
        let mut out = TokenStream::new();
        f.flush(&mut out);
        assert_eq!(out.to_string(), quote! { w.append(&[0xc0])?; }.to_string());
    }
}
