//! Error types and helpers.
use {core::str::Utf8Error, thiserror::Error};

#[derive(Error, Debug)]
pub enum Error {
    #[error("unexpected end of buffer")]
    ShortBytes,
    #[error("unexpected tag {got:#04x}, wanted {want}")]
    TypeMismatch { got: u8, want: &'static str },
    #[error("integer {0} out of range for the target width")]
    IntRange(i128),
    #[error("array of size {got}, wanted {want}")]
    ArraySize { want: u32, got: u32 },
    #[error("extension type {got}, wanted {want}")]
    ExtType { want: i8, got: i8 },
    #[error("conversion failed: {0}")]
    Conversion(String),
    #[error(transparent)]
    Utf8(#[from] Utf8Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("{path}: {source}")]
    Path { path: String, source: Box<Error> },
}

pub type Result<T> = core::result::Result<T, Error>;

impl Error {
    /// Attach a diagnostic path (field names and element indices) to the
    /// error. Generated codecs call this at every propagation point, so a
    /// failure deep inside a nested value reports the full path from the
    /// top-level type.
    #[cold]
    pub fn at(self, path: impl Into<String>) -> Error {
        Error::Path {
            path: path.into(),
            source: Box::new(self),
        }
    }
}

#[cold]
pub const fn short_bytes() -> Error {
    Error::ShortBytes
}

#[cold]
pub const fn type_mismatch(got: u8, want: &'static str) -> Error {
    Error::TypeMismatch { got, want }
}

#[cold]
pub const fn int_range(val: i128) -> Error {
    Error::IntRange(val)
}

#[cold]
pub const fn array_size(want: u32, got: u32) -> Error {
    Error::ArraySize { want, got }
}

#[cold]
pub const fn ext_type(want: i8, got: i8) -> Error {
    Error::ExtType { want, got }
}

#[cold]
pub fn conversion(msg: impl Into<String>) -> Error {
    Error::Conversion(msg.into())
}
