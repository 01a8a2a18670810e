use std::borrow::Cow;

/// Errors produced while parsing a GIF byte buffer.
///
/// Every variant corresponds to one of the kinds in the decoder's error
/// taxonomy. A parse either fully succeeds or fails with exactly one of
/// these; there is no partial result to recover.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The input ended before a length embedded in the stream was satisfied.
    #[error("unexpected end of input{}", context_suffix(.0))]
    Eof(Option<Cow<'static, str>>),

    /// A signature, geometry, color-index, reserved-value or structural
    /// rule was violated by otherwise-present input.
    #[error("malformed GIF data{}", context_suffix(.0))]
    BadData(Option<Cow<'static, str>>),

    /// An allocation needed to hold decoder state or output failed.
    #[error("out of memory{}", context_suffix(.0))]
    NoMem(Option<Cow<'static, str>>),

    /// A defensive bounds check inside the LZW stage tripped. This should
    /// be unreachable for any input and indicates an internal invariant
    /// violation rather than malformed input.
    #[error("internal decoder fault{}", context_suffix(.0))]
    Fault(Option<Cow<'static, str>>),
}

fn context_suffix(ctx: &Option<Cow<'static, str>>) -> String {
    match ctx {
        Some(s) => format!(" ({s})"),
        None => String::new(),
    }
}

pub type Result<T> = std::result::Result<T, Error>;

macro_rules! eof {
    () => { $crate::error::Error::Eof(None) };
    ($s:expr) => { $crate::error::Error::Eof(Some($s.into())) };
    ($fmt:expr, $($args:tt)*) => { $crate::error::Error::Eof(Some(format!($fmt, $($args)*).into())) };
}

macro_rules! bad_data {
    ($s:expr) => { $crate::error::Error::BadData(Some($s.into())) };
    ($fmt:expr, $($args:tt)*) => { $crate::error::Error::BadData(Some(format!($fmt, $($args)*).into())) };
}

macro_rules! fault {
    ($s:expr) => { $crate::error::Error::Fault(Some($s.into())) };
    ($fmt:expr, $($args:tt)*) => { $crate::error::Error::Fault(Some(format!($fmt, $($args)*).into())) };
}

macro_rules! nomem {
    ($s:expr) => { $crate::error::Error::NoMem(Some($s.into())) };
    ($fmt:expr, $($args:tt)*) => { $crate::error::Error::NoMem(Some(format!($fmt, $($args)*).into())) };
}

pub(crate) use bad_data;
pub(crate) use eof;
pub(crate) use fault;
pub(crate) use nomem;
