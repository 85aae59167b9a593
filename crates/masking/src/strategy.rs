use core::fmt;

/// Debug-formatting strategy for a masked value.
pub trait Strategy<T> {
    /// Writes the masked representation of `value`.
    fn fmt(value: &T, f: &mut fmt::Formatter<'_>) -> fmt::Result;
}

/// Masks the value, naming only its type.
#[derive(Debug)]
pub struct WithType;

impl<T> Strategy<T> for WithType {
    fn fmt(_: &T, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("*** ")?;
        f.write_str(core::any::type_name::<T>())?;
        f.write_str(" ***")
    }
}

/// Masks the value without mentioning its type.
#[derive(Debug)]
pub struct WithoutType;

impl<T> Strategy<T> for WithoutType {
    fn fmt(_: &T, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("*** ***")
    }
}
