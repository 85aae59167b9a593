//! The [`Secret`] wrapper itself.

use std::{fmt, marker::PhantomData};

use crate::{strategy::Strategy, PeekInterface, WithType};

/// A value whose `Debug` output is masked.
///
/// Access to the wrapped value goes through [`PeekInterface::peek`] for a
/// reference or [`crate::ExposeInterface::expose`] to take ownership, which
/// keeps every read of the secret explicit and greppable.
///
/// The second type parameter selects the masking strategy used for `Debug`;
/// [`WithType`] is the default. A custom strategy is a unit struct
/// implementing [`Strategy`]:
///
/// ```
/// use std::fmt;
///
/// use masking::{Secret, Strategy};
///
/// struct Last4;
///
/// impl Strategy<String> for Last4 {
///     fn fmt(value: &String, f: &mut fmt::Formatter<'_>) -> fmt::Result {
///         write!(f, "**{}", value.get(value.len().saturating_sub(4)..).unwrap_or(""))
///     }
/// }
///
/// let pan: Secret<String, Last4> = Secret::new("4242424242424242".to_string());
/// assert_eq!(format!("{pan:?}"), "**4242");
/// ```
pub struct Secret<S, I = WithType>
where
    I: Strategy<S>,
{
    pub(crate) inner_secret: S,
    pub(crate) marker: PhantomData<I>,
}

impl<S, I> Secret<S, I>
where
    I: Strategy<S>,
{
    /// Takes ownership of a secret value.
    pub fn new(secret: S) -> Self {
        Self {
            inner_secret: secret,
            marker: PhantomData,
        }
    }
}

impl<S, I> PeekInterface<S> for Secret<S, I>
where
    I: Strategy<S>,
{
    fn peek(&self) -> &S {
        &self.inner_secret
    }
}

impl<S, I> From<S> for Secret<S, I>
where
    I: Strategy<S>,
{
    fn from(secret: S) -> Self {
        Self::new(secret)
    }
}

impl<S, I> Clone for Secret<S, I>
where
    S: Clone,
    I: Strategy<S>,
{
    fn clone(&self) -> Self {
        Self {
            inner_secret: self.inner_secret.clone(),
            marker: PhantomData,
        }
    }
}

impl<S, I> PartialEq for Secret<S, I>
where
    S: PartialEq,
    I: Strategy<S>,
{
    fn eq(&self, other: &Self) -> bool {
        self.peek().eq(other.peek())
    }
}

impl<S, I> Eq for Secret<S, I>
where
    S: Eq,
    I: Strategy<S>,
{
}

impl<S, I> fmt::Debug for Secret<S, I>
where
    I: Strategy<S>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        I::fmt(&self.inner_secret, f)
    }
}

impl<S, I> Default for Secret<S, I>
where
    S: Default,
    I: Strategy<S>,
{
    fn default() -> Self {
        S::default().into()
    }
}
