//! Access interfaces for masked values.

use crate::{Secret, Strategy};

/// Read access to a reference of the inner secret.
pub trait PeekInterface<S> {
    /// Returns a reference to the secret value.
    fn peek(&self) -> &S;
}

/// Consuming access to the inner secret.
pub trait ExposeInterface<S> {
    /// Consumes the wrapper and returns the secret value.
    fn expose(self) -> S;
}

/// Consuming access through an `Option` of a secret.
pub trait ExposeOptionInterface<S> {
    /// Consumes the wrapper and returns the secret value, if any.
    fn expose_option(self) -> S;
}

impl<S, I> ExposeInterface<S> for Secret<S, I>
where
    I: Strategy<S>,
{
    fn expose(self) -> S {
        self.inner_secret
    }
}

impl<S, I> ExposeOptionInterface<Option<S>> for Option<Secret<S, I>>
where
    I: Strategy<S>,
{
    fn expose_option(self) -> Option<S> {
        self.map(ExposeInterface::expose)
    }
}
