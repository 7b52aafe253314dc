//! [`Handler`] abstraction.
//!
//! Commands, queries, background tasks and database operations are all
//! expressed as a [`Handler`] parametrized by the type of its arguments, so a
//! single type (e.g. a service or a database client) may handle many
//! different operations, each with its own output and error types.

use std::future::Future;

/// Asynchronous handler of `Args`.
pub trait Handler<Args = ()> {
    /// Type of a successful [`Handler`] result.
    type Ok;

    /// Type of this [`Handler`] error.
    type Err;

    /// Handles the provided `args`.
    fn execute(
        &self,
        args: Args,
    ) -> impl Future<Output = Result<Self::Ok, Self::Err>>;
}
