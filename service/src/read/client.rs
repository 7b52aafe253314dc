//! [`Client`]-related read definitions.

use derive_more::Deref;

#[cfg(doc)]
use crate::domain::{Client, Sale};

/// Indicator whether a [`Client`] is referenced by any [`Sale`].
#[derive(Clone, Copy, Debug, Deref, Eq, Hash, PartialEq)]
pub struct HasSales(pub bool);

pub mod list {
    //! [`Client`] list definitions.

    use crate::domain::client;
    #[cfg(doc)]
    use crate::domain::Client;

    /// Filter of a [`Client`] list.
    #[derive(Clone, Copy, Debug, Default)]
    pub struct Filter {
        /// [`client::Status`] to filter by.
        pub status: Option<client::Status>,
    }

    impl Filter {
        /// Checks whether the provided [`Client`] passes this [`Filter`].
        #[must_use]
        pub fn matches(&self, client: &client::Client) -> bool {
            self.status.map_or(true, |s| s == client.status)
        }
    }
}
