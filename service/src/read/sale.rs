//! [`Sale`]-related read definitions.

use crate::domain::sale;
#[cfg(doc)]
use crate::domain::Sale;

/// Selector of [`sale::Status::Pending`] [`Sale`]s created before the
/// provided [`sale::CreationDateTime`].
#[derive(Clone, Copy, Debug)]
pub struct Stale {
    /// Creation [`DateTime`] a [`Sale`] must be older than.
    ///
    /// [`DateTime`]: common::DateTime
    pub created_before: sale::CreationDateTime,
}

impl Stale {
    /// Checks whether the provided [`Sale`] is stale.
    #[must_use]
    pub fn matches(&self, sale: &sale::Sale) -> bool {
        sale.status == sale::Status::Pending
            && sale.created_at < self.created_before
    }
}

pub mod list {
    //! [`Sale`] list definitions.

    use crate::domain::{apartment, client, sale, Sale};

    /// Filter of a [`Sale`] list.
    #[derive(Clone, Copy, Debug, Default)]
    pub struct Filter {
        /// ID of the [`Client`] to filter by.
        ///
        /// [`Client`]: crate::domain::Client
        pub client_id: Option<client::Id>,

        /// ID of the [`Apartment`] to filter by.
        ///
        /// [`Apartment`]: crate::domain::Apartment
        pub apartment_id: Option<apartment::Id>,

        /// [`sale::Status`] to filter by.
        pub status: Option<sale::Status>,
    }

    impl Filter {
        /// Checks whether the provided [`Sale`] passes this [`Filter`].
        #[must_use]
        pub fn matches(&self, sale: &Sale) -> bool {
            let Self {
                client_id,
                apartment_id,
                status,
            } = self;
            client_id.map_or(true, |id| id == sale.client_id)
                && apartment_id.map_or(true, |id| id == sale.apartment_id)
                && status.map_or(true, |s| s == sale.status)
        }
    }
}
