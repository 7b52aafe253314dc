//! [`Apartment`]-related read definitions.

use derive_more::Deref;

#[cfg(doc)]
use crate::domain::{Apartment, Sale};

/// Indicator whether an [`Apartment`] is referenced by any [`Sale`].
#[derive(Clone, Copy, Debug, Deref, Eq, Hash, PartialEq)]
pub struct HasSales(pub bool);

pub mod list {
    //! [`Apartment`] list definitions.

    use crate::domain::{apartment, Apartment};

    /// Filter of an [`Apartment`] list.
    #[derive(Clone, Copy, Debug, Default)]
    pub struct Filter {
        /// [`apartment::Status`] to filter by.
        pub status: Option<apartment::Status>,
    }

    impl Filter {
        /// Checks whether the provided [`Apartment`] passes this [`Filter`].
        #[must_use]
        pub fn matches(&self, apartment: &Apartment) -> bool {
            self.status.map_or(true, |s| s == apartment.status)
        }
    }
}
