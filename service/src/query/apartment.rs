//! [`Query`] collection related to a single [`Apartment`].

use common::operations::By;

use crate::domain::{apartment, Apartment};
#[cfg(doc)]
use crate::Query;

use super::DatabaseQuery;

/// Queries an [`Apartment`] by its [`apartment::Id`].
pub type ById = DatabaseQuery<By<Option<Apartment>, apartment::Id>>;
