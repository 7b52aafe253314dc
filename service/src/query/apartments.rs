//! [`Query`] collection related to the multiple [`Apartment`]s.

use common::operations::By;

#[cfg(doc)]
use crate::Query;
use crate::{domain::Apartment, read};

use super::DatabaseQuery;

/// Queries a list of [`Apartment`]s, ordered by their creation.
pub type List =
    DatabaseQuery<By<Vec<Apartment>, read::apartment::list::Filter>>;
