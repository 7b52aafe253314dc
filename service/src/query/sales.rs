//! [`Query`] collection related to the multiple [`Sale`]s.

use common::operations::By;

#[cfg(doc)]
use crate::Query;
use crate::{
    domain::{sale, Sale},
    read,
};

use super::DatabaseQuery;

/// Queries a list of [`Sale`]s, ordered by their creation.
pub type List = DatabaseQuery<By<Vec<Sale>, read::sale::list::Filter>>;

/// Queries IDs of [`sale::Status::Pending`] [`Sale`]s gone stale.
pub type Stale = DatabaseQuery<By<Vec<sale::Id>, read::sale::Stale>>;
