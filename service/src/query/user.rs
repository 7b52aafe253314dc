//! [`Query`] collection related to a single [`User`] operator.

use common::operations::By;

#[cfg(doc)]
use crate::{domain::user::Session, Query};
use crate::domain::{user, User};

use super::DatabaseQuery;

/// Queries a [`User`] by its [`user::Id`], as carried by a [`Session`].
pub type ById = DatabaseQuery<By<Option<User>, user::Id>>;
