//! In-memory [`Database`] implementation.
//!
//! Transactions are serialized behind a single async mutex: a [`Tx`] holds
//! it from [`Transact`] until it is committed or dropped, working on a copy of
//! the [`State`] which replaces the shared one on [`Commit`].

use std::{collections::HashMap, future::Future, sync::Arc};

use common::operations::{
    By, Commit, Delete, Insert, Lock, Select, Transact, Update,
};
use derive_more::{Deref, Display, Error as StdError};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracerr::Traced;
use uuid::Uuid;

use crate::{
    domain::{apartment, client, sale, user, Apartment, Client, Sale, User},
    infra::{database, Database},
    read,
};

/// In-memory [`Database`] client.
#[derive(Clone, Debug, Default, Deref)]
pub struct Memory<T = NonTx>(T);

impl Memory {
    /// Creates a new empty [`Memory`] database.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// Stored entities.
#[derive(Clone, Debug, Default)]
pub struct State {
    /// Stored [`Client`]s.
    clients: HashMap<client::Id, Client>,

    /// Stored [`Apartment`]s.
    apartments: HashMap<apartment::Id, Apartment>,

    /// Stored [`Sale`]s.
    sales: HashMap<sale::Id, Sale>,

    /// Stored [`User`]s.
    users: HashMap<user::Id, User>,
}

/// [`Memory`] database error.
#[derive(Clone, Copy, Debug, Display, StdError)]
pub enum Error {
    /// [`Tx`] is used after being committed.
    #[display("`Tx` is already committed")]
    TxFinished,
}

/// Access to the [`State`] of a [`Memory`] database.
pub trait Access {
    /// Reads the [`State`] with the provided function.
    fn read<R>(
        &self,
        f: impl FnOnce(&State) -> R,
    ) -> impl Future<Output = Result<R, Traced<database::Error>>>;

    /// Modifies the [`State`] with the provided function.
    fn write<R>(
        &self,
        f: impl FnOnce(&mut State) -> R,
    ) -> impl Future<Output = Result<R, Traced<database::Error>>>;
}

/// Non-transactional [`Access`], applying every operation immediately.
#[derive(Clone, Debug, Default)]
pub struct NonTx {
    /// Shared [`State`].
    state: Arc<Mutex<State>>,
}

impl Access for NonTx {
    async fn read<R>(
        &self,
        f: impl FnOnce(&State) -> R,
    ) -> Result<R, Traced<database::Error>> {
        Ok(f(&*self.state.lock().await))
    }

    async fn write<R>(
        &self,
        f: impl FnOnce(&mut State) -> R,
    ) -> Result<R, Traced<database::Error>> {
        Ok(f(&mut *self.state.lock().await))
    }
}

/// Transactional [`Access`], holding the shared [`State`] exclusively.
#[derive(Clone, Debug)]
pub struct Tx {
    /// [`Pending`] changes, until committed.
    pending: Arc<Mutex<Option<Pending>>>,
}

/// Changes of a [`Tx`] not committed yet.
#[derive(Debug)]
struct Pending {
    /// Exclusively held shared [`State`].
    committed: OwnedMutexGuard<State>,

    /// Working copy of the [`State`].
    working: State,
}

impl Access for Tx {
    async fn read<R>(
        &self,
        f: impl FnOnce(&State) -> R,
    ) -> Result<R, Traced<database::Error>> {
        let pending = self.pending.lock().await;
        let pending = pending
            .as_ref()
            .ok_or(Error::TxFinished)
            .map_err(tracerr::from_and_wrap!(=> database::Error))?;
        Ok(f(&pending.working))
    }

    async fn write<R>(
        &self,
        f: impl FnOnce(&mut State) -> R,
    ) -> Result<R, Traced<database::Error>> {
        let mut pending = self.pending.lock().await;
        let pending = pending
            .as_mut()
            .ok_or(Error::TxFinished)
            .map_err(tracerr::from_and_wrap!(=> database::Error))?;
        Ok(f(&mut pending.working))
    }
}

impl Database<Transact> for Memory<NonTx> {
    type Ok = Memory<Tx>;
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Transact) -> Result<Self::Ok, Self::Err> {
        let committed = Arc::clone(&self.0.state).lock_owned().await;
        let working = committed.clone();
        Ok(Memory(Tx {
            pending: Arc::new(Mutex::new(Some(Pending { committed, working }))),
        }))
    }
}

impl Database<Transact> for Memory<Tx> {
    type Ok = Self;
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Transact) -> Result<Self::Ok, Self::Err> {
        Ok(self.clone())
    }
}

impl Database<Commit> for Memory<Tx> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Commit) -> Result<Self::Ok, Self::Err> {
        let Pending {
            mut committed,
            working,
        } = self
            .0
            .pending
            .lock()
            .await
            .take()
            .ok_or(Error::TxFinished)
            .map_err(tracerr::from_and_wrap!(=> database::Error))?;
        *committed = working;
        Ok(())
    }
}

/// Implements a [`Database`] operation over any [`Access`] of [`Memory`].
macro_rules! impl_database {
    (
        $op:ty => $ok:ty,
        $access:ident |$state:ident, $arg:pat_param| $body:expr
    ) => {
        impl<A: Access> Database<$op> for Memory<A> {
            type Ok = $ok;
            type Err = Traced<database::Error>;

            async fn execute(&self, $arg: $op) -> Result<Self::Ok, Self::Err> {
                self.0
                    .$access(|$state| $body)
                    .await
                    .map_err(tracerr::wrap!())
            }
        }
    };
}

/// Sorts the provided entities in their creation order.
fn sorted<T, K: Ord>(mut items: Vec<T>, key: impl Fn(&T) -> K) -> Vec<T> {
    items.sort_by_key(key);
    items
}

// Every `Tx` holds the whole `State` exclusively, so locks are no-ops.
impl_database!(Lock<By<Client, client::Id>> => (), read |_s, _| ());
impl_database!(Lock<By<Apartment, apartment::Id>> => (), read |_s, _| ());
impl_database!(Lock<By<Sale, sale::Id>> => (), read |_s, _| ());

impl<'l, A: Access> Database<Lock<By<Client, &'l client::Cpf>>> for Memory<A> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Lock<By<Client, &'l client::Cpf>>,
    ) -> Result<Self::Ok, Self::Err> {
        self.0.read(|_| ()).await.map_err(tracerr::wrap!())
    }
}

impl<'l, A: Access> Database<Lock<By<User, &'l user::Login>>> for Memory<A> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Lock<By<User, &'l user::Login>>,
    ) -> Result<Self::Ok, Self::Err> {
        self.0.read(|_| ()).await.map_err(tracerr::wrap!())
    }
}

impl_database!(
    Select<By<Option<Client>, client::Id>> => Option<Client>,
    read |s, Select(by)| s.clients.get(&by.into_inner()).cloned()
);

impl<'l, A: Access> Database<Select<By<Option<Client>, &'l client::Cpf>>>
    for Memory<A>
{
    type Ok = Option<Client>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Client>, &'l client::Cpf>>,
    ) -> Result<Self::Ok, Self::Err> {
        let cpf = by.into_inner();
        self.0
            .read(|s| s.clients.values().find(|c| &c.cpf == cpf).cloned())
            .await
            .map_err(tracerr::wrap!())
    }
}

impl_database!(
    Select<By<Vec<Client>, read::client::list::Filter>> => Vec<Client>,
    read |s, Select(by)| {
        let filter = by.into_inner();
        sorted(
            s.clients.values().filter(|c| filter.matches(c)).cloned().collect(),
            |c| (c.created_at, Uuid::from(c.id)),
        )
    }
);

impl_database!(
    Select<By<read::client::HasSales, client::Id>> => read::client::HasSales,
    read |s, Select(by)| {
        let id = by.into_inner();
        read::client::HasSales(s.sales.values().any(|s| s.client_id == id))
    }
);

impl_database!(
    Insert<Client> => (),
    write |s, Insert(client)| drop(s.clients.insert(client.id, client))
);

impl_database!(
    Update<Client> => (),
    write |s, Update(client)| drop(s.clients.insert(client.id, client))
);

impl_database!(
    Delete<By<Client, client::Id>> => (),
    write |s, Delete(by)| drop(s.clients.remove(&by.into_inner()))
);

impl_database!(
    Select<By<Option<Apartment>, apartment::Id>> => Option<Apartment>,
    read |s, Select(by)| s.apartments.get(&by.into_inner()).cloned()
);

impl_database!(
    Select<By<Vec<Apartment>, read::apartment::list::Filter>> => Vec<Apartment>,
    read |s, Select(by)| {
        let filter = by.into_inner();
        sorted(
            s.apartments
                .values()
                .filter(|a| filter.matches(a))
                .cloned()
                .collect(),
            |a| (a.created_at, Uuid::from(a.id)),
        )
    }
);

impl_database!(
    Select<By<read::apartment::HasSales, apartment::Id>>
        => read::apartment::HasSales,
    read |s, Select(by)| {
        let id = by.into_inner();
        read::apartment::HasSales(
            s.sales.values().any(|s| s.apartment_id == id),
        )
    }
);

impl_database!(
    Insert<Apartment> => (),
    write |s, Insert(apartment)| {
        drop(s.apartments.insert(apartment.id, apartment));
    }
);

impl_database!(
    Update<Apartment> => (),
    write |s, Update(apartment)| {
        drop(s.apartments.insert(apartment.id, apartment));
    }
);

impl_database!(
    Delete<By<Apartment, apartment::Id>> => (),
    write |s, Delete(by)| drop(s.apartments.remove(&by.into_inner()))
);

impl_database!(
    Select<By<Option<Sale>, sale::Id>> => Option<Sale>,
    read |s, Select(by)| s.sales.get(&by.into_inner()).cloned()
);

impl_database!(
    Select<By<Vec<Sale>, read::sale::list::Filter>> => Vec<Sale>,
    read |s, Select(by)| {
        let filter = by.into_inner();
        sorted(
            s.sales.values().filter(|s| filter.matches(s)).cloned().collect(),
            |s| (s.created_at, Uuid::from(s.id)),
        )
    }
);

impl_database!(
    Select<By<Vec<sale::Id>, read::sale::Stale>> => Vec<sale::Id>,
    read |s, Select(by)| {
        let stale = by.into_inner();
        sorted(
            s.sales.values().filter(|s| stale.matches(s)).collect(),
            |s| (s.created_at, Uuid::from(s.id)),
        )
        .into_iter()
        .map(|s| s.id)
        .collect()
    }
);

impl_database!(
    Insert<Sale> => (),
    write |s, Insert(sale)| drop(s.sales.insert(sale.id, sale))
);

impl_database!(
    Update<Sale> => (),
    write |s, Update(sale)| drop(s.sales.insert(sale.id, sale))
);

impl_database!(
    Delete<By<Sale, sale::Id>> => (),
    write |s, Delete(by)| drop(s.sales.remove(&by.into_inner()))
);

impl_database!(
    Select<By<Option<User>, user::Id>> => Option<User>,
    read |s, Select(by)| s.users.get(&by.into_inner()).cloned()
);

impl<'l, A: Access> Database<Select<By<Option<User>, &'l user::Login>>>
    for Memory<A>
{
    type Ok = Option<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<User>, &'l user::Login>>,
    ) -> Result<Self::Ok, Self::Err> {
        let login = by.into_inner();
        self.0
            .read(|s| s.users.values().find(|u| &u.login == login).cloned())
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<'l, A: Access> Database<Select<By<Option<User>, &'l user::Email>>>
    for Memory<A>
{
    type Ok = Option<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<User>, &'l user::Email>>,
    ) -> Result<Self::Ok, Self::Err> {
        let email = by.into_inner();
        self.0
            .read(|s| s.users.values().find(|u| &u.email == email).cloned())
            .await
            .map_err(tracerr::wrap!())
    }
}

impl_database!(
    Insert<User> => (),
    write |s, Insert(user)| drop(s.users.insert(user.id, user))
);
