//! [`Command`] for deleting a [`Client`].

use common::operations::{
    By, Commit, Delete, Lock, Select, Transact, Transacted,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::Sale;
use crate::{
    domain::{client, Client},
    infra::{database, Database},
    read, Service,
};

use super::Command;

/// [`Command`] for deleting a [`Client`] not referenced by any [`Sale`].
#[derive(Clone, Copy, Debug)]
pub struct DeleteClient {
    /// ID of the [`Client`] to delete.
    pub client_id: client::Id,
}

impl<Db> Command<DeleteClient> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Client, client::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Client>, client::Id>>,
            Ok = Option<Client>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<read::client::HasSales, client::Id>>,
            Ok = read::client::HasSales,
            Err = Traced<database::Error>,
        > + Database<
            Delete<By<Client, client::Id>>,
            Err = Traced<database::Error>,
        > + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Client;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: DeleteClient) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let DeleteClient { client_id } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // `CreateSale` takes the same lock, so no `Sale` may appear for this
        // `Client` until the deletion is committed.
        tx.execute(Lock(By::<Client, _>::new(client_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let client = tx
            .execute(Select(By::<Option<Client>, _>::new(client_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::ClientNotExists(client_id))
            .map_err(tracerr::wrap!())?;

        let has_sales = tx
            .execute(Select(By::<read::client::HasSales, _>::new(client_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if *has_sales {
            return Err(tracerr::new!(E::ClientHasSales(client_id)));
        }

        tx.execute(Delete(By::<Client, _>::new(client_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(client)
    }
}

/// Error of [`DeleteClient`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`Client`] with the provided ID does not exist.
    #[display("`Client(id: {_0})` does not exist")]
    #[from(ignore)]
    ClientNotExists(#[error(not(source))] client::Id),

    /// [`Client`] is referenced by some [`Sale`].
    #[display("`Client(id: {_0})` has sales")]
    #[from(ignore)]
    ClientHasSales(#[error(not(source))] client::Id),
}

#[cfg(test)]
mod spec {
    use common::operations::{By, Select};

    use crate::{
        domain::Client,
        infra::Database as _,
        spec::{new_client, new_sale, service},
        Command as _,
    };

    use super::{DeleteClient, ExecutionError};

    #[tokio::test]
    async fn deletes_client() {
        let svc = service();
        let c = new_client(&svc, "52998224725").await;

        let deleted = svc
            .execute(DeleteClient { client_id: c.id })
            .await
            .unwrap();

        assert_eq!(deleted.id, c.id);
        let stored = svc
            .database()
            .execute(Select(By::<Option<Client>, _>::new(c.id)))
            .await
            .unwrap();
        assert!(stored.is_none(), "`Client` is not deleted");
    }

    #[tokio::test]
    async fn refuses_client_with_sales() {
        let svc = service();
        let s = new_sale(&svc).await;

        let err = svc
            .execute(DeleteClient {
                client_id: s.client_id,
            })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::ClientHasSales(_)));
    }

    #[tokio::test]
    async fn fails_on_absent_client() {
        let svc = service();
        let c = new_client(&svc, "52998224725").await;
        drop(svc.execute(DeleteClient { client_id: c.id }).await.unwrap());

        let err = svc
            .execute(DeleteClient { client_id: c.id })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::ClientNotExists(_)));
    }
}
