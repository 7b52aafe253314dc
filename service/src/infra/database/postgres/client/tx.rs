//! [`Tx`] client definitions.

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio_postgres::{types::ToSql, Row, ToStatement};
use tracerr::Traced;

use crate::infra::database::{
    self,
    postgres::{connection, Connection},
};

use super::NonTx;

/// Transactional Postgres database client.
///
/// Its transaction is started eagerly and is rolled back once the last clone
/// of this client is dropped without committing.
#[derive(Clone, Debug)]
pub struct Tx(Arc<Mutex<connection::Tx>>);

impl Tx {
    /// Starts a new [`Tx`] on a [`Connection`] taken from the provided
    /// [`NonTx`] client.
    ///
    /// # Errors
    ///
    /// If failed to start a transaction.
    pub async fn begin(client: &NonTx) -> Result<Self, Traced<database::Error>> {
        let conn = client.connection().await.map_err(tracerr::wrap!())?;
        let tx = connection::Tx::from_non_tx(conn)
            .await
            .map_err(tracerr::wrap!())?;
        Ok(Self(Arc::new(Mutex::new(tx))))
    }

    /// Commits this [`Tx`] client.
    ///
    /// # Errors
    ///
    /// If failed to commit transaction of this [`Tx`] client, or it has been
    /// committed already.
    pub async fn commit(&self) -> Result<(), Traced<database::Error>> {
        self.0.lock().await.commit().await.map_err(tracerr::wrap!())
    }
}

impl Connection for Tx {
    async fn query<T>(
        &self,
        stmt: &T,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Vec<Row>, Traced<database::Error>>
    where
        T: ToStatement + ?Sized,
    {
        self.0
            .lock()
            .await
            .query(stmt, params)
            .await
            .map_err(tracerr::wrap!())
    }

    async fn query_opt<T>(
        &self,
        stmt: &T,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Option<Row>, Traced<database::Error>>
    where
        T: ToStatement + ?Sized,
    {
        self.0
            .lock()
            .await
            .query_opt(stmt, params)
            .await
            .map_err(tracerr::wrap!())
    }

    async fn exec<T>(
        &self,
        stmt: &T,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<u64, Traced<database::Error>>
    where
        T: ToStatement + ?Sized,
    {
        self.0
            .lock()
            .await
            .exec(stmt, params)
            .await
            .map_err(tracerr::wrap!())
    }
}
