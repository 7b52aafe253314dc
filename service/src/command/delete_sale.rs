//! [`Command`] for deleting a [`Sale`].

use common::operations::{
    By, Commit, Delete, Lock, Select, Transact, Transacted, Update,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{apartment, sale, Apartment, Sale},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for deleting a [`Sale`].
///
/// The [`Apartment`] of a still active [`Sale`] becomes available again. A
/// sold [`Apartment`] stays sold.
#[derive(Clone, Copy, Debug)]
pub struct DeleteSale {
    /// ID of the [`Sale`] to delete.
    pub sale_id: sale::Id,
}

impl<Db> Command<DeleteSale> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Apartment, apartment::Id>>,
            Err = Traced<database::Error>,
        > + Database<Lock<By<Sale, sale::Id>>, Err = Traced<database::Error>>
        + Database<
            Select<By<Option<Apartment>, apartment::Id>>,
            Ok = Option<Apartment>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Sale>, sale::Id>>,
            Ok = Option<Sale>,
            Err = Traced<database::Error>,
        > + Database<Delete<By<Sale, sale::Id>>, Err = Traced<database::Error>>
        + Database<Update<Apartment>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Sale;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: DeleteSale) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let DeleteSale { sale_id } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let apartment_id = tx
            .execute(Select(By::<Option<Sale>, _>::new(sale_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::SaleNotExists(sale_id))
            .map_err(tracerr::wrap!())?
            .apartment_id;
        tx.execute(Lock(By::<Apartment, _>::new(apartment_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Lock(By::<Sale, _>::new(sale_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let sale = tx
            .execute(Select(By::<Option<Sale>, _>::new(sale_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::SaleNotExists(sale_id))
            .map_err(tracerr::wrap!())?;

        tx.execute(Delete(By::<Sale, _>::new(sale_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        if sale.status.is_active() {
            let apartment = tx
                .execute(Select(By::<Option<Apartment>, _>::new(apartment_id)))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?;
            if let Some(mut apartment) = apartment {
                apartment.status = apartment::Status::Available;
                tx.execute(Update(apartment))
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))
                    .map(drop)?;
            }
        }

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(sale)
    }
}

/// Error of [`DeleteSale`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`Sale`] with the provided ID does not exist.
    #[display("`Sale(id: {_0})` does not exist")]
    #[from(ignore)]
    SaleNotExists(#[error(not(source))] sale::Id),
}

#[cfg(test)]
mod spec {
    use crate::{
        command::{CancelSale, ConfirmSale, ReviewSale},
        domain::apartment,
        spec::{apartment_status, new_sale, service, stored_sale},
        Command as _,
    };

    use super::{DeleteSale, ExecutionError};

    #[tokio::test]
    async fn releases_apartment_of_active_sale() {
        let svc = service();
        let pending = new_sale(&svc).await;

        let deleted = svc
            .execute(DeleteSale {
                sale_id: pending.id,
            })
            .await
            .unwrap();

        assert_eq!(deleted.id, pending.id);
        assert!(stored_sale(&svc, pending.id).await.is_none());
        assert_eq!(
            apartment_status(&svc, pending.apartment_id).await,
            apartment::Status::Available,
        );
    }

    #[tokio::test]
    async fn releases_apartment_of_reviewed_sale() {
        let svc = service();
        let s = new_sale(&svc).await;
        drop(svc.execute(ReviewSale { sale_id: s.id }).await.unwrap());

        drop(svc.execute(DeleteSale { sale_id: s.id }).await.unwrap());

        assert_eq!(
            apartment_status(&svc, s.apartment_id).await,
            apartment::Status::Available,
        );
    }

    #[tokio::test]
    async fn keeps_sold_apartment() {
        let svc = service();
        let s = new_sale(&svc).await;
        drop(svc.execute(ConfirmSale { sale_id: s.id }).await.unwrap());

        drop(svc.execute(DeleteSale { sale_id: s.id }).await.unwrap());

        assert_eq!(
            apartment_status(&svc, s.apartment_id).await,
            apartment::Status::Sold,
        );
    }

    #[tokio::test]
    async fn keeps_apartment_of_cancelled_sale() {
        let svc = service();
        let s = new_sale(&svc).await;
        drop(svc.execute(CancelSale { sale_id: s.id }).await.unwrap());

        drop(svc.execute(DeleteSale { sale_id: s.id }).await.unwrap());

        assert_eq!(
            apartment_status(&svc, s.apartment_id).await,
            apartment::Status::Available,
        );
    }

    #[tokio::test]
    async fn fails_on_absent_sale() {
        let svc = service();
        let s = new_sale(&svc).await;
        drop(svc.execute(DeleteSale { sale_id: s.id }).await.unwrap());

        let err = svc
            .execute(DeleteSale { sale_id: s.id })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::SaleNotExists(_)));
    }
}
