//! [`Command`] for deleting an [`Apartment`].

use common::operations::{
    By, Commit, Delete, Lock, Select, Transact, Transacted,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::Sale;
use crate::{
    domain::{apartment, Apartment},
    infra::{database, Database},
    read, Service,
};

use super::Command;

/// [`Command`] for deleting an [`Apartment`] not referenced by any [`Sale`].
#[derive(Clone, Copy, Debug)]
pub struct DeleteApartment {
    /// ID of the [`Apartment`] to delete.
    pub apartment_id: apartment::Id,
}

impl<Db> Command<DeleteApartment> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Apartment, apartment::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Apartment>, apartment::Id>>,
            Ok = Option<Apartment>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<read::apartment::HasSales, apartment::Id>>,
            Ok = read::apartment::HasSales,
            Err = Traced<database::Error>,
        > + Database<
            Delete<By<Apartment, apartment::Id>>,
            Err = Traced<database::Error>,
        > + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Apartment;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: DeleteApartment,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let DeleteApartment { apartment_id } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Lock(By::<Apartment, _>::new(apartment_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let apartment = tx
            .execute(Select(By::<Option<Apartment>, _>::new(apartment_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::ApartmentNotExists(apartment_id))
            .map_err(tracerr::wrap!())?;

        let has_sales = tx
            .execute(Select(By::<read::apartment::HasSales, _>::new(
                apartment_id,
            )))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if *has_sales {
            return Err(tracerr::new!(E::ApartmentHasSales(apartment_id)));
        }

        tx.execute(Delete(By::<Apartment, _>::new(apartment_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(apartment)
    }
}

/// Error of [`DeleteApartment`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`Apartment`] with the provided ID does not exist.
    #[display("`Apartment(id: {_0})` does not exist")]
    #[from(ignore)]
    ApartmentNotExists(#[error(not(source))] apartment::Id),

    /// [`Apartment`] is referenced by some [`Sale`].
    #[display("`Apartment(id: {_0})` has sales")]
    #[from(ignore)]
    ApartmentHasSales(#[error(not(source))] apartment::Id),
}

#[cfg(test)]
mod spec {
    use crate::{
        domain::apartment,
        spec::{new_apartment, new_sale, service},
        Command as _,
    };

    use super::{DeleteApartment, ExecutionError};

    #[tokio::test]
    async fn deletes_apartment() {
        let svc = service();
        let a = new_apartment(&svc).await;

        let deleted = svc
            .execute(DeleteApartment { apartment_id: a.id })
            .await
            .unwrap();
        assert_eq!(deleted.id, a.id);

        let err = svc
            .execute(DeleteApartment { apartment_id: a.id })
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::ApartmentNotExists(_),
        ));
    }

    #[tokio::test]
    async fn refuses_apartment_with_sales() {
        let svc = service();
        let s = new_sale(&svc).await;

        let err = svc
            .execute(DeleteApartment {
                apartment_id: s.apartment_id,
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::ApartmentHasSales(_),
        ));
    }

    #[tokio::test]
    async fn fails_on_absent_apartment() {
        let svc = service();

        let err = svc
            .execute(DeleteApartment {
                apartment_id: apartment::Id::new(),
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::ApartmentNotExists(_),
        ));
    }
}
