//! [`Command`] for moving a [`Sale`] into another [`sale::Status`].

use common::{
    operations::{By, Commit, Lock, Select, Transact, Transacted, Update},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

#[cfg(doc)]
use super::{CancelSale, ConfirmSale, ReviewSale};
use crate::{
    domain::{apartment, sale, Apartment, Sale},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for moving a [`Sale`] into another [`sale::Status`], along
/// with the [`apartment::Status`] of its [`Apartment`].
///
/// Backs the [`ReviewSale`], [`ConfirmSale`] and [`CancelSale`] [`Command`]s.
#[derive(Clone, Copy, Debug)]
pub struct TransitSale {
    /// ID of the [`Sale`] to move.
    pub sale_id: sale::Id,

    /// [`sale::Status`] to move the [`Sale`] into.
    pub to: sale::Status,
}

impl<Db> Command<TransitSale> for Service<Db>
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
        > + Database<Update<Sale>, Err = Traced<database::Error>>
        + Database<Update<Apartment>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Sale;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: TransitSale) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let TransitSale { sale_id, to } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // `Apartment` is locked before its `Sale` everywhere, so the `Sale` is
        // read once to know which `Apartment` to lock, and then re-read under
        // both locks.
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

        let mut sale = tx
            .execute(Select(By::<Option<Sale>, _>::new(sale_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::SaleNotExists(sale_id))
            .map_err(tracerr::wrap!())?;
        let mut apartment = tx
            .execute(Select(By::<Option<Apartment>, _>::new(apartment_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::ApartmentNotExists(apartment_id))
            .map_err(tracerr::wrap!())?;

        sale.transition(to, DateTime::now())
            .map_err(tracerr::from_and_wrap!(=> E))?;

        tx.execute(Update(sale.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let apartment_status = sale.status.apartment_status();
        if apartment.status != apartment_status {
            apartment.status = apartment_status;
            tx.execute(Update(apartment))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))
                .map(drop)?;
        }

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(sale)
    }
}

/// Error of [`TransitSale`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`Sale`] with the provided ID does not exist.
    #[display("`Sale(id: {_0})` does not exist")]
    #[from(ignore)]
    SaleNotExists(#[error(not(source))] sale::Id),

    /// [`Apartment`] of the [`Sale`] does not exist.
    #[display("`Apartment(id: {_0})` does not exist")]
    #[from(ignore)]
    ApartmentNotExists(#[error(not(source))] apartment::Id),

    /// [`Sale`] cannot move into the requested [`sale::Status`].
    #[display("{_0}")]
    WrongStatus(sale::TransitionError),
}
