//! [`Command`] for updating a [`Sale`].

use common::{
    operations::{By, Commit, Lock, Select, Transact, Transacted, Update},
    Money,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{sale, Sale},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for replacing the commercial conditions of a not cancelled
/// [`Sale`].
///
/// Never changes the [`sale::Status`].
#[derive(Clone, Debug)]
pub struct UpdateSale {
    /// ID of the [`Sale`] to update.
    pub sale_id: sale::Id,

    /// New agreed price, if it should change.
    pub price: Option<Money>,

    /// New payment [`sale::Terms`].
    pub terms: sale::Terms,

    /// New [`sale::Seller`].
    pub seller: Option<sale::Seller>,

    /// New commission of the [`sale::Seller`].
    pub commission: Option<Money>,

    /// New [`sale::Notes`].
    pub notes: Option<sale::Notes>,

    /// [`DateTime`] the [`Sale`] was fully paid off, allowed for a
    /// [`sale::Status::Confirmed`] [`Sale`] only.
    ///
    /// [`DateTime`]: common::DateTime
    pub paid_off_at: Option<sale::PayoffDateTime>,
}

impl<Db> Command<UpdateSale> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<Lock<By<Sale, sale::Id>>, Err = Traced<database::Error>>
        + Database<
            Select<By<Option<Sale>, sale::Id>>,
            Ok = Option<Sale>,
            Err = Traced<database::Error>,
        > + Database<Update<Sale>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Sale;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: UpdateSale) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let UpdateSale {
            sale_id,
            price,
            terms,
            seller,
            commission,
            notes,
            paid_off_at,
        } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

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
        if sale.status == sale::Status::Cancelled {
            return Err(tracerr::new!(E::SaleCancelled(sale_id)));
        }

        let mut sale = Sale {
            price: price.unwrap_or(sale.price),
            terms,
            seller,
            commission,
            notes,
            ..sale
        };
        sale.check_conditions()
            .map_err(tracerr::from_and_wrap!(=> E))?;
        sale.set_paid_off_at(paid_off_at)
            .map_err(tracerr::from_and_wrap!(=> E))?;

        tx.execute(Update(sale.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(sale)
    }
}

/// Error of [`UpdateSale`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`Sale`] with the provided ID does not exist.
    #[display("`Sale(id: {_0})` does not exist")]
    #[from(ignore)]
    SaleNotExists(#[error(not(source))] sale::Id),

    /// [`Sale`] is cancelled, so cannot be changed.
    #[display("`Sale(id: {_0})` is cancelled")]
    #[from(ignore)]
    SaleCancelled(#[error(not(source))] sale::Id),

    /// [`Sale`] conditions are inconsistent.
    #[display("Invalid `Sale` conditions: {_0}")]
    InvalidConditions(sale::ConditionsError),

    /// [`Sale`] payoff cannot be recorded.
    #[display("Invalid `Sale` payoff: {_0}")]
    InvalidPayoff(sale::PayoffError),
}
