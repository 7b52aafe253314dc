//! [`Command`] for creating a new [`Apartment`].

use common::{
    operations::{Commit, Insert, Transact, Transacted},
    DateTime, Money,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{apartment, Apartment},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for creating a new [`apartment::Status::Available`]
/// [`Apartment`].
#[derive(Clone, Debug)]
pub struct CreateApartment {
    /// [`apartment::Number`] of a new [`Apartment`].
    pub number: apartment::Number,

    /// [`apartment::Block`] of a new [`Apartment`].
    pub block: Option<apartment::Block>,

    /// Floor of a new [`Apartment`].
    pub floor: Option<i16>,

    /// [`apartment::Development`] of a new [`Apartment`].
    pub development: Option<apartment::Development>,

    /// [`apartment::Layout`] of a new [`Apartment`].
    pub layout: apartment::Layout,

    /// Asking price of a new [`Apartment`].
    pub price: Money,

    /// Monthly condominium fee of a new [`Apartment`].
    pub condo_fee: Option<Money>,

    /// [`apartment::Description`] of a new [`Apartment`].
    pub description: Option<apartment::Description>,

    /// Expected delivery of a new [`Apartment`].
    pub delivery_at: Option<apartment::DeliveryDateTime>,
}

impl<Db> Command<CreateApartment> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<Insert<Apartment>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Apartment;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: CreateApartment,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateApartment {
            number,
            block,
            floor,
            development,
            layout,
            price,
            condo_fee,
            description,
            delivery_at,
        } = cmd;

        let apartment = Apartment {
            id: apartment::Id::new(),
            number,
            block,
            floor,
            development,
            layout,
            price,
            condo_fee,
            description,
            delivery_at,
            status: apartment::Status::Available,
            created_at: DateTime::now().coerce(),
        };
        apartment
            .check_conditions()
            .map_err(tracerr::from_and_wrap!(=> E))?;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        tx.execute(Insert(apartment.clone()))
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

/// Error of [`CreateApartment`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`Apartment`] attributes are inconsistent.
    #[display("Invalid `Apartment`: {_0}")]
    InvalidConditions(apartment::ConditionsError),
}

#[cfg(test)]
mod spec {
    use crate::{
        domain::apartment,
        spec::{create_apartment, money, service},
        Command as _,
    };

    use super::ExecutionError;

    #[tokio::test]
    async fn creates_available_apartment() {
        let svc = service();

        let a = svc.execute(create_apartment("250000BRL")).await.unwrap();

        assert_eq!(a.status, apartment::Status::Available);
        assert_eq!(a.price, money("250000BRL"));
    }

    #[tokio::test]
    async fn rejects_inconsistent_apartment() {
        let svc = service();
        let mut cmd = create_apartment("250000BRL");
        cmd.condo_fee = Some(money("500EUR"));

        let err = svc.execute(cmd).await.unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::InvalidConditions(
                apartment::ConditionsError::CurrencyMismatch,
            ),
        ));
    }
}
