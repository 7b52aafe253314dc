//! [`Command`] for updating an [`Apartment`].

use common::{
    operations::{By, Commit, Lock, Select, Transact, Transacted, Update},
    Money,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::Sale;
use crate::{
    domain::{apartment, Apartment},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for replacing the attributes of an [`Apartment`].
///
/// Its [`apartment::Status`] may be toggled only between
/// [`apartment::Status::Available`] and [`apartment::Status::Unavailable`],
/// the other ones being owned by a [`Sale`].
#[derive(Clone, Debug)]
pub struct UpdateApartment {
    /// ID of the [`Apartment`] to update.
    pub apartment_id: apartment::Id,

    /// New [`apartment::Number`].
    pub number: apartment::Number,

    /// New [`apartment::Block`].
    pub block: Option<apartment::Block>,

    /// New floor.
    pub floor: Option<i16>,

    /// New [`apartment::Development`].
    pub development: Option<apartment::Development>,

    /// New [`apartment::Layout`].
    pub layout: apartment::Layout,

    /// New asking price.
    pub price: Money,

    /// New monthly condominium fee.
    pub condo_fee: Option<Money>,

    /// New [`apartment::Description`].
    pub description: Option<apartment::Description>,

    /// New expected delivery.
    pub delivery_at: Option<apartment::DeliveryDateTime>,

    /// New [`apartment::Status`], if it should change.
    pub status: Option<apartment::Status>,
}

impl<Db> Command<UpdateApartment> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Apartment, apartment::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Apartment>, apartment::Id>>,
            Ok = Option<Apartment>,
            Err = Traced<database::Error>,
        > + Database<Update<Apartment>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Apartment;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: UpdateApartment,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let UpdateApartment {
            apartment_id,
            number,
            block,
            floor,
            development,
            layout,
            price,
            condo_fee,
            description,
            delivery_at,
            status,
        } = cmd;

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

        let status = match status {
            Some(to) if to != apartment.status => {
                if !apartment.status.is_manual() || !to.is_manual() {
                    return Err(tracerr::new!(E::StatusNotManual {
                        from: apartment.status,
                        to,
                    }));
                }
                to
            }
            Some(_) | None => apartment.status,
        };

        let apartment = Apartment {
            number,
            block,
            floor,
            development,
            layout,
            price,
            condo_fee,
            description,
            delivery_at,
            status,
            ..apartment
        };
        apartment
            .check_conditions()
            .map_err(tracerr::from_and_wrap!(=> E))?;

        tx.execute(Update(apartment.clone()))
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

/// Error of [`UpdateApartment`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`Apartment`] with the provided ID does not exist.
    #[display("`Apartment(id: {_0})` does not exist")]
    #[from(ignore)]
    ApartmentNotExists(#[error(not(source))] apartment::Id),

    /// [`apartment::Status`] change is owned by a [`Sale`].
    #[display("`Apartment` status cannot be changed from `{from}` to `{to}`")]
    #[from(ignore)]
    StatusNotManual {
        /// Current [`apartment::Status`].
        from: apartment::Status,

        /// Requested [`apartment::Status`].
        to: apartment::Status,
    },

    /// [`Apartment`] attributes are inconsistent.
    #[display("Invalid `Apartment`: {_0}")]
    InvalidConditions(apartment::ConditionsError),
}

#[cfg(test)]
mod spec {
    use crate::{
        domain::{apartment, Apartment},
        spec::{apartment_status, money, new_apartment, new_sale, service},
        Command as _,
    };

    use super::{ExecutionError, UpdateApartment};

    fn update(
        a: &Apartment,
        status: Option<apartment::Status>,
    ) -> UpdateApartment {
        UpdateApartment {
            apartment_id: a.id,
            number: a.number.clone(),
            block: a.block.clone(),
            floor: a.floor,
            development: a.development.clone(),
            layout: a.layout,
            price: money("240000BRL"),
            condo_fee: Some(money("480BRL")),
            description: a.description.clone(),
            delivery_at: a.delivery_at,
            status,
        }
    }

    #[tokio::test]
    async fn toggles_availability() {
        let svc = service();
        let a = new_apartment(&svc).await;

        let updated = svc
            .execute(update(&a, Some(apartment::Status::Unavailable)))
            .await
            .unwrap();
        assert_eq!(updated.status, apartment::Status::Unavailable);
        assert_eq!(updated.price, money("240000BRL"));

        let updated = svc
            .execute(update(&updated, Some(apartment::Status::Available)))
            .await
            .unwrap();
        assert_eq!(updated.status, apartment::Status::Available);
    }

    #[tokio::test]
    async fn refuses_setting_sale_owned_status() {
        let svc = service();
        let a = new_apartment(&svc).await;

        let err = svc
            .execute(update(&a, Some(apartment::Status::Sold)))
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::StatusNotManual { .. },
        ));
        assert_eq!(
            apartment_status(&svc, a.id).await,
            apartment::Status::Available,
        );
    }

    #[tokio::test]
    async fn refuses_releasing_reserved_apartment() {
        let svc = service();
        let s = new_sale(&svc).await;
        assert_eq!(
            apartment_status(&svc, s.apartment_id).await,
            apartment::Status::Reserved,
        );

        let mut cmd = update(&new_apartment(&svc).await, None);
        cmd.apartment_id = s.apartment_id;
        cmd.status = Some(apartment::Status::Available);
        let err = svc.execute(cmd).await.unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::StatusNotManual {
                from: apartment::Status::Reserved,
                to: apartment::Status::Available,
            },
        ));
    }

    #[tokio::test]
    async fn keeps_sale_owned_status_on_other_changes() {
        let svc = service();
        let s = new_sale(&svc).await;

        let mut cmd = update(&new_apartment(&svc).await, None);
        cmd.apartment_id = s.apartment_id;
        let updated = svc.execute(cmd).await.unwrap();

        assert_eq!(updated.status, apartment::Status::Reserved);
    }
}
