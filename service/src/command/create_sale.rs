//! [`Command`] for creating a new [`Sale`].

use common::{
    operations::{
        By, Commit, Insert, Lock, Select, Transact, Transacted, Update,
    },
    DateTime, Money,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{apartment, client, sale, Apartment, Client, Sale},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for creating a new [`sale::Status::Pending`] [`Sale`],
/// reserving its [`Apartment`].
#[derive(Clone, Debug)]
pub struct CreateSale {
    /// ID of the [`Client`] buying the [`Apartment`].
    pub client_id: client::Id,

    /// ID of the [`Apartment`] to sell.
    pub apartment_id: apartment::Id,

    /// Agreed price, if it differs from the [`Apartment`] price.
    pub price: Option<Money>,

    /// Payment [`sale::Terms`].
    pub terms: sale::Terms,

    /// [`sale::Seller`] closing the [`Sale`].
    pub seller: Option<sale::Seller>,

    /// Commission of the [`sale::Seller`].
    pub commission: Option<Money>,

    /// [`sale::Notes`] about the [`Sale`].
    pub notes: Option<sale::Notes>,
}

impl<Db> Command<CreateSale> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Apartment, apartment::Id>>,
            Err = Traced<database::Error>,
        > + Database<Lock<By<Client, client::Id>>, Err = Traced<database::Error>>
        + Database<
            Select<By<Option<Apartment>, apartment::Id>>,
            Ok = Option<Apartment>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Client>, client::Id>>,
            Ok = Option<Client>,
            Err = Traced<database::Error>,
        > + Database<Insert<Sale>, Err = Traced<database::Error>>
        + Database<Update<Apartment>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Sale;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: CreateSale) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateSale {
            client_id,
            apartment_id,
            price,
            terms,
            seller,
            commission,
            notes,
        } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Concurrent `CreateSale`s of the same `Apartment` serialize here, so
        // only the first one observes it available.
        tx.execute(Lock(By::<Apartment, _>::new(apartment_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Lock(By::<Client, _>::new(client_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let mut apartment = tx
            .execute(Select(By::<Option<Apartment>, _>::new(apartment_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::ApartmentNotExists(apartment_id))
            .map_err(tracerr::wrap!())?;
        tx.execute(Select(By::<Option<Client>, _>::new(client_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::ClientNotExists(client_id))
            .map_err(tracerr::wrap!())
            .map(drop)?;

        if apartment.status != apartment::Status::Available {
            return Err(tracerr::new!(E::ApartmentNotAvailable {
                id: apartment_id,
                status: apartment.status,
            }));
        }

        let sale = Sale {
            id: sale::Id::new(),
            client_id,
            apartment_id,
            price: price.unwrap_or(apartment.price),
            terms,
            seller,
            commission,
            notes,
            status: sale::Status::Pending,
            created_at: DateTime::now().coerce(),
            confirmed_at: None,
            cancelled_at: None,
            paid_off_at: None,
        };
        sale.check_conditions()
            .map_err(tracerr::from_and_wrap!(=> E))?;

        apartment.status = sale.status.apartment_status();

        tx.execute(Insert(sale.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Update(apartment))
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

/// Error of [`CreateSale`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`Client`] with the provided ID does not exist.
    #[display("`Client(id: {_0})` does not exist")]
    #[from(ignore)]
    ClientNotExists(#[error(not(source))] client::Id),

    /// [`Apartment`] with the provided ID does not exist.
    #[display("`Apartment(id: {_0})` does not exist")]
    #[from(ignore)]
    ApartmentNotExists(#[error(not(source))] apartment::Id),

    /// [`Apartment`] is not [`apartment::Status::Available`].
    #[display("`Apartment(id: {id})` is `{status}`, not available for sale")]
    #[from(ignore)]
    ApartmentNotAvailable {
        /// ID of the [`Apartment`].
        id: apartment::Id,

        /// Current [`apartment::Status`] of the [`Apartment`].
        status: apartment::Status,
    },

    /// [`Sale`] conditions are inconsistent.
    #[display("Invalid `Sale` conditions: {_0}")]
    InvalidConditions(sale::ConditionsError),
}

#[cfg(test)]
mod spec {
    use common::operations::{By, Select, Update};

    use crate::{
        command::ConfirmSale,
        domain::{apartment, client, sale, Sale},
        infra::{Database as _, Memory},
        read,
        spec::{
            apartment_status, create_sale, money, new_apartment, new_client,
            service,
        },
        Command as _, Service,
    };

    use super::ExecutionError;

    #[tokio::test]
    async fn reserves_apartment() {
        let svc = service();
        let c = new_client(&svc, "52998224725").await;
        let a = new_apartment(&svc).await;

        let s = svc.execute(create_sale(c.id, a.id)).await.unwrap();

        assert_eq!(s.status, sale::Status::Pending);
        assert_eq!(s.price, a.price, "price defaults to `Apartment` one");
        assert_eq!(
            apartment_status(&svc, a.id).await,
            apartment::Status::Reserved,
        );
    }

    /// Returns all the [`Sale`]s of the provided [`Apartment`].
    ///
    /// [`Apartment`]: crate::domain::Apartment
    async fn sales_of(svc: &Service<Memory>, id: apartment::Id) -> Vec<Sale> {
        svc.database()
            .execute(Select(By::<Vec<Sale>, _>::new(
                read::sale::list::Filter {
                    apartment_id: Some(id),
                    ..read::sale::list::Filter::default()
                },
            )))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn refuses_reserved_apartment() {
        let svc = service();
        let c1 = new_client(&svc, "52998224725").await;
        let c2 = new_client(&svc, "11144477735").await;
        let a = new_apartment(&svc).await;
        drop(svc.execute(create_sale(c1.id, a.id)).await.unwrap());

        let err = svc.execute(create_sale(c2.id, a.id)).await.unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::ApartmentNotAvailable {
                status: apartment::Status::Reserved,
                ..
            },
        ));
        assert_eq!(
            sales_of(&svc, a.id).await.len(),
            1,
            "no `Sale` is persisted on conflict",
        );
    }

    #[tokio::test]
    async fn refuses_sold_apartment() {
        let svc = service();
        let c1 = new_client(&svc, "52998224725").await;
        let c2 = new_client(&svc, "11144477735").await;
        let a = new_apartment(&svc).await;
        let s = svc.execute(create_sale(c1.id, a.id)).await.unwrap();
        drop(svc.execute(ConfirmSale { sale_id: s.id }).await.unwrap());
        assert_eq!(apartment_status(&svc, a.id).await, apartment::Status::Sold);

        let err = svc.execute(create_sale(c2.id, a.id)).await.unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::ApartmentNotAvailable {
                status: apartment::Status::Sold,
                ..
            },
        ));
        let sales = sales_of(&svc, a.id).await;
        assert_eq!(
            sales.iter().map(|s| s.id).collect::<Vec<_>>(),
            [s.id],
            "no `Sale` is persisted on conflict",
        );
        assert_eq!(apartment_status(&svc, a.id).await, apartment::Status::Sold);
    }

    #[tokio::test]
    async fn refuses_unavailable_apartment() {
        let svc = service();
        let c = new_client(&svc, "52998224725").await;
        let mut a = new_apartment(&svc).await;
        a.status = apartment::Status::Unavailable;
        svc.database().execute(Update(a.clone())).await.unwrap();

        let err = svc.execute(create_sale(c.id, a.id)).await.unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::ApartmentNotAvailable {
                status: apartment::Status::Unavailable,
                ..
            },
        ));
        assert!(sales_of(&svc, a.id).await.is_empty());
        assert_eq!(
            apartment_status(&svc, a.id).await,
            apartment::Status::Unavailable,
        );
    }

    #[tokio::test]
    async fn fails_on_absent_references() {
        let svc = service();
        let c = new_client(&svc, "52998224725").await;
        let a = new_apartment(&svc).await;

        let err = svc
            .execute(create_sale(client::Id::new(), a.id))
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::ClientNotExists(_)));
        assert_eq!(
            apartment_status(&svc, a.id).await,
            apartment::Status::Available,
        );

        let err = svc
            .execute(create_sale(c.id, apartment::Id::new()))
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::ApartmentNotExists(_),
        ));
    }

    #[tokio::test]
    async fn rejects_inconsistent_terms() {
        let svc = service();
        let c = new_client(&svc, "52998224725").await;
        let a = new_apartment(&svc).await;
        let mut cmd = create_sale(c.id, a.id);
        cmd.terms.down_payment = Some(money("300000BRL"));

        let err = svc.execute(cmd).await.unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::InvalidConditions(
                sale::ConditionsError::DownPaymentExceedsPrice,
            ),
        ));
        assert_eq!(
            apartment_status(&svc, a.id).await,
            apartment::Status::Available,
        );
    }

    #[tokio::test]
    async fn serializes_concurrent_sales() {
        let svc = service();
        let c1 = new_client(&svc, "52998224725").await;
        let c2 = new_client(&svc, "11144477735").await;
        let a = new_apartment(&svc).await;

        let (r1, r2) = tokio::join!(
            svc.execute(create_sale(c1.id, a.id)),
            svc.execute(create_sale(c2.id, a.id)),
        );

        assert_eq!(
            usize::from(r1.is_ok()) + usize::from(r2.is_ok()),
            1,
            "exactly one `Sale` wins",
        );
    }
}
