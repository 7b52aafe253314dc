//! [`Query`] definition.

pub mod apartment;
pub mod apartments;
pub mod client;
pub mod clients;
pub mod sale;
pub mod sales;
pub mod user;

use common::operations::{By, Select};
use tracerr::Traced;

use crate::{
    infra::{database, Database},
    Service,
};

/// [`Query`] of the [`Service`].
pub use common::Handler as Query;

/// [`Query`] [`Select`]ing a `T`ype from a [`Database`].
#[derive(Clone, Copy, Debug)]
#[expect(clippy::module_name_repetitions, reason = "more readable")]
pub struct DatabaseQuery<T>(T);

impl<W, B> DatabaseQuery<By<W, B>> {
    /// Creates a new [`DatabaseQuery`] selecting a `W` by the provided `B`.
    #[must_use]
    pub fn by(by: B) -> Self {
        Self(By::new(by))
    }
}

impl<Db, W, B> Query<DatabaseQuery<By<W, B>>> for Service<Db>
where
    Db: Database<Select<By<W, B>>, Ok = W, Err = Traced<database::Error>>,
{
    type Ok = W;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        DatabaseQuery(by): DatabaseQuery<By<W, B>>,
    ) -> Result<Self::Ok, Self::Err> {
        self.database()
            .execute(Select(by))
            .await
            .map_err(tracerr::wrap!())
    }
}

#[cfg(test)]
mod spec {
    use crate::{
        command::{CancelSale, ConfirmSale},
        domain::{client, sale},
        read,
        spec::{
            create_client, create_sale, new_apartment, new_client, service,
        },
        Command as _, Query as _,
    };

    use super::{clients, sale as by_id, sales};

    #[tokio::test]
    async fn filters_clients_by_status() {
        let svc = service();
        let active = new_client(&svc, "52998224725").await;
        let mut cmd = create_client("11144477735");
        cmd.status = client::Status::Prospect;
        let prospect = svc.execute(cmd).await.unwrap();

        let all = svc
            .execute(clients::List::by(read::client::list::Filter::default()))
            .await
            .unwrap();
        assert_eq!(all.len(), 2);
        assert!(all.iter().any(|c| c.id == active.id));

        let prospects = svc
            .execute(clients::List::by(read::client::list::Filter {
                status: Some(client::Status::Prospect),
            }))
            .await
            .unwrap();
        assert_eq!(
            prospects.iter().map(|c| c.id).collect::<Vec<_>>(),
            [prospect.id],
        );
    }

    #[tokio::test]
    async fn filters_sales() {
        let svc = service();
        let c1 = new_client(&svc, "52998224725").await;
        let c2 = new_client(&svc, "11144477735").await;
        let a1 = new_apartment(&svc).await;
        let a2 = new_apartment(&svc).await;
        let s1 = svc.execute(create_sale(c1.id, a1.id)).await.unwrap();
        let s2 = svc.execute(create_sale(c2.id, a2.id)).await.unwrap();
        drop(svc.execute(ConfirmSale { sale_id: s2.id }).await.unwrap());

        let of_c1 = svc
            .execute(sales::List::by(read::sale::list::Filter {
                client_id: Some(c1.id),
                ..read::sale::list::Filter::default()
            }))
            .await
            .unwrap();
        assert_eq!(of_c1.iter().map(|s| s.id).collect::<Vec<_>>(), [s1.id]);

        let confirmed = svc
            .execute(sales::List::by(read::sale::list::Filter {
                status: Some(sale::Status::Confirmed),
                ..read::sale::list::Filter::default()
            }))
            .await
            .unwrap();
        assert_eq!(
            confirmed.iter().map(|s| s.id).collect::<Vec<_>>(),
            [s2.id],
        );

        drop(svc.execute(CancelSale { sale_id: s1.id }).await.unwrap());
        let s1 = svc
            .execute(by_id::ById::by(s1.id))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(s1.status, sale::Status::Cancelled);
        let absent = svc
            .execute(by_id::ById::by(sale::Id::new()))
            .await
            .unwrap();
        assert!(absent.is_none());
    }
}
