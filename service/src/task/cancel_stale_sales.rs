//! [`CancelStaleSales`] [`Task`].

use std::{convert::Infallible, error::Error, time};

use common::operations::{By, Perform, Start};
use tokio::time::interval;
use tracerr::Traced;
use tracing as log;

use crate::{
    command::{cancel_sale, CancelSale},
    domain::{sale, Sale},
    infra::database,
    query, read, Command, Query, Service,
};

use super::Task;

/// Configuration for [`CancelStaleSales`] [`Task`].
#[derive(Clone, Copy, Debug)]
pub struct Config {
    /// Interval between stale [`Sale`]s lookups.
    pub interval: time::Duration,

    /// Age after which a [`sale::Status::Pending`] [`Sale`] is considered
    /// stale.
    pub timeout: time::Duration,
}

/// [`Task`] cancelling [`sale::Status::Pending`] [`Sale`]s which have been
/// reserving their [`Apartment`]s for too long.
///
/// [`Apartment`]: crate::domain::Apartment
#[derive(Clone, Copy, Debug)]
pub struct CancelStaleSales<S> {
    /// [`Config`] of this [`Task`].
    config: Config,

    /// [`Service`] instance.
    service: S,
}

impl<Db> Task<Start<By<CancelStaleSales<Self>, Config>>> for Service<Db>
where
    CancelStaleSales<Service<Db>>: Task<Perform<()>, Ok = usize, Err: Error>
        + Send
        + Sync
        + 'static,
    Self: Clone,
{
    type Ok = ();
    type Err = Infallible;

    async fn execute(
        &self,
        Start(by): Start<By<CancelStaleSales<Self>, Config>>,
    ) -> Result<Self::Ok, Self::Err> {
        let config = by.into_inner();
        let task = CancelStaleSales {
            config,
            service: self.clone(),
        };

        let mut interval = interval(task.config.interval);
        loop {
            let _ = interval.tick().await;
            match task.execute(Perform(())).await {
                Ok(0) => {}
                Ok(n) => log::info!("`task::CancelStaleSales` cancelled {n}"),
                Err(e) => log::error!("`task::CancelStaleSales` failed: {e}"),
            }
        }
    }
}

impl<Db> Task<Perform<()>> for CancelStaleSales<Service<Db>>
where
    Service<Db>: Query<
            query::sales::Stale,
            Ok = Vec<sale::Id>,
            Err = Traced<database::Error>,
        > + Command<
            CancelSale,
            Ok = Sale,
            Err = Traced<cancel_sale::ExecutionError>,
        >,
{
    /// Number of cancelled [`Sale`]s.
    type Ok = usize;
    type Err = ExecutionError;

    async fn execute(&self, _: Perform<()>) -> Result<Self::Ok, Self::Err> {
        let Some(created_before) =
            sale::CreationDateTime::now().checked_sub(self.config.timeout)
        else {
            log::warn!(
                "`task::CancelStaleSales` timeout of {:?} reaches beyond \
                 representable dates, skipping",
                self.config.timeout,
            );
            return Ok(0);
        };
        let stale = read::sale::Stale { created_before };
        let ids = self
            .service
            .execute(query::sales::Stale::by(stale))
            .await
            .map_err(tracerr::wrap!())?;

        let mut cancelled = 0;
        for sale_id in ids {
            // The `Sale` may have moved on since the lookup, so a failure
            // here concerns this `Sale` only.
            match self.service.execute(CancelSale { sale_id }).await {
                Ok(_) => cancelled += 1,
                Err(e) => log::warn!(
                    "`task::CancelStaleSales` failed to cancel \
                     `Sale(id: {sale_id})`: {e}",
                ),
            }
        }
        Ok(cancelled)
    }
}

/// Error of [`CancelStaleSales`] execution.
pub type ExecutionError = Traced<database::Error>;

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use common::operations::{Perform, Update};

    use crate::{
        command::ConfirmSale,
        domain::{apartment, sale, Sale},
        infra::{Database as _, Memory},
        spec::{
            ago, apartment_status, create_sale, new_apartment, new_client,
            service, stored_sale,
        },
        Command as _, Service, Task as _,
    };

    use super::{CancelStaleSales, Config};

    const MONTH: Duration = Duration::from_secs(30 * 24 * 60 * 60);

    /// Moves the creation of the provided [`Sale`] into the past.
    async fn backdate(svc: &Service<Memory>, sale: &Sale, age: Duration) {
        let mut sale = stored_sale(svc, sale.id).await.unwrap();
        sale.created_at = ago(age);
        svc.database().execute(Update(sale)).await.unwrap();
    }

    #[tokio::test]
    async fn cancels_only_stale_pending_sales() {
        let svc = service();
        let client = new_client(&svc, "52998224725").await;

        let mut sales = Vec::new();
        for _ in 0..3 {
            let a = new_apartment(&svc).await;
            let s = svc.execute(create_sale(client.id, a.id)).await.unwrap();
            sales.push(s);
        }
        let [stale, fresh, confirmed] = <[Sale; 3]>::try_from(sales).unwrap();

        drop(
            svc.execute(ConfirmSale {
                sale_id: confirmed.id,
            })
            .await
            .unwrap(),
        );
        backdate(&svc, &stale, MONTH + Duration::from_secs(60)).await;
        backdate(&svc, &confirmed, MONTH * 2).await;

        let task = CancelStaleSales {
            config: Config {
                interval: Duration::from_secs(60 * 60),
                timeout: MONTH,
            },
            service: svc.clone(),
        };
        let cancelled = task.execute(Perform(())).await.unwrap();

        assert_eq!(cancelled, 1);
        assert_eq!(
            stored_sale(&svc, stale.id).await.unwrap().status,
            sale::Status::Cancelled,
        );
        assert_eq!(
            apartment_status(&svc, stale.apartment_id).await,
            apartment::Status::Available,
        );
        assert_eq!(
            stored_sale(&svc, fresh.id).await.unwrap().status,
            sale::Status::Pending,
        );
        assert_eq!(
            stored_sale(&svc, confirmed.id).await.unwrap().status,
            sale::Status::Confirmed,
        );

        assert_eq!(task.execute(Perform(())).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn skips_unrepresentable_timeout() {
        let svc = service();
        let client = new_client(&svc, "52998224725").await;
        let a = new_apartment(&svc).await;
        let s = svc.execute(create_sale(client.id, a.id)).await.unwrap();
        backdate(&svc, &s, MONTH * 12).await;

        let task = CancelStaleSales {
            config: Config {
                interval: Duration::from_secs(60 * 60),
                timeout: Duration::MAX,
            },
            service: svc.clone(),
        };

        assert_eq!(task.execute(Perform(())).await.unwrap(), 0);
        assert_eq!(
            stored_sale(&svc, s.id).await.unwrap().status,
            sale::Status::Pending,
        );
    }
}
