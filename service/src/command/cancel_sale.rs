//! [`Command`] for cancelling a [`Sale`].

use tracerr::Traced;

use crate::{
    domain::{sale, Sale},
    Service,
};

use super::{transit_sale::TransitSale, Command};

pub use super::transit_sale::ExecutionError;

/// [`Command`] for calling off an active [`Sale`], releasing its
/// [`Apartment`].
///
/// [`Apartment`]: crate::domain::Apartment
#[derive(Clone, Copy, Debug)]
pub struct CancelSale {
    /// ID of the [`Sale`] to cancel.
    pub sale_id: sale::Id,
}

impl<Db> Command<CancelSale> for Service<Db>
where
    Self: Command<TransitSale, Ok = Sale, Err = Traced<ExecutionError>>,
{
    type Ok = Sale;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: CancelSale) -> Result<Self::Ok, Self::Err> {
        self.execute(TransitSale {
            sale_id: cmd.sale_id,
            to: sale::Status::Cancelled,
        })
        .await
        .map_err(tracerr::wrap!())
    }
}

#[cfg(test)]
mod spec {
    use crate::{
        command::{ConfirmSale, ReviewSale},
        domain::{apartment, sale},
        spec::{apartment_status, create_sale, new_client, new_sale, service},
        Command as _,
    };

    use super::{CancelSale, ExecutionError};

    #[tokio::test]
    async fn releases_apartment() {
        let svc = service();
        let s = new_sale(&svc).await;

        let cancelled = svc.execute(CancelSale { sale_id: s.id }).await.unwrap();

        assert_eq!(cancelled.status, sale::Status::Cancelled);
        assert!(cancelled.cancelled_at.is_some());
        assert_eq!(
            apartment_status(&svc, s.apartment_id).await,
            apartment::Status::Available,
        );

        let other = new_client(&svc, "11144477735").await;
        let resold = svc
            .execute(create_sale(other.id, s.apartment_id))
            .await
            .unwrap();
        assert_eq!(resold.status, sale::Status::Pending);
    }

    #[tokio::test]
    async fn cancels_reviewed_sale() {
        let svc = service();
        let s = new_sale(&svc).await;
        drop(svc.execute(ReviewSale { sale_id: s.id }).await.unwrap());

        drop(svc.execute(CancelSale { sale_id: s.id }).await.unwrap());

        assert_eq!(
            apartment_status(&svc, s.apartment_id).await,
            apartment::Status::Available,
        );
    }

    #[tokio::test]
    async fn refuses_terminal_sale() {
        let svc = service();
        let s = new_sale(&svc).await;
        drop(svc.execute(ConfirmSale { sale_id: s.id }).await.unwrap());

        let err = svc
            .execute(CancelSale { sale_id: s.id })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::WrongStatus(_)));
        assert_eq!(
            apartment_status(&svc, s.apartment_id).await,
            apartment::Status::Sold,
        );
    }
}
