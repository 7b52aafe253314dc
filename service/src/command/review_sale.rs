//! [`Command`] for putting a [`Sale`] under review.

use tracerr::Traced;

use crate::{
    domain::{sale, Sale},
    Service,
};

use super::{transit_sale::TransitSale, Command};

pub use super::transit_sale::ExecutionError;

/// [`Command`] for moving a [`sale::Status::Pending`] [`Sale`] into
/// [`sale::Status::UnderReview`].
///
/// The [`Apartment`] stays reserved.
///
/// [`Apartment`]: crate::domain::Apartment
#[derive(Clone, Copy, Debug)]
pub struct ReviewSale {
    /// ID of the [`Sale`] to review.
    pub sale_id: sale::Id,
}

impl<Db> Command<ReviewSale> for Service<Db>
where
    Self: Command<TransitSale, Ok = Sale, Err = Traced<ExecutionError>>,
{
    type Ok = Sale;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: ReviewSale) -> Result<Self::Ok, Self::Err> {
        self.execute(TransitSale {
            sale_id: cmd.sale_id,
            to: sale::Status::UnderReview,
        })
        .await
        .map_err(tracerr::wrap!())
    }
}

#[cfg(test)]
mod spec {
    use crate::{
        domain::{apartment, sale},
        spec::{apartment_status, new_sale, service},
        Command as _,
    };

    use super::{ExecutionError, ReviewSale};

    #[tokio::test]
    async fn keeps_apartment_reserved() {
        let svc = service();
        let s = new_sale(&svc).await;

        let reviewed = svc.execute(ReviewSale { sale_id: s.id }).await.unwrap();

        assert_eq!(reviewed.status, sale::Status::UnderReview);
        assert_eq!(
            apartment_status(&svc, s.apartment_id).await,
            apartment::Status::Reserved,
        );
    }

    #[tokio::test]
    async fn reviews_only_pending_sale() {
        let svc = service();
        let s = new_sale(&svc).await;
        drop(svc.execute(ReviewSale { sale_id: s.id }).await.unwrap());

        let err = svc
            .execute(ReviewSale { sale_id: s.id })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::WrongStatus(_)));
    }
}
