//! [`Command`] definition.

pub mod authorize_user_session;
pub mod cancel_sale;
pub mod confirm_sale;
pub mod create_apartment;
pub mod create_client;
pub mod create_sale;
pub mod create_user;
pub mod create_user_session;
pub mod delete_apartment;
pub mod delete_client;
pub mod delete_sale;
pub mod review_sale;
pub mod transit_sale;
pub mod update_apartment;
pub mod update_client;
pub mod update_sale;

/// [`Command`] of the [`Service`].
///
/// [`Service`]: crate::Service
pub use common::Handler as Command;

pub use self::{
    authorize_user_session::AuthorizeUserSession, cancel_sale::CancelSale,
    confirm_sale::ConfirmSale, create_apartment::CreateApartment,
    create_client::CreateClient, create_sale::CreateSale,
    create_user::CreateUser, create_user_session::CreateUserSession,
    delete_apartment::DeleteApartment, delete_client::DeleteClient,
    delete_sale::DeleteSale, review_sale::ReviewSale,
    transit_sale::TransitSale, update_apartment::UpdateApartment,
    update_client::UpdateClient, update_sale::UpdateSale,
};

#[cfg(test)]
mod spec {
    //! Scenarios spanning several [`Command`]s.

    use crate::{
        domain::{apartment, sale},
        spec::{
            apartment_status, create_sale, new_apartment, new_client, service,
            stored_sale,
        },
    };

    use super::{CancelSale, Command as _, ConfirmSale};

    #[tokio::test]
    async fn sold_apartment_cannot_be_resold() {
        let svc = service();
        let c1 = new_client(&svc, "52998224725").await;
        let c2 = new_client(&svc, "11144477735").await;
        let a1 = new_apartment(&svc).await;

        let s1 = svc.execute(create_sale(c1.id, a1.id)).await.unwrap();
        assert_eq!(s1.status, sale::Status::Pending);
        assert_eq!(
            apartment_status(&svc, a1.id).await,
            apartment::Status::Reserved,
        );

        let s1 = svc.execute(ConfirmSale { sale_id: s1.id }).await.unwrap();
        assert_eq!(s1.status, sale::Status::Confirmed);
        assert_eq!(apartment_status(&svc, a1.id).await, apartment::Status::Sold);

        assert!(svc.execute(create_sale(c2.id, a1.id)).await.is_err());
        assert_eq!(apartment_status(&svc, a1.id).await, apartment::Status::Sold);
    }

    #[tokio::test]
    async fn cancelled_apartment_can_be_resold() {
        let svc = service();
        let c1 = new_client(&svc, "52998224725").await;
        let c2 = new_client(&svc, "11144477735").await;
        let a1 = new_apartment(&svc).await;

        let s1 = svc.execute(create_sale(c1.id, a1.id)).await.unwrap();
        let s1 = svc.execute(CancelSale { sale_id: s1.id }).await.unwrap();
        assert_eq!(s1.status, sale::Status::Cancelled);
        assert_eq!(
            apartment_status(&svc, a1.id).await,
            apartment::Status::Available,
        );

        let s2 = svc.execute(create_sale(c2.id, a1.id)).await.unwrap();
        assert_eq!(s2.status, sale::Status::Pending);
        assert_eq!(
            stored_sale(&svc, s1.id).await.map(|s| s.status),
            Some(sale::Status::Cancelled),
        );
    }
}
