//! [`Command`] for confirming a [`Sale`].

use tracerr::Traced;

use crate::{
    domain::{sale, Sale},
    Service,
};

use super::{transit_sale::TransitSale, Command};

pub use super::transit_sale::ExecutionError;

/// [`Command`] for closing an active [`Sale`], marking its [`Apartment`] as
/// sold.
///
/// [`Apartment`]: crate::domain::Apartment
#[derive(Clone, Copy, Debug)]
pub struct ConfirmSale {
    /// ID of the [`Sale`] to confirm.
    pub sale_id: sale::Id,
}

impl<Db> Command<ConfirmSale> for Service<Db>
where
    Self: Command<TransitSale, Ok = Sale, Err = Traced<ExecutionError>>,
{
    type Ok = Sale;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: ConfirmSale) -> Result<Self::Ok, Self::Err> {
        self.execute(TransitSale {
            sale_id: cmd.sale_id,
            to: sale::Status::Confirmed,
        })
        .await
        .map_err(tracerr::wrap!())
    }
}
