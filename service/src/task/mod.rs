//! Background [`Task`]s definitions.

mod background;
pub mod cancel_stale_sales;

pub use common::Handler as Task;

pub use self::{
    background::{Background, Failure},
    cancel_stale_sales::CancelStaleSales,
};
