//! [`Sale`]-related REST API definitions.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query,
    },
    Json,
};
use common::Money;
use serde::{Deserialize, Serialize};
use service::{
    command,
    domain::{self, apartment, client, sale},
    query::{self, Query as _},
    read, Command as _,
};

use crate::{api, define_error, AsError, Context, Error};

/// Sale of an apartment to a client.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    /// ID of this [`Sale`].
    pub id: sale::Id,

    /// ID of the buying client.
    pub client_id: client::Id,

    /// ID of the apartment being sold.
    pub apartment_id: apartment::Id,

    /// Agreed price.
    pub price: Money,

    /// Payment method.
    pub payment_method: Option<String>,

    /// Down payment.
    pub down_payment: Option<Money>,

    /// [`Installments`] plan.
    pub installments: Option<Installments>,

    /// Seller who closed this [`Sale`].
    pub seller: Option<String>,

    /// Commission of the seller.
    pub commission: Option<Money>,

    /// Notes.
    pub notes: Option<String>,

    /// [`sale::Status`] of this [`Sale`].
    pub status: sale::Status,

    /// When this [`Sale`] was created.
    #[serde(with = "common::datetime::serde::rfc3339")]
    pub created_at: sale::CreationDateTime,

    /// When this [`Sale`] was confirmed.
    #[serde(with = "common::datetime::serde::rfc3339::option")]
    pub confirmed_at: Option<sale::ConfirmationDateTime>,

    /// When this [`Sale`] was cancelled.
    #[serde(with = "common::datetime::serde::rfc3339::option")]
    pub cancelled_at: Option<sale::CancellationDateTime>,

    /// When this [`Sale`] was fully paid off.
    #[serde(with = "common::datetime::serde::rfc3339::option")]
    pub paid_off_at: Option<sale::PayoffDateTime>,
}

impl From<domain::Sale> for Sale {
    fn from(sale: domain::Sale) -> Self {
        let domain::Sale {
            id,
            client_id,
            apartment_id,
            price,
            terms:
                sale::Terms {
                    payment_method,
                    down_payment,
                    installments,
                },
            seller,
            commission,
            notes,
            status,
            created_at,
            confirmed_at,
            cancelled_at,
            paid_off_at,
        } = sale;

        Self {
            id,
            client_id,
            apartment_id,
            price,
            payment_method: payment_method.map(|v| v.to_string()),
            down_payment,
            installments: installments.map(|i| Installments {
                count: i.count,
                amount: i.amount,
                first_due_at: i.first_due_at,
            }),
            seller: seller.map(|v| v.to_string()),
            commission,
            notes: notes.map(|v| v.to_string()),
            status,
            created_at,
            confirmed_at,
            cancelled_at,
            paid_off_at,
        }
    }
}

/// Installments plan of a [`Sale`].
#[derive(Clone, Copy, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Installments {
    /// Number of installments.
    pub count: u16,

    /// Amount of a single installment.
    pub amount: Money,

    /// When the first installment is due.
    #[serde(with = "common::datetime::serde::rfc3339::option")]
    pub first_due_at: Option<sale::DueDateTime>,
}

/// Input of an [`Installments`] plan.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewInstallments {
    /// Number of installments.
    pub count: u16,

    /// Amount of a single installment (e.g. `1666.67BRL`).
    pub amount: String,

    /// When the first installment is due.
    #[serde(default, with = "common::datetime::serde::rfc3339::option")]
    pub first_due_at: Option<sale::DueDateTime>,
}

/// Commercial fields of a [`Sale`].
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fields {
    /// Agreed price, the apartment price if omitted.
    pub price: Option<String>,

    /// Payment method (e.g. `Financing`).
    pub payment_method: Option<String>,

    /// Down payment.
    pub down_payment: Option<String>,

    /// [`Installments`] plan.
    pub installments: Option<NewInstallments>,

    /// Seller who closed the [`Sale`].
    pub seller: Option<String>,

    /// Commission of the seller.
    pub commission: Option<String>,

    /// Notes.
    pub notes: Option<String>,

    /// When the [`Sale`] was fully paid off, for a confirmed [`Sale`] only.
    #[serde(default, with = "common::datetime::serde::rfc3339::option")]
    pub paid_off_at: Option<sale::PayoffDateTime>,
}

impl Fields {
    /// Validates these [`Fields`] into a [`command::UpdateSale`] of the
    /// provided [`Sale`].
    ///
    /// # Errors
    ///
    /// If any of the fields is invalid.
    pub fn into_update(
        self,
        sale_id: sale::Id,
    ) -> Result<command::UpdateSale, Error> {
        let Self {
            price,
            payment_method,
            down_payment,
            installments,
            seller,
            commission,
            notes,
            paid_off_at,
        } = self;

        let installments = installments
            .map(|i| {
                Ok::<_, Error>(sale::Installments {
                    count: i.count,
                    amount: api::parse("installments.amount", &i.amount)?,
                    first_due_at: i.first_due_at,
                })
            })
            .transpose()?;

        Ok(command::UpdateSale {
            sale_id,
            price: api::parse_opt("price", price.as_deref())?,
            terms: sale::Terms {
                payment_method: api::parse_opt(
                    "paymentMethod",
                    payment_method.as_deref(),
                )?,
                down_payment: api::parse_opt(
                    "downPayment",
                    down_payment.as_deref(),
                )?,
                installments,
            },
            seller: api::parse_opt("seller", seller.as_deref())?,
            commission: api::parse_opt("commission", commission.as_deref())?,
            notes: api::parse_opt("notes", notes.as_deref())?,
            paid_off_at,
        })
    }
}

/// Input for creating a new [`Sale`].
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSale {
    /// ID of the buying client.
    pub client_id: client::Id,

    /// ID of the apartment to sell.
    pub apartment_id: apartment::Id,

    /// Rest of the [`Fields`].
    #[serde(flatten)]
    pub fields: Fields,
}

impl TryFrom<NewSale> for command::CreateSale {
    type Error = Error;

    fn try_from(input: NewSale) -> Result<Self, Self::Error> {
        let NewSale {
            client_id,
            apartment_id,
            fields,
        } = input;
        let command::UpdateSale {
            sale_id: _,
            price,
            terms,
            seller,
            commission,
            notes,
            paid_off_at,
        } = fields.into_update(sale::Id::default())?;
        if paid_off_at.is_some() {
            return Err(api::invalid(
                "paidOffAt",
                &"a new `Sale` cannot be paid off",
            ));
        }

        Ok(Self {
            client_id,
            apartment_id,
            price,
            terms,
            seller,
            commission,
            notes,
        })
    }
}

/// Filter of the [`Sale`]s list.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListFilter {
    /// ID of the client to filter by.
    pub client_id: Option<client::Id>,

    /// ID of the apartment to filter by.
    pub apartment_id: Option<apartment::Id>,

    /// [`sale::Status`] to filter by.
    pub status: Option<sale::Status>,
}

impl From<ListFilter> for read::sale::list::Filter {
    fn from(filter: ListFilter) -> Self {
        let ListFilter {
            client_id,
            apartment_id,
            status,
        } = filter;
        Self {
            client_id,
            apartment_id,
            status,
        }
    }
}

/// Lists [`Sale`]s, optionally filtered by client, apartment and
/// [`sale::Status`].
#[tracing::instrument(skip_all, fields(api.name = "listSales"))]
pub async fn list(
    ctx: Context,
    filter: Result<Query<ListFilter>, QueryRejection>,
) -> Result<Json<Vec<Sale>>, Error> {
    _ = ctx.current_session().await?;
    let Query(filter) = filter.map_err(AsError::into_error)?;

    let sales = ctx
        .service()
        .execute(query::sales::List::by(filter.into()))
        .await
        .map_err(AsError::into_error)?;

    Ok(Json(sales.into_iter().map(Into::into).collect()))
}

/// Returns the [`Sale`] with the provided ID.
///
/// # Errors
///
/// Possible error codes:
/// - `SALE_NOT_EXISTS` - there is no such [`Sale`].
#[tracing::instrument(skip_all, fields(api.name = "getSale"))]
pub async fn get(
    ctx: Context,
    id: Result<Path<sale::Id>, PathRejection>,
) -> Result<Json<Sale>, Error> {
    _ = ctx.current_session().await?;
    let Path(id) = id.map_err(AsError::into_error)?;

    ctx.service()
        .execute(query::sale::ById::by(id))
        .await
        .map_err(AsError::into_error)?
        .map(|s| Json(s.into()))
        .ok_or_else(|| SaleError::NotExists.into())
}

/// Creates a new pending [`Sale`], reserving its apartment.
///
/// # Errors
///
/// Possible error codes:
/// - `INVALID_FIELD` - some of the provided fields is malformed;
/// - `CLIENT_NOT_EXISTS` - there is no such client;
/// - `APARTMENT_NOT_EXISTS` - there is no such apartment;
/// - `APARTMENT_NOT_AVAILABLE` - the apartment is not available for sale;
/// - `INVALID_SALE` - payment terms are inconsistent.
#[tracing::instrument(
    skip_all,
    fields(api.name = "createSale", apartment.id = tracing::field::Empty),
)]
pub async fn create(
    ctx: Context,
    input: Result<Json<NewSale>, JsonRejection>,
) -> Result<(http::StatusCode, Json<Sale>), Error> {
    _ = ctx.current_session().await?;
    let Json(input) = input.map_err(AsError::into_error)?;
    _ = tracing::Span::current()
        .record("apartment.id", tracing::field::display(input.apartment_id));

    let sale = ctx
        .service()
        .execute(command::CreateSale::try_from(input)?)
        .await
        .map_err(AsError::into_error)?;

    Ok((http::StatusCode::CREATED, Json(sale.into())))
}

/// Replaces the commercial fields of the [`Sale`] with the provided ID.
///
/// # Errors
///
/// Possible error codes:
/// - `INVALID_FIELD` - some of the provided fields is malformed;
/// - `SALE_NOT_EXISTS` - there is no such [`Sale`];
/// - `SALE_CANCELLED` - the [`Sale`] is cancelled;
/// - `INVALID_SALE` - payment terms are inconsistent;
/// - `INVALID_PAYOFF` - the [`Sale`] is not confirmed, or the payoff
///   precedes its confirmation.
#[tracing::instrument(skip_all, fields(api.name = "updateSale"))]
pub async fn update(
    ctx: Context,
    id: Result<Path<sale::Id>, PathRejection>,
    input: Result<Json<Fields>, JsonRejection>,
) -> Result<Json<Sale>, Error> {
    _ = ctx.current_session().await?;
    let Path(id) = id.map_err(AsError::into_error)?;
    let Json(input) = input.map_err(AsError::into_error)?;

    ctx.service()
        .execute(input.into_update(id)?)
        .await
        .map(|s| Json(s.into()))
        .map_err(AsError::into_error)
}

/// Moves the [`Sale`] with the provided ID under review.
///
/// # Errors
///
/// Possible error codes:
/// - `SALE_NOT_EXISTS` - there is no such [`Sale`];
/// - `WRONG_SALE_STATUS` - the [`Sale`] is not pending.
#[tracing::instrument(skip_all, fields(api.name = "reviewSale"))]
pub async fn review(
    ctx: Context,
    id: Result<Path<sale::Id>, PathRejection>,
) -> Result<Json<Sale>, Error> {
    _ = ctx.current_session().await?;
    let Path(sale_id) = id.map_err(AsError::into_error)?;

    ctx.service()
        .execute(command::ReviewSale { sale_id })
        .await
        .map(|s| Json(s.into()))
        .map_err(AsError::into_error)
}

/// Confirms the [`Sale`] with the provided ID, marking its apartment sold.
///
/// # Errors
///
/// Possible error codes:
/// - `SALE_NOT_EXISTS` - there is no such [`Sale`];
/// - `WRONG_SALE_STATUS` - the [`Sale`] is neither pending nor under review.
#[tracing::instrument(skip_all, fields(api.name = "confirmSale"))]
pub async fn confirm(
    ctx: Context,
    id: Result<Path<sale::Id>, PathRejection>,
) -> Result<Json<Sale>, Error> {
    _ = ctx.current_session().await?;
    let Path(sale_id) = id.map_err(AsError::into_error)?;

    ctx.service()
        .execute(command::ConfirmSale { sale_id })
        .await
        .map(|s| Json(s.into()))
        .map_err(AsError::into_error)
}

/// Cancels the [`Sale`] with the provided ID, releasing its apartment.
///
/// # Errors
///
/// Possible error codes:
/// - `SALE_NOT_EXISTS` - there is no such [`Sale`];
/// - `WRONG_SALE_STATUS` - the [`Sale`] is already confirmed or cancelled.
#[tracing::instrument(skip_all, fields(api.name = "cancelSale"))]
pub async fn cancel(
    ctx: Context,
    id: Result<Path<sale::Id>, PathRejection>,
) -> Result<Json<Sale>, Error> {
    _ = ctx.current_session().await?;
    let Path(sale_id) = id.map_err(AsError::into_error)?;

    ctx.service()
        .execute(command::CancelSale { sale_id })
        .await
        .map(|s| Json(s.into()))
        .map_err(AsError::into_error)
}

/// Deletes the [`Sale`] with the provided ID.
///
/// # Errors
///
/// Possible error codes:
/// - `SALE_NOT_EXISTS` - there is no such [`Sale`].
#[tracing::instrument(skip_all, fields(api.name = "deleteSale"))]
pub async fn delete(
    ctx: Context,
    id: Result<Path<sale::Id>, PathRejection>,
) -> Result<http::StatusCode, Error> {
    _ = ctx.current_session().await?;
    let Path(sale_id) = id.map_err(AsError::into_error)?;

    _ = ctx
        .service()
        .execute(command::DeleteSale { sale_id })
        .await
        .map_err(AsError::into_error)?;

    Ok(http::StatusCode::NO_CONTENT)
}

define_error! {
    enum SaleError {
        #[code = "SALE_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`Sale` does not exist"]
        NotExists,

        #[code = "CLIENT_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`Client` does not exist"]
        ClientNotExists,

        #[code = "APARTMENT_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`Apartment` does not exist"]
        ApartmentNotExists,

        #[code = "APARTMENT_NOT_AVAILABLE"]
        #[status = CONFLICT]
        #[message = "`Apartment` is not available for sale"]
        ApartmentNotAvailable,

        #[code = "WRONG_SALE_STATUS"]
        #[status = CONFLICT]
        #[message = "`Sale` cannot move into the requested status"]
        WrongStatus,

        #[code = "SALE_CANCELLED"]
        #[status = CONFLICT]
        #[message = "`Sale` is cancelled"]
        Cancelled,

        #[code = "INVALID_SALE"]
        #[status = BAD_REQUEST]
        #[message = "`Sale` payment terms are inconsistent"]
        InvalidConditions,

        #[code = "INVALID_PAYOFF"]
        #[status = CONFLICT]
        #[message = "`Sale` payoff cannot be recorded"]
        InvalidPayoff,
    }
}

impl AsError for command::create_sale::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::ClientNotExists(_) => Some(SaleError::ClientNotExists.into()),
            Self::ApartmentNotExists(_) => {
                Some(SaleError::ApartmentNotExists.into())
            }
            Self::ApartmentNotAvailable { .. } => Some(
                Error::from(SaleError::ApartmentNotAvailable)
                    .with_message(self),
            ),
            Self::InvalidConditions(e) => Some(
                Error::from(SaleError::InvalidConditions).with_message(e),
            ),
        }
    }
}

impl AsError for command::transit_sale::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::SaleNotExists(_) => Some(SaleError::NotExists.into()),
            // `Apartment` of an existing `Sale` is never deleted.
            Self::ApartmentNotExists(_) => None,
            Self::WrongStatus(e) => {
                Some(Error::from(SaleError::WrongStatus).with_message(e))
            }
        }
    }
}

impl AsError for command::update_sale::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::SaleNotExists(_) => Some(SaleError::NotExists.into()),
            Self::SaleCancelled(_) => Some(SaleError::Cancelled.into()),
            Self::InvalidConditions(e) => Some(
                Error::from(SaleError::InvalidConditions).with_message(e),
            ),
            Self::InvalidPayoff(e) => {
                Some(Error::from(SaleError::InvalidPayoff).with_message(e))
            }
        }
    }
}

impl AsError for command::delete_sale::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::SaleNotExists(_) => Some(SaleError::NotExists.into()),
        }
    }
}

#[cfg(test)]
mod spec {
    use std::str::FromStr as _;

    use common::{DateTime, Money};
    use service::{
        command::{self, create_sale, transit_sale, update_sale},
        domain::{self, apartment, client, sale},
    };

    use crate::AsError as _;

    use super::{NewSale, Sale};

    #[test]
    fn validates_new_sale() {
        let input: NewSale = serde_json::from_str(
            r#"{
                "clientId": "0b6f1c8e-4a4e-4d84-9a3e-8f1f3c0f7b11",
                "apartmentId": "7d3c2a10-5b6e-4f0a-8c1d-2e9f4b7a6c55",
                "paymentMethod": "Financing",
                "downPayment": "50000BRL",
                "installments": {
                    "count": 120,
                    "amount": "1666.67BRL",
                    "firstDueAt": "2026-01-10T00:00:00Z"
                },
                "seller": "João"
            }"#,
        )
        .unwrap();

        let cmd = command::CreateSale::try_from(input).unwrap();

        assert!(cmd.price.is_none(), "defaults to the apartment price");
        let installments = cmd.terms.installments.unwrap();
        assert_eq!(installments.count, 120);
        assert_eq!(installments.amount.to_string(), "1666.67BRL");
        assert!(installments.first_due_at.is_some());
        assert_eq!(cmd.seller.map(|s| s.to_string()).as_deref(), Some("João"));
    }

    #[test]
    fn rejects_malformed_installments() {
        let input: NewSale = serde_json::from_str(
            r#"{
                "clientId": "0b6f1c8e-4a4e-4d84-9a3e-8f1f3c0f7b11",
                "apartmentId": "7d3c2a10-5b6e-4f0a-8c1d-2e9f4b7a6c55",
                "installments": {"count": 12, "amount": "a lot"}
            }"#,
        )
        .unwrap();

        let err = command::CreateSale::try_from(input).unwrap_err();

        assert_eq!(err.code, "INVALID_FIELD");
        assert!(err.message.contains("`installments.amount`"));
    }

    #[test]
    fn maps_unavailable_apartment_to_conflict() {
        let err = create_sale::ExecutionError::ApartmentNotAvailable {
            id: apartment::Id::new(),
            status: apartment::Status::Reserved,
        }
        .as_error();

        assert_eq!(err.status_code, http::StatusCode::CONFLICT);
        assert_eq!(err.code, "APARTMENT_NOT_AVAILABLE");
        assert!(err.message.contains("`RESERVED`"), "{}", err.message);
    }

    #[test]
    fn maps_wrong_transition_to_conflict() {
        let err = transit_sale::ExecutionError::WrongStatus(
            sale::TransitionError {
                from: sale::Status::Confirmed,
                to: sale::Status::Confirmed,
            },
        )
        .as_error();
        assert_eq!(err.status_code, http::StatusCode::CONFLICT);
        assert_eq!(err.code, "WRONG_SALE_STATUS");

        let err = transit_sale::ExecutionError::SaleNotExists(sale::Id::new())
            .as_error();
        assert_eq!(err.status_code, http::StatusCode::NOT_FOUND);
    }

    #[test]
    fn refuses_payoff_of_new_sale() {
        let input: NewSale = serde_json::from_str(
            r#"{
                "clientId": "0b6f1c8e-4a4e-4d84-9a3e-8f1f3c0f7b11",
                "apartmentId": "7d3c2a10-5b6e-4f0a-8c1d-2e9f4b7a6c55",
                "paidOffAt": "2026-01-10T00:00:00Z"
            }"#,
        )
        .unwrap();

        let err = command::CreateSale::try_from(input).unwrap_err();

        assert_eq!(err.code, "INVALID_FIELD");
        assert!(err.message.contains("`paidOffAt`"), "{}", err.message);
    }

    #[test]
    fn maps_payoff_of_unconfirmed_sale_to_conflict() {
        let err = update_sale::ExecutionError::InvalidPayoff(
            sale::PayoffError::NotConfirmed(sale::Status::Pending),
        )
        .as_error();

        assert_eq!(err.status_code, http::StatusCode::CONFLICT);
        assert_eq!(err.code, "INVALID_PAYOFF");
        assert!(err.message.contains("`PENDING`"), "{}", err.message);
    }

    #[test]
    fn renders_all_amounts_alike() {
        let money = |s| Money::from_str(s).unwrap();
        let confirmed_at = DateTime::from_rfc3339("2026-01-05T12:00:00Z")
            .unwrap();
        let sale = domain::Sale {
            id: sale::Id::new(),
            client_id: client::Id::new(),
            apartment_id: apartment::Id::new(),
            price: money("250000BRL"),
            terms: sale::Terms {
                payment_method: None,
                down_payment: Some(money("50000BRL")),
                installments: Some(sale::Installments {
                    count: 120,
                    amount: money("1666.67BRL"),
                    first_due_at: None,
                }),
            },
            seller: None,
            commission: Some(money("7500BRL")),
            notes: None,
            status: sale::Status::Confirmed,
            created_at: confirmed_at.coerce(),
            confirmed_at: Some(confirmed_at.coerce()),
            cancelled_at: None,
            paid_off_at: Some(confirmed_at.coerce()),
        };

        let json = serde_json::to_value(Sale::from(sale)).unwrap();

        assert_eq!(json["price"], "250000BRL");
        assert_eq!(json["downPayment"], "50000BRL");
        assert_eq!(json["installments"]["amount"], "1666.67BRL");
        assert_eq!(json["commission"], "7500BRL");
        assert_eq!(json["paidOffAt"], "2026-01-05T12:00:00Z");
    }
}
