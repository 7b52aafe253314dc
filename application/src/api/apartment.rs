//! [`Apartment`]-related REST API definitions.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query,
    },
    Json,
};
use common::Money;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use service::{
    command,
    domain::{self, apartment},
    query::{self, Query as _},
    read, Command as _,
};

use crate::{api, define_error, AsError, Context, Error};

/// Apartment for sale.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Apartment {
    /// ID of this [`Apartment`].
    pub id: apartment::Id,

    /// Number of this [`Apartment`] inside its building.
    pub number: String,

    /// Building block.
    pub block: Option<String>,

    /// Floor.
    pub floor: Option<i16>,

    /// Development name.
    pub development: Option<String>,

    /// Total area in square meters.
    pub total_area: Decimal,

    /// Private area in square meters.
    pub private_area: Option<Decimal>,

    /// Number of bedrooms.
    pub bedrooms: u8,

    /// Number of suites.
    pub suites: u8,

    /// Number of bathrooms.
    pub bathrooms: u8,

    /// Number of parking spots.
    pub parking_spots: u8,

    /// Indicator whether there is a balcony.
    pub balcony: bool,

    /// Asking price.
    pub price: Money,

    /// Monthly condominium fee.
    pub condo_fee: Option<Money>,

    /// Description.
    pub description: Option<String>,

    /// Expected delivery.
    #[serde(with = "common::datetime::serde::rfc3339::option")]
    pub delivery_at: Option<apartment::DeliveryDateTime>,

    /// [`apartment::Status`] of this [`Apartment`].
    pub status: apartment::Status,

    /// When this [`Apartment`] was created.
    #[serde(with = "common::datetime::serde::rfc3339")]
    pub created_at: apartment::CreationDateTime,
}

impl From<domain::Apartment> for Apartment {
    fn from(apartment: domain::Apartment) -> Self {
        let domain::Apartment {
            id,
            number,
            block,
            floor,
            development,
            layout:
                apartment::Layout {
                    total_area,
                    private_area,
                    bedrooms,
                    suites,
                    bathrooms,
                    parking_spots,
                    balcony,
                },
            price,
            condo_fee,
            description,
            delivery_at,
            status,
            created_at,
        } = apartment;

        Self {
            id,
            number: number.to_string(),
            block: block.map(|v| v.to_string()),
            floor,
            development: development.map(|v| v.to_string()),
            total_area: total_area.into(),
            private_area: private_area.map(Into::into),
            bedrooms,
            suites,
            bathrooms,
            parking_spots,
            balcony,
            price,
            condo_fee,
            description: description.map(|v| v.to_string()),
            delivery_at,
            status,
            created_at,
        }
    }
}

/// Editable fields of an [`Apartment`].
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fields {
    /// Number inside the building (e.g. `101A`).
    pub number: String,

    /// Building block.
    pub block: Option<String>,

    /// Floor.
    pub floor: Option<i16>,

    /// Development name.
    pub development: Option<String>,

    /// Total area in square meters.
    pub total_area: Decimal,

    /// Private area in square meters.
    pub private_area: Option<Decimal>,

    /// Number of bedrooms.
    #[serde(default)]
    pub bedrooms: u8,

    /// Number of suites.
    #[serde(default)]
    pub suites: u8,

    /// Number of bathrooms.
    #[serde(default)]
    pub bathrooms: u8,

    /// Number of parking spots.
    #[serde(default)]
    pub parking_spots: u8,

    /// Indicator whether there is a balcony.
    #[serde(default)]
    pub balcony: bool,

    /// Asking price (e.g. `250000BRL`).
    pub price: String,

    /// Monthly condominium fee.
    pub condo_fee: Option<String>,

    /// Description.
    pub description: Option<String>,

    /// Expected delivery.
    #[serde(default, with = "common::datetime::serde::rfc3339::option")]
    pub delivery_at: Option<apartment::DeliveryDateTime>,

    /// [`apartment::Status`] to switch into manually.
    ///
    /// Ignored on creation.
    pub status: Option<apartment::Status>,
}

impl Fields {
    /// Validates these [`Fields`] into a [`command::UpdateApartment`] of the
    /// provided [`Apartment`].
    ///
    /// # Errors
    ///
    /// If any of the fields is invalid.
    pub fn into_update(
        self,
        apartment_id: apartment::Id,
    ) -> Result<command::UpdateApartment, Error> {
        let Self {
            number,
            block,
            floor,
            development,
            total_area,
            private_area,
            bedrooms,
            suites,
            bathrooms,
            parking_spots,
            balcony,
            price,
            condo_fee,
            description,
            delivery_at,
            status,
        } = self;

        Ok(command::UpdateApartment {
            apartment_id,
            number: api::parse("number", &number)?,
            block: api::parse_opt("block", block.as_deref())?,
            floor,
            development: api::parse_opt("development", development.as_deref())?,
            layout: apartment::Layout {
                total_area: area("totalArea", total_area)?,
                private_area: private_area
                    .map(|a| area("privateArea", a))
                    .transpose()?,
                bedrooms,
                suites,
                bathrooms,
                parking_spots,
                balcony,
            },
            price: api::parse("price", &price)?,
            condo_fee: api::parse_opt("condoFee", condo_fee.as_deref())?,
            description: api::parse_opt("description", description.as_deref())?,
            delivery_at,
            status,
        })
    }
}

impl TryFrom<Fields> for command::CreateApartment {
    type Error = Error;

    fn try_from(fields: Fields) -> Result<Self, Self::Error> {
        let command::UpdateApartment {
            apartment_id: _,
            number,
            block,
            floor,
            development,
            layout,
            price,
            condo_fee,
            description,
            delivery_at,
            status: _,
        } = fields.into_update(apartment::Id::default())?;

        Ok(Self {
            number,
            block,
            floor,
            development,
            layout,
            price,
            condo_fee,
            description,
            delivery_at,
        })
    }
}

/// Validates the provided `square_meters` of the named `field` as an
/// [`apartment::Area`].
fn area(field: &str, square_meters: Decimal) -> Result<apartment::Area, Error> {
    apartment::Area::new(square_meters)
        .ok_or_else(|| api::invalid(field, &"area must be positive"))
}

/// Filter of the [`Apartment`]s list.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
pub struct ListFilter {
    /// [`apartment::Status`] to filter by.
    pub status: Option<apartment::Status>,
}

/// Lists [`Apartment`]s, optionally filtered by their [`apartment::Status`].
#[tracing::instrument(skip_all, fields(api.name = "listApartments"))]
pub async fn list(
    ctx: Context,
    filter: Result<Query<ListFilter>, QueryRejection>,
) -> Result<Json<Vec<Apartment>>, Error> {
    _ = ctx.current_session().await?;
    let Query(ListFilter { status }) = filter.map_err(AsError::into_error)?;

    let apartments = ctx
        .service()
        .execute(query::apartments::List::by(
            read::apartment::list::Filter { status },
        ))
        .await
        .map_err(AsError::into_error)?;

    Ok(Json(apartments.into_iter().map(Into::into).collect()))
}

/// Returns the [`Apartment`] with the provided ID.
///
/// # Errors
///
/// Possible error codes:
/// - `APARTMENT_NOT_EXISTS` - there is no such [`Apartment`].
#[tracing::instrument(skip_all, fields(api.name = "getApartment"))]
pub async fn get(
    ctx: Context,
    id: Result<Path<apartment::Id>, PathRejection>,
) -> Result<Json<Apartment>, Error> {
    _ = ctx.current_session().await?;
    let Path(id) = id.map_err(AsError::into_error)?;

    ctx.service()
        .execute(query::apartment::ById::by(id))
        .await
        .map_err(AsError::into_error)?
        .map(|a| Json(a.into()))
        .ok_or_else(|| ApartmentError::NotExists.into())
}

/// Creates a new available [`Apartment`].
///
/// # Errors
///
/// Possible error codes:
/// - `INVALID_FIELD` - some of the provided fields is malformed;
/// - `INVALID_APARTMENT` - price, fee or layout are inconsistent.
#[tracing::instrument(skip_all, fields(api.name = "createApartment"))]
pub async fn create(
    ctx: Context,
    input: Result<Json<Fields>, JsonRejection>,
) -> Result<(http::StatusCode, Json<Apartment>), Error> {
    _ = ctx.current_session().await?;
    let Json(input) = input.map_err(AsError::into_error)?;

    let apartment = ctx
        .service()
        .execute(command::CreateApartment::try_from(input)?)
        .await
        .map_err(AsError::into_error)?;

    Ok((http::StatusCode::CREATED, Json(apartment.into())))
}

/// Replaces the attributes of the [`Apartment`] with the provided ID.
///
/// # Errors
///
/// Possible error codes:
/// - `INVALID_FIELD` - some of the provided fields is malformed;
/// - `INVALID_APARTMENT` - price, fee or layout are inconsistent;
/// - `APARTMENT_NOT_EXISTS` - there is no such [`Apartment`];
/// - `STATUS_NOT_MANUAL` - the status is owned by a sale.
#[tracing::instrument(skip_all, fields(api.name = "updateApartment"))]
pub async fn update(
    ctx: Context,
    id: Result<Path<apartment::Id>, PathRejection>,
    input: Result<Json<Fields>, JsonRejection>,
) -> Result<Json<Apartment>, Error> {
    _ = ctx.current_session().await?;
    let Path(id) = id.map_err(AsError::into_error)?;
    let Json(input) = input.map_err(AsError::into_error)?;

    ctx.service()
        .execute(input.into_update(id)?)
        .await
        .map(|a| Json(a.into()))
        .map_err(AsError::into_error)
}

/// Deletes the [`Apartment`] with the provided ID.
///
/// # Errors
///
/// Possible error codes:
/// - `APARTMENT_NOT_EXISTS` - there is no such [`Apartment`];
/// - `APARTMENT_HAS_SALES` - some sale still references the [`Apartment`].
#[tracing::instrument(skip_all, fields(api.name = "deleteApartment"))]
pub async fn delete(
    ctx: Context,
    id: Result<Path<apartment::Id>, PathRejection>,
) -> Result<http::StatusCode, Error> {
    _ = ctx.current_session().await?;
    let Path(apartment_id) = id.map_err(AsError::into_error)?;

    _ = ctx
        .service()
        .execute(command::DeleteApartment { apartment_id })
        .await
        .map_err(AsError::into_error)?;

    Ok(http::StatusCode::NO_CONTENT)
}

define_error! {
    enum ApartmentError {
        #[code = "APARTMENT_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`Apartment` does not exist"]
        NotExists,

        #[code = "INVALID_APARTMENT"]
        #[status = BAD_REQUEST]
        #[message = "`Apartment` attributes are inconsistent"]
        InvalidConditions,

        #[code = "STATUS_NOT_MANUAL"]
        #[status = CONFLICT]
        #[message = "`Apartment` status cannot be changed manually"]
        StatusNotManual,

        #[code = "APARTMENT_HAS_SALES"]
        #[status = CONFLICT]
        #[message = "`Apartment` is referenced by sales"]
        HasSales,
    }
}

impl AsError for command::create_apartment::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::InvalidConditions(e) => Some(
                Error::from(ApartmentError::InvalidConditions).with_message(e),
            ),
        }
    }
}

impl AsError for command::update_apartment::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::ApartmentNotExists(_) => {
                Some(ApartmentError::NotExists.into())
            }
            Self::StatusNotManual { .. } => Some(
                Error::from(ApartmentError::StatusNotManual).with_message(self),
            ),
            Self::InvalidConditions(e) => Some(
                Error::from(ApartmentError::InvalidConditions).with_message(e),
            ),
        }
    }
}

impl AsError for command::delete_apartment::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::ApartmentNotExists(_) => {
                Some(ApartmentError::NotExists.into())
            }
            Self::ApartmentHasSales(_) => Some(ApartmentError::HasSales.into()),
        }
    }
}

#[cfg(test)]
mod spec {
    use service::{
        command::{self, update_apartment},
        domain::apartment,
    };

    use crate::AsError as _;

    use super::Fields;

    fn fields(json: &str) -> Fields {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn validates_fields() {
        let cmd = command::CreateApartment::try_from(fields(
            r#"{
                "number": "101A",
                "totalArea": 70.5,
                "privateArea": "62",
                "bedrooms": 2,
                "suites": 1,
                "price": "250000BRL",
                "condoFee": "450BRL",
                "status": "SOLD"
            }"#,
        ))
        .unwrap();

        assert_eq!(cmd.number.to_string(), "101A");
        assert_eq!(cmd.layout.bedrooms, 2);
        assert_eq!(cmd.price.to_string(), "250000BRL");
        assert_eq!(cmd.condo_fee.map(|f| f.to_string()).as_deref(), Some("450BRL"));
    }

    #[test]
    fn rejects_non_positive_area() {
        let err = command::CreateApartment::try_from(fields(
            r#"{"number": "101", "totalArea": 0, "price": "250000BRL"}"#,
        ))
        .unwrap_err();

        assert_eq!(err.code, "INVALID_FIELD");
        assert!(err.message.contains("`totalArea`"), "{}", err.message);
    }

    #[test]
    fn maps_command_errors() {
        let err = update_apartment::ExecutionError::StatusNotManual {
            from: apartment::Status::Sold,
            to: apartment::Status::Available,
        }
        .as_error();
        assert_eq!(err.status_code, http::StatusCode::CONFLICT);
        assert_eq!(err.code, "STATUS_NOT_MANUAL");

        let err = update_apartment::ExecutionError::InvalidConditions(
            apartment::ConditionsError::SuitesExceedBedrooms,
        )
        .as_error();
        assert_eq!(err.status_code, http::StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "suites must not outnumber bedrooms");
    }
}
