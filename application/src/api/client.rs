//! [`Client`]-related REST API definitions.

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
    domain::{self, client},
    query::{self, Query as _},
    read, Command as _,
};

use crate::{api, define_error, AsError, Context, Error};

/// Buyer of an apartment.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    /// ID of this [`Client`].
    pub id: client::Id,

    /// Full name of this [`Client`].
    pub name: String,

    /// CPF of this [`Client`] as 11 digits.
    pub cpf: String,

    /// Email address of this [`Client`].
    pub email: Option<String>,

    /// Phone number of this [`Client`].
    pub phone: Option<String>,

    /// Street address of this [`Client`].
    pub address: Option<String>,

    /// City of this [`Client`].
    pub city: Option<String>,

    /// Two-letter state code of this [`Client`].
    pub state: Option<String>,

    /// Zip code of this [`Client`] as 8 digits.
    pub zip_code: Option<String>,

    /// Birth date of this [`Client`].
    #[serde(with = "common::datetime::serde::rfc3339::option")]
    pub birth_date: Option<client::BirthDateTime>,

    /// Monthly income of this [`Client`].
    pub monthly_income: Option<Money>,

    /// [`client::Status`] of this [`Client`].
    pub status: client::Status,

    /// Notes about this [`Client`].
    pub notes: Option<String>,

    /// When this [`Client`] was created.
    #[serde(with = "common::datetime::serde::rfc3339")]
    pub created_at: client::CreationDateTime,
}

impl From<domain::Client> for Client {
    fn from(client: domain::Client) -> Self {
        let domain::Client {
            id,
            name,
            cpf,
            contacts:
                client::Contacts {
                    email,
                    phone,
                    address,
                    city,
                    state,
                    zip_code,
                },
            birth_date,
            monthly_income,
            status,
            notes,
            created_at,
        } = client;

        Self {
            id,
            name: name.to_string(),
            cpf: cpf.to_string(),
            email: email.map(|v| v.to_string()),
            phone: phone.map(|v| v.to_string()),
            address: address.map(|v| v.to_string()),
            city: city.map(|v| v.to_string()),
            state: state.map(|v| v.to_string()),
            zip_code: zip_code.map(|v| v.to_string()),
            birth_date,
            monthly_income,
            status,
            notes: notes.map(|v| v.to_string()),
            created_at,
        }
    }
}

/// Editable fields of a [`Client`].
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fields {
    /// Full name.
    pub name: String,

    /// Email address.
    pub email: Option<String>,

    /// Phone number.
    pub phone: Option<String>,

    /// Street address.
    pub address: Option<String>,

    /// City.
    pub city: Option<String>,

    /// Two-letter state code.
    pub state: Option<String>,

    /// Zip code, either `12345678` or `12345-678`.
    pub zip_code: Option<String>,

    /// Birth date.
    #[serde(default, with = "common::datetime::serde::rfc3339::option")]
    pub birth_date: Option<client::BirthDateTime>,

    /// Monthly income (e.g. `12000BRL`).
    pub monthly_income: Option<String>,

    /// [`client::Status`], [`client::Status::Active`] by default.
    #[serde(default)]
    pub status: client::Status,

    /// Notes.
    pub notes: Option<String>,
}

impl Fields {
    /// Validates these [`Fields`] into a [`command::UpdateClient`] of the
    /// provided [`Client`].
    ///
    /// # Errors
    ///
    /// If any of the fields is invalid.
    pub fn into_update(
        self,
        client_id: client::Id,
    ) -> Result<command::UpdateClient, Error> {
        let Self {
            name,
            email,
            phone,
            address,
            city,
            state,
            zip_code,
            birth_date,
            monthly_income,
            status,
            notes,
        } = self;

        Ok(command::UpdateClient {
            client_id,
            name: api::parse("name", &name)?,
            contacts: client::Contacts {
                email: api::parse_opt("email", email.as_deref())?,
                phone: api::parse_opt("phone", phone.as_deref())?,
                address: api::parse_opt("address", address.as_deref())?,
                city: api::parse_opt("city", city.as_deref())?,
                state: api::parse_opt("state", state.as_deref())?,
                zip_code: api::parse_opt("zipCode", zip_code.as_deref())?,
            },
            birth_date,
            monthly_income: api::parse_opt(
                "monthlyIncome",
                monthly_income.as_deref(),
            )?,
            status,
            notes: api::parse_opt("notes", notes.as_deref())?,
        })
    }
}

/// Input for creating a new [`Client`].
#[derive(Clone, Debug, Deserialize)]
pub struct NewClient {
    /// CPF, either bare or formatted.
    pub cpf: String,

    /// Rest of the [`Fields`].
    #[serde(flatten)]
    pub fields: Fields,
}

impl TryFrom<NewClient> for command::CreateClient {
    type Error = Error;

    fn try_from(input: NewClient) -> Result<Self, Self::Error> {
        let NewClient { cpf, fields } = input;
        let cpf = api::parse("cpf", &cpf)?;
        let command::UpdateClient {
            client_id: _,
            name,
            contacts,
            birth_date,
            monthly_income,
            status,
            notes,
        } = fields.into_update(client::Id::default())?;

        Ok(Self {
            name,
            cpf,
            contacts,
            birth_date,
            monthly_income,
            status,
            notes,
        })
    }
}

/// Filter of the [`Client`]s list.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
pub struct ListFilter {
    /// [`client::Status`] to filter by.
    pub status: Option<client::Status>,
}

/// Lists [`Client`]s, optionally filtered by their [`client::Status`].
#[tracing::instrument(skip_all, fields(api.name = "listClients"))]
pub async fn list(
    ctx: Context,
    filter: Result<Query<ListFilter>, QueryRejection>,
) -> Result<Json<Vec<Client>>, Error> {
    _ = ctx.current_session().await?;
    let Query(ListFilter { status }) = filter.map_err(AsError::into_error)?;

    let clients = ctx
        .service()
        .execute(query::clients::List::by(read::client::list::Filter {
            status,
        }))
        .await
        .map_err(AsError::into_error)?;

    Ok(Json(clients.into_iter().map(Into::into).collect()))
}

/// Returns the [`Client`] with the provided ID.
///
/// # Errors
///
/// Possible error codes:
/// - `CLIENT_NOT_EXISTS` - there is no such [`Client`].
#[tracing::instrument(skip_all, fields(api.name = "getClient"))]
pub async fn get(
    ctx: Context,
    id: Result<Path<client::Id>, PathRejection>,
) -> Result<Json<Client>, Error> {
    _ = ctx.current_session().await?;
    let Path(id) = id.map_err(AsError::into_error)?;

    ctx.service()
        .execute(query::client::ById::by(id))
        .await
        .map_err(AsError::into_error)?
        .map(|c| Json(c.into()))
        .ok_or_else(|| ClientError::NotExists.into())
}

/// Creates a new [`Client`].
///
/// # Errors
///
/// Possible error codes:
/// - `INVALID_FIELD` - some of the provided fields is malformed;
/// - `CPF_OCCUPIED` - the CPF belongs to another [`Client`];
/// - `NEGATIVE_INCOME` - monthly income is below zero.
#[tracing::instrument(skip_all, fields(api.name = "createClient"))]
pub async fn create(
    ctx: Context,
    input: Result<Json<NewClient>, JsonRejection>,
) -> Result<(http::StatusCode, Json<Client>), Error> {
    _ = ctx.current_session().await?;
    let Json(input) = input.map_err(AsError::into_error)?;

    let client = ctx
        .service()
        .execute(command::CreateClient::try_from(input)?)
        .await
        .map_err(AsError::into_error)?;

    Ok((http::StatusCode::CREATED, Json(client.into())))
}

/// Replaces the editable fields of the [`Client`] with the provided ID.
///
/// # Errors
///
/// Possible error codes:
/// - `INVALID_FIELD` - some of the provided fields is malformed;
/// - `CLIENT_NOT_EXISTS` - there is no such [`Client`];
/// - `NEGATIVE_INCOME` - monthly income is below zero.
#[tracing::instrument(skip_all, fields(api.name = "updateClient"))]
pub async fn update(
    ctx: Context,
    id: Result<Path<client::Id>, PathRejection>,
    input: Result<Json<Fields>, JsonRejection>,
) -> Result<Json<Client>, Error> {
    _ = ctx.current_session().await?;
    let Path(id) = id.map_err(AsError::into_error)?;
    let Json(input) = input.map_err(AsError::into_error)?;

    ctx.service()
        .execute(input.into_update(id)?)
        .await
        .map(|c| Json(c.into()))
        .map_err(AsError::into_error)
}

/// Deletes the [`Client`] with the provided ID.
///
/// # Errors
///
/// Possible error codes:
/// - `CLIENT_NOT_EXISTS` - there is no such [`Client`];
/// - `CLIENT_HAS_SALES` - some sale still references the [`Client`].
#[tracing::instrument(skip_all, fields(api.name = "deleteClient"))]
pub async fn delete(
    ctx: Context,
    id: Result<Path<client::Id>, PathRejection>,
) -> Result<http::StatusCode, Error> {
    _ = ctx.current_session().await?;
    let Path(client_id) = id.map_err(AsError::into_error)?;

    _ = ctx
        .service()
        .execute(command::DeleteClient { client_id })
        .await
        .map_err(AsError::into_error)?;

    Ok(http::StatusCode::NO_CONTENT)
}

define_error! {
    enum ClientError {
        #[code = "CLIENT_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`Client` does not exist"]
        NotExists,

        #[code = "CPF_OCCUPIED"]
        #[status = CONFLICT]
        #[message = "CPF is occupied by another `Client`"]
        CpfOccupied,

        #[code = "NEGATIVE_INCOME"]
        #[status = BAD_REQUEST]
        #[message = "Monthly income must not be negative"]
        NegativeIncome,

        #[code = "CLIENT_HAS_SALES"]
        #[status = CONFLICT]
        #[message = "`Client` is referenced by sales"]
        HasSales,
    }
}

impl AsError for command::create_client::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::CpfOccupied(_) => Some(ClientError::CpfOccupied.into()),
            Self::NegativeIncome => Some(ClientError::NegativeIncome.into()),
        }
    }
}

impl AsError for command::update_client::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::ClientNotExists(_) => Some(ClientError::NotExists.into()),
            Self::NegativeIncome => Some(ClientError::NegativeIncome.into()),
        }
    }
}

impl AsError for command::delete_client::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::ClientNotExists(_) => Some(ClientError::NotExists.into()),
            Self::ClientHasSales(_) => Some(ClientError::HasSales.into()),
        }
    }
}

#[cfg(test)]
mod spec {
    use service::{
        command::{self, create_client, delete_client},
        domain::client,
    };

    use crate::AsError as _;

    use super::NewClient;

    fn input(json: &str) -> NewClient {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn validates_new_client() {
        let cmd = command::CreateClient::try_from(input(
            r#"{
                "cpf": "529.982.247-25",
                "name": "Maria Souza",
                "email": "Maria@Example.com",
                "zipCode": "01310-100",
                "birthDate": "1990-05-17T00:00:00Z",
                "monthlyIncome": "12000BRL"
            }"#,
        ))
        .unwrap();

        assert_eq!(cmd.cpf.to_string(), "52998224725");
        assert_eq!(cmd.status, client::Status::Active);
        assert_eq!(
            cmd.contacts.email.map(|e| e.to_string()).as_deref(),
            Some("maria@example.com"),
        );
        assert_eq!(
            cmd.contacts.zip_code.map(|z| z.to_string()).as_deref(),
            Some("01310100"),
        );
        assert!(cmd.birth_date.is_some());
    }

    #[test]
    fn rejects_malformed_fields() {
        let err = command::CreateClient::try_from(input(
            r#"{"cpf": "52998224725", "name": "Maria", "state": "São Paulo"}"#,
        ))
        .unwrap_err();

        assert_eq!(err.code, "INVALID_FIELD");
        assert!(err.message.contains("`state`"), "{}", err.message);
    }

    #[test]
    fn maps_command_errors() {
        let cpf = client::Cpf::new("52998224725").unwrap();
        let err = create_client::ExecutionError::CpfOccupied(cpf).as_error();
        assert_eq!(err.status_code, http::StatusCode::CONFLICT);
        assert_eq!(err.code, "CPF_OCCUPIED");

        let id = client::Id::new();
        let err = delete_client::ExecutionError::ClientHasSales(id).as_error();
        assert_eq!(err.status_code, http::StatusCode::CONFLICT);

        let err = delete_client::ExecutionError::ClientNotExists(id).as_error();
        assert_eq!(err.status_code, http::StatusCode::NOT_FOUND);
    }
}
