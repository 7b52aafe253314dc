//! REST API definitions.

pub mod apartment;
pub mod auth;
pub mod client;
pub mod sale;

use std::{fmt, str::FromStr};

use axum::{
    routing::{get, post},
    Extension, Router,
};

use crate::{define_error, Error, Service};

pub use self::{
    apartment::Apartment, auth::User, client::Client, sale::Sale,
};

/// Builds the REST API [`Router`] serving the provided [`Service`].
pub fn router(service: Service) -> Router {
    Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/me", get(auth::me))
        .route("/clients", get(client::list).post(client::create))
        .route(
            "/clients/:id",
            get(client::get).put(client::update).delete(client::delete),
        )
        .route("/apartments", get(apartment::list).post(apartment::create))
        .route(
            "/apartments/:id",
            get(apartment::get)
                .put(apartment::update)
                .delete(apartment::delete),
        )
        .route("/sales", get(sale::list).post(sale::create))
        .route(
            "/sales/:id",
            get(sale::get).put(sale::update).delete(sale::delete),
        )
        .route("/sales/:id/review", post(sale::review))
        .route("/sales/:id/confirm", post(sale::confirm))
        .route("/sales/:id/cancel", post(sale::cancel))
        .layer(Extension(service))
}

/// Parses the raw `value` of the named request `field`.
///
/// # Errors
///
/// With `INVALID_FIELD` [`Error`] naming the `field`.
pub(crate) fn parse<T>(field: &str, value: &str) -> Result<T, Error>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    value.parse().map_err(|e| invalid(field, &e))
}

/// Creates an `INVALID_FIELD` [`Error`] naming the `field` and the `reason`.
pub(crate) fn invalid(field: &str, reason: &impl fmt::Display) -> Error {
    Error::from(InputError::InvalidField)
        .with_message(&format!("Invalid `{field}` field: {reason}"))
}

/// Same as [`parse()`], but for an optional `value`.
///
/// # Errors
///
/// With `INVALID_FIELD` [`Error`] naming the `field`.
pub(crate) fn parse_opt<T>(
    field: &str,
    value: Option<&str>,
) -> Result<Option<T>, Error>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    value.map(|v| parse(field, v)).transpose()
}

define_error! {
    enum InputError {
        #[code = "INVALID_FIELD"]
        #[status = BAD_REQUEST]
        #[message = "Invalid request field"]
        InvalidField,
    }
}

#[cfg(test)]
mod spec {
    use common::Money;
    use service::domain::client;

    use super::{parse, parse_opt};

    #[test]
    fn names_invalid_field() {
        let err = parse::<client::Cpf>("cpf", "123.456.789-00").unwrap_err();

        assert_eq!(err.status_code, http::StatusCode::BAD_REQUEST);
        assert_eq!(err.code, "INVALID_FIELD");
        assert_eq!(err.message, "Invalid `cpf` field: invalid `Cpf`");
    }

    #[test]
    fn parses_optional_fields() {
        assert_eq!(parse_opt::<Money>("price", None).unwrap(), None);
        assert_eq!(
            parse_opt::<Money>("price", Some("1250.50BRL"))
                .unwrap()
                .map(|m| m.to_string()),
            Some("1250.5BRL".to_owned()),
        );
        assert!(parse_opt::<Money>("price", Some("lots")).is_err());
    }
}
