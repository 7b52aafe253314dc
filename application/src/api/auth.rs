//! Authentication REST API definitions.

use axum::{extract::rejection::JsonRejection, Json};
use secrecy::{SecretBox, SecretString};
use serde::{Deserialize, Serialize};
use service::{
    command,
    domain::user,
    query::{self, Query as _},
    Command as _,
};

use crate::{api, define_error, AsError, Context, Error, Session};

/// Operator of the platform.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// ID of this [`User`].
    pub id: user::Id,

    /// Login of this [`User`].
    pub login: String,

    /// Email of this [`User`].
    pub email: String,

    /// [`user::Role`] of this [`User`].
    pub role: user::Role,

    /// Indicator whether this [`User`] may sign in.
    pub is_active: bool,

    /// When this [`User`] was created.
    #[serde(with = "common::datetime::serde::rfc3339")]
    pub created_at: user::CreationDateTime,
}

impl From<service::domain::User> for User {
    fn from(user: service::domain::User) -> Self {
        Self {
            id: user.id,
            login: user.login.to_string(),
            email: user.email.to_string(),
            role: user.role,
            is_active: user.is_active,
            created_at: user.created_at,
        }
    }
}

/// Input for registering a new [`User`].
#[derive(Debug, Deserialize)]
pub struct Registration {
    /// Login, 3 to 64 characters of `[a-zA-Z0-9_.-]`.
    pub login: String,

    /// Email address.
    pub email: String,

    /// Password, 8 to 128 characters.
    pub password: SecretString,

    /// [`user::Role`], [`user::Role::User`] by default.
    #[serde(default)]
    pub role: user::Role,
}

impl TryFrom<Registration> for command::CreateUser {
    type Error = Error;

    fn try_from(input: Registration) -> Result<Self, Self::Error> {
        use secrecy::ExposeSecret as _;

        let Registration {
            login,
            email,
            password,
            role,
        } = input;

        Ok(Self {
            login: api::parse("login", &login)?,
            email: api::parse("email", &email)?,
            password: SecretBox::new(Box::new(api::parse(
                "password",
                password.expose_secret(),
            )?)),
            role,
        })
    }
}

/// Credentials of a [`User`].
#[derive(Debug, Deserialize)]
pub struct Credentials {
    /// Login of the [`User`].
    pub login: String,

    /// Password of the [`User`].
    pub password: SecretString,
}

/// Issued session of a [`User`].
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionOutput {
    /// Bearer token authorizing requests.
    pub token: String,

    /// [`User`] the session belongs to.
    pub user: User,

    /// When the token expires.
    #[serde(with = "common::datetime::serde::rfc3339")]
    pub expires_at: user::session::ExpirationDateTime,
}

/// Registers a new [`User`].
///
/// # Errors
///
/// Possible error codes:
/// - `INVALID_FIELD` - some of the provided fields is malformed;
/// - `LOGIN_OCCUPIED` - the login belongs to another [`User`];
/// - `EMAIL_OCCUPIED` - the email belongs to another [`User`].
#[tracing::instrument(skip_all, fields(api.name = "register"))]
pub async fn register(
    ctx: Context,
    input: Result<Json<Registration>, JsonRejection>,
) -> Result<(http::StatusCode, Json<User>), Error> {
    let Json(input) = input.map_err(AsError::into_error)?;

    let user = ctx
        .service()
        .execute(command::CreateUser::try_from(input)?)
        .await
        .map_err(AsError::into_error)?;

    Ok((http::StatusCode::CREATED, Json(user.into())))
}

/// Signs a [`User`] in, issuing a bearer token.
///
/// # Errors
///
/// Possible error codes:
/// - `WRONG_CREDENTIALS` - the credentials match no active [`User`].
#[tracing::instrument(skip_all, fields(api.name = "login"))]
pub async fn login(
    ctx: Context,
    input: Result<Json<Credentials>, JsonRejection>,
) -> Result<Json<SessionOutput>, Error> {
    use secrecy::ExposeSecret as _;

    let Json(Credentials { login, password }) =
        input.map_err(AsError::into_error)?;

    // Malformed credentials cannot match any `User`.
    let wrong = |_| Error::from(AuthError::WrongCredentials);
    let login = login.parse::<user::Login>().map_err(wrong)?;
    let password = password
        .expose_secret()
        .parse::<user::Password>()
        .map_err(wrong)?;

    let output = ctx
        .service()
        .execute(command::CreateUserSession {
            login,
            password: SecretBox::new(Box::new(password)),
        })
        .await
        .map_err(AsError::into_error)?;

    ctx.set_current_session(Session {
        user_id: output.user.id,
        role: output.user.role,
        token: output.token.clone(),
        expires_at: output.expires_at,
    })
    .await;

    Ok(Json(SessionOutput {
        token: output.token.to_string(),
        user: output.user.into(),
        expires_at: output.expires_at,
    }))
}

/// Returns the [`User`] of the current session.
///
/// # Errors
///
/// Possible error codes:
/// - `AUTHORIZATION_REQUIRED` - the request carries no valid session.
#[tracing::instrument(skip_all, fields(api.name = "me"))]
pub async fn me(ctx: Context) -> Result<Json<User>, Error> {
    let session = ctx.current_session().await?;

    ctx.service()
        .execute(query::user::ById::by(session.user_id))
        .await
        .map_err(AsError::into_error)?
        .map(|u| Json(u.into()))
        .ok_or_else(|| Error::internal(&"`User` of a valid session is gone"))
}

define_error! {
    enum AuthError {
        #[code = "LOGIN_OCCUPIED"]
        #[status = CONFLICT]
        #[message = "Login is occupied by another `User`"]
        LoginOccupied,

        #[code = "EMAIL_OCCUPIED"]
        #[status = CONFLICT]
        #[message = "Email is occupied by another `User`"]
        EmailOccupied,

        #[code = "WRONG_CREDENTIALS"]
        #[status = UNAUTHORIZED]
        #[message = "Provided credentials do not match any `User`"]
        WrongCredentials,
    }
}

impl AsError for command::create_user::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::LoginOccupied(_) => Some(AuthError::LoginOccupied.into()),
            Self::EmailOccupied(_) => Some(AuthError::EmailOccupied.into()),
            Self::PasswordHash(_) => None,
        }
    }
}

impl AsError for command::create_user_session::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::JsonWebTokenEncodeError(_) | Self::PasswordHash(_) => None,
            Self::WrongCredentials => Some(AuthError::WrongCredentials.into()),
        }
    }
}
