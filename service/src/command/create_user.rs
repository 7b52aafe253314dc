//! [`Command`] for creating a new [`User`].

use common::{
    operations::{By, Commit, Insert, Lock, Select, Transact, Transacted},
    DateTime,
};
use derive_more::{Display, Error, From};
use secrecy::{ExposeSecret, SecretBox};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::user::{Email, Login, Password};
use crate::{
    domain::{user, User},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for creating a new [`User`].
#[derive(Clone, Debug)]
pub struct CreateUser {
    /// [`Login`] of a new [`User`].
    pub login: user::Login,

    /// [`Email`] of a new [`User`].
    pub email: user::Email,

    /// [`Password`] of a new [`User`].
    pub password: SecretBox<user::Password>,

    /// [`user::Role`] of a new [`User`].
    pub role: user::Role,
}

impl<Db> Command<CreateUser> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: for<'l> Database<
            Lock<By<User, &'l user::Login>>,
            Err = Traced<database::Error>,
        > + for<'l> Database<
            Select<By<Option<User>, &'l user::Login>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + for<'l> Database<
            Select<By<Option<User>, &'l user::Email>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<Insert<User>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = User;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: CreateUser) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateUser {
            login,
            email,
            password,
            role,
        } = cmd;

        let password_hash = user::PasswordHash::new(password.expose_secret())
            .map_err(tracerr::from_and_wrap!(=> E))?;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Lock(By::<User, _>::new(&login)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let by_login = tx
            .execute(Select(By::<Option<User>, _>::new(&login)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if by_login.is_some() {
            return Err(tracerr::new!(E::LoginOccupied(login)));
        }
        let by_email = tx
            .execute(Select(By::<Option<User>, _>::new(&email)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if by_email.is_some() {
            return Err(tracerr::new!(E::EmailOccupied(email)));
        }

        let user = User {
            id: user::Id::new(),
            login,
            email,
            password_hash,
            role,
            is_active: true,
            created_at: DateTime::now().coerce(),
        };

        tx.execute(Insert(user.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(user)
    }
}

/// Error of [`CreateUser`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`user::Login`] is already occupied.
    #[display("`{_0}` login is occupied")]
    #[from(ignore)]
    LoginOccupied(#[error(not(source))] user::Login),

    /// [`user::Email`] is already occupied.
    #[display("`{_0}` email is occupied")]
    #[from(ignore)]
    EmailOccupied(#[error(not(source))] user::Email),

    /// [`user::Password`] hashing error.
    #[display("Failed to hash password: {_0}")]
    PasswordHash(argon2::password_hash::Error),
}

#[cfg(test)]
mod spec {
    use crate::{
        domain::user,
        spec::{create_user, service, PASSWORD},
        Command as _,
    };

    use super::ExecutionError;

    #[tokio::test]
    async fn creates_user() {
        let svc = service();

        let u = svc
            .execute(create_user("ana", "ana@example.com"))
            .await
            .unwrap();

        assert!(u.is_active);
        assert_eq!(u.role, user::Role::User);
        assert!(u
            .password_hash
            .verify(&user::Password::new(PASSWORD).unwrap())
            .unwrap());
    }

    #[tokio::test]
    async fn rejects_occupied_login_and_email() {
        let svc = service();
        drop(
            svc.execute(create_user("ana", "ana@example.com"))
                .await
                .unwrap(),
        );

        let err = svc
            .execute(create_user("ana", "other@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::LoginOccupied(_)));

        let err = svc
            .execute(create_user("bia", "ANA@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::EmailOccupied(_)));
    }
}
