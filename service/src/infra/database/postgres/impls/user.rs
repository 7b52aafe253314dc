//! [`User`]-related [`Database`] implementations.

use common::operations::{By, Insert, Lock, Select, Update};
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{user, User},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

/// Columns of the `users` table.
macro_rules! columns {
    () => {
        "id, login, email, password_hash, role, is_active, created_at"
    };
}

fn from_row(row: &Row) -> User {
    User {
        id: row.get("id"),
        login: row.get("login"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        role: row.get("role"),
        is_active: row.get("is_active"),
        created_at: row.get("created_at"),
    }
}

impl<C> Database<Select<By<Option<User>, user::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<User>, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        const SQL: &str = concat!(
            "SELECT ",
            columns!(),
            " FROM users \
             WHERE id = $1::UUID"
        );
        self.query_opt(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(|row| row.as_ref().map(from_row))
    }
}

impl<'l, C> Database<Select<By<Option<User>, &'l user::Login>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<User>, &'l user::Login>>,
    ) -> Result<Self::Ok, Self::Err> {
        let login = by.into_inner();

        const SQL: &str = concat!(
            "SELECT ",
            columns!(),
            " FROM users \
             WHERE login = $1::VARCHAR"
        );
        self.query_opt(SQL, &[&login])
            .await
            .map_err(tracerr::wrap!())
            .map(|row| row.as_ref().map(from_row))
    }
}

impl<'l, C> Database<Select<By<Option<User>, &'l user::Email>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<User>, &'l user::Email>>,
    ) -> Result<Self::Ok, Self::Err> {
        let email = by.into_inner();

        const SQL: &str = concat!(
            "SELECT ",
            columns!(),
            " FROM users \
             WHERE email = $1::VARCHAR"
        );
        self.query_opt(SQL, &[&email])
            .await
            .map_err(tracerr::wrap!())
            .map(|row| row.as_ref().map(from_row))
    }
}

impl<C> Database<Insert<User>> for Postgres<C>
where
    C: Connection,
    Self: Database<Update<User>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(user): Insert<User>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(user)).await.map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<User>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(user): Update<User>,
    ) -> Result<Self::Ok, Self::Err> {
        let User {
            id,
            login,
            email,
            password_hash,
            role,
            is_active,
            created_at,
        } = user;

        const SQL: &str = concat!(
            "INSERT INTO users (",
            columns!(),
            ") \
             VALUES (\
                 $1::UUID, $2::VARCHAR, $3::VARCHAR, $4::VARCHAR, \
                 $5::INT2, $6::BOOLEAN, $7::TIMESTAMPTZ\
             ) \
             ON CONFLICT (id) DO UPDATE \
             SET login = EXCLUDED.login, \
                 email = EXCLUDED.email, \
                 password_hash = EXCLUDED.password_hash, \
                 role = EXCLUDED.role, \
                 is_active = EXCLUDED.is_active"
        );
        self.exec(
            SQL,
            &[
                &id,
                &login,
                &email,
                &password_hash,
                &role,
                &is_active,
                &created_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<'l, C> Database<Lock<By<User, &'l user::Login>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<User, &'l user::Login>>,
    ) -> Result<Self::Ok, Self::Err> {
        let login = by.into_inner();

        const SQL: &str = "\
            SELECT pg_advisory_xact_lock(hashtext('users:' || $1::VARCHAR))";
        self.query(SQL, &[&login])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}
