//! [`Client`]-related [`Database`] implementations.

use common::operations::{By, Delete, Insert, Lock, Select, Update};
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{client, Client},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
    read,
};

use super::money;

/// Columns of the `clients` table, in the order [`from_row()`] reads them.
macro_rules! columns {
    () => {
        "id, name, cpf, \
         email, phone, address, city, state, zip_code, \
         birth_date, monthly_income, monthly_income_currency, \
         status, notes, created_at"
    };
}

/// Reads a [`Client`] from the provided [`Row`].
fn from_row(row: &Row) -> Client {
    Client {
        id: row.get("id"),
        name: row.get("name"),
        cpf: row.get("cpf"),
        contacts: client::Contacts {
            email: row.get("email"),
            phone: row.get("phone"),
            address: row.get("address"),
            city: row.get("city"),
            state: row.get("state"),
            zip_code: row.get("zip_code"),
        },
        birth_date: row.get("birth_date"),
        monthly_income: row
            .get::<_, Option<_>>("monthly_income_currency")
            .and_then(|c| money(row.get("monthly_income"), c)),
        status: row.get("status"),
        notes: row.get("notes"),
        created_at: row.get("created_at"),
    }
}

impl<C> Database<Select<By<Option<Client>, client::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Client>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Client>, client::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        const SQL: &str = concat!(
            "SELECT ",
            columns!(),
            " FROM clients \
             WHERE id = $1::UUID"
        );
        self.query_opt(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(|row| row.as_ref().map(from_row))
    }
}

impl<'l, C> Database<Select<By<Option<Client>, &'l client::Cpf>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Client>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Client>, &'l client::Cpf>>,
    ) -> Result<Self::Ok, Self::Err> {
        let cpf = by.into_inner();

        const SQL: &str = concat!(
            "SELECT ",
            columns!(),
            " FROM clients \
             WHERE cpf = $1::VARCHAR"
        );
        self.query_opt(SQL, &[cpf])
            .await
            .map_err(tracerr::wrap!())
            .map(|row| row.as_ref().map(from_row))
    }
}

impl<C> Database<Select<By<Vec<Client>, read::client::list::Filter>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Client>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Client>, read::client::list::Filter>>,
    ) -> Result<Self::Ok, Self::Err> {
        let read::client::list::Filter { status } = by.into_inner();

        const SQL: &str = concat!(
            "SELECT ",
            columns!(),
            " FROM clients \
             WHERE ($1::INT2 IS NULL OR status = $1::INT2) \
             ORDER BY created_at, id"
        );
        Ok(self
            .query(SQL, &[&status])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(from_row)
            .collect())
    }
}

impl<C> Database<Select<By<read::client::HasSales, client::Id>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = read::client::HasSales;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<read::client::HasSales, client::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        const SQL: &str = "\
            SELECT EXISTS (\
                SELECT 1 FROM sales WHERE client_id = $1::UUID\
            )";
        self.query_opt(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(|row| read::client::HasSales(row.is_some_and(|r| r.get(0))))
    }
}

impl<C> Database<Insert<Client>> for Postgres<C>
where
    C: Connection,
    Self: Database<Update<Client>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(client): Insert<Client>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(client)).await.map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<Client>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(client): Update<Client>,
    ) -> Result<Self::Ok, Self::Err> {
        let Client {
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
        let income_amount = monthly_income.map(|m| m.amount);
        let income_currency = monthly_income.map(|m| m.currency);

        const SQL: &str = concat!(
            "INSERT INTO clients (",
            columns!(),
            ") \
             VALUES (\
                 $1::UUID, $2::VARCHAR, $3::VARCHAR, \
                 $4::VARCHAR, $5::VARCHAR, $6::VARCHAR, \
                 $7::VARCHAR, $8::VARCHAR, $9::VARCHAR, \
                 $10::TIMESTAMPTZ, $11::NUMERIC, $12::INT2, \
                 $13::INT2, $14::TEXT, $15::TIMESTAMPTZ\
             ) \
             ON CONFLICT (id) DO UPDATE \
             SET name = EXCLUDED.name, \
                 cpf = EXCLUDED.cpf, \
                 email = EXCLUDED.email, \
                 phone = EXCLUDED.phone, \
                 address = EXCLUDED.address, \
                 city = EXCLUDED.city, \
                 state = EXCLUDED.state, \
                 zip_code = EXCLUDED.zip_code, \
                 birth_date = EXCLUDED.birth_date, \
                 monthly_income = EXCLUDED.monthly_income, \
                 monthly_income_currency = EXCLUDED.monthly_income_currency, \
                 status = EXCLUDED.status, \
                 notes = EXCLUDED.notes"
        );
        self.exec(
            SQL,
            &[
                &id,
                &name,
                &cpf,
                &email,
                &phone,
                &address,
                &city,
                &state,
                &zip_code,
                &birth_date,
                &income_amount,
                &income_currency,
                &status,
                &notes,
                &created_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Delete<By<Client, client::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Client, client::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        const SQL: &str = "\
            DELETE FROM clients \
            WHERE id = $1::UUID";
        self.exec(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Lock<By<Client, client::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Client, client::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        const SQL: &str = "\
            SELECT id \
            FROM clients \
            WHERE id = $1::UUID \
            FOR UPDATE";
        self.query(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<'l, C> Database<Lock<By<Client, &'l client::Cpf>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Client, &'l client::Cpf>>,
    ) -> Result<Self::Ok, Self::Err> {
        let cpf = by.into_inner();

        // Held until the end of the transaction, so the CPF stays free
        // between its check and the insertion.
        const SQL: &str = "\
            SELECT pg_advisory_xact_lock(hashtext('clients:' || $1::VARCHAR))";
        self.query(SQL, &[cpf])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}
