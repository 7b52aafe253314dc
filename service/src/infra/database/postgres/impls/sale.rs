//! [`Sale`]-related [`Database`] implementations.

use common::{
    operations::{By, Delete, Insert, Lock, Select, Update},
    Money,
};
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{sale, Sale},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
    read,
};

use super::money;

/// Columns of the `sales` table.
macro_rules! columns {
    () => {
        "id, client_id, apartment_id, currency, price, \
         payment_method, down_payment, \
         installments_count, installment_amount, first_due_at, \
         seller, commission, notes, \
         status, created_at, confirmed_at, cancelled_at, paid_off_at"
    };
}

/// Reads a [`Sale`] from the provided [`Row`].
fn from_row(row: &Row) -> Sale {
    let currency = row.get("currency");
    let installments = row
        .get::<_, Option<i32>>("installments_count")
        .map(|count| sale::Installments {
            count: u16::try_from(count).expect("`installments_count` overflow"),
            amount: Money {
                amount: row.get("installment_amount"),
                currency,
            },
            first_due_at: row.get("first_due_at"),
        });
    Sale {
        id: row.get("id"),
        client_id: row.get("client_id"),
        apartment_id: row.get("apartment_id"),
        price: Money {
            amount: row.get("price"),
            currency,
        },
        terms: sale::Terms {
            payment_method: row.get("payment_method"),
            down_payment: money(row.get("down_payment"), currency),
            installments,
        },
        seller: row.get("seller"),
        commission: money(row.get("commission"), currency),
        notes: row.get("notes"),
        status: row.get("status"),
        created_at: row.get("created_at"),
        confirmed_at: row.get("confirmed_at"),
        cancelled_at: row.get("cancelled_at"),
        paid_off_at: row.get("paid_off_at"),
    }
}

impl<C> Database<Select<By<Option<Sale>, sale::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Sale>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Sale>, sale::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        const SQL: &str = concat!(
            "SELECT ",
            columns!(),
            " FROM sales \
             WHERE id = $1::UUID"
        );
        self.query_opt(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(|row| row.as_ref().map(from_row))
    }
}

impl<C> Database<Select<By<Vec<Sale>, read::sale::list::Filter>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Sale>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Sale>, read::sale::list::Filter>>,
    ) -> Result<Self::Ok, Self::Err> {
        let read::sale::list::Filter {
            client_id,
            apartment_id,
            status,
        } = by.into_inner();

        const SQL: &str = concat!(
            "SELECT ",
            columns!(),
            " FROM sales \
             WHERE ($1::UUID IS NULL OR client_id = $1::UUID) \
               AND ($2::UUID IS NULL OR apartment_id = $2::UUID) \
               AND ($3::INT2 IS NULL OR status = $3::INT2) \
             ORDER BY created_at, id"
        );
        Ok(self
            .query(SQL, &[&client_id, &apartment_id, &status])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(from_row)
            .collect())
    }
}

impl<C> Database<Select<By<Vec<sale::Id>, read::sale::Stale>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<sale::Id>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<sale::Id>, read::sale::Stale>>,
    ) -> Result<Self::Ok, Self::Err> {
        let read::sale::Stale { created_before } = by.into_inner();

        const SQL: &str = "\
            SELECT id \
            FROM sales \
            WHERE status = $1::INT2 \
              AND created_at < $2::TIMESTAMPTZ \
            ORDER BY created_at, id";
        Ok(self
            .query(SQL, &[&sale::Status::Pending, &created_before])
            .await
            .map_err(tracerr::wrap!())?
            .into_iter()
            .map(|row| row.get("id"))
            .collect())
    }
}

impl<C> Database<Insert<Sale>> for Postgres<C>
where
    C: Connection,
    Self: Database<Update<Sale>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(sale): Insert<Sale>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(sale)).await.map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<Sale>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(sale): Update<Sale>,
    ) -> Result<Self::Ok, Self::Err> {
        let Sale {
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
        let down_payment = down_payment.map(|m| m.amount);
        let installments_count = installments.map(|i| i32::from(i.count));
        let installment_amount = installments.map(|i| i.amount.amount);
        let first_due_at = installments.and_then(|i| i.first_due_at);
        let commission = commission.map(|m| m.amount);

        const SQL: &str = concat!(
            "INSERT INTO sales (",
            columns!(),
            ") \
             VALUES (\
                 $1::UUID, $2::UUID, $3::UUID, $4::INT2, $5::NUMERIC, \
                 $6::VARCHAR, $7::NUMERIC, \
                 $8::INT4, $9::NUMERIC, $10::TIMESTAMPTZ, \
                 $11::VARCHAR, $12::NUMERIC, $13::TEXT, \
                 $14::INT2, $15::TIMESTAMPTZ, \
                 $16::TIMESTAMPTZ, $17::TIMESTAMPTZ, $18::TIMESTAMPTZ\
             ) \
             ON CONFLICT (id) DO UPDATE \
             SET currency = EXCLUDED.currency, \
                 price = EXCLUDED.price, \
                 payment_method = EXCLUDED.payment_method, \
                 down_payment = EXCLUDED.down_payment, \
                 installments_count = EXCLUDED.installments_count, \
                 installment_amount = EXCLUDED.installment_amount, \
                 first_due_at = EXCLUDED.first_due_at, \
                 seller = EXCLUDED.seller, \
                 commission = EXCLUDED.commission, \
                 notes = EXCLUDED.notes, \
                 status = EXCLUDED.status, \
                 confirmed_at = EXCLUDED.confirmed_at, \
                 cancelled_at = EXCLUDED.cancelled_at, \
                 paid_off_at = EXCLUDED.paid_off_at"
        );
        self.exec(
            SQL,
            &[
                &id,
                &client_id,
                &apartment_id,
                &price.currency,
                &price.amount,
                &payment_method,
                &down_payment,
                &installments_count,
                &installment_amount,
                &first_due_at,
                &seller,
                &commission,
                &notes,
                &status,
                &created_at,
                &confirmed_at,
                &cancelled_at,
                &paid_off_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Delete<By<Sale, sale::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Sale, sale::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        const SQL: &str = "\
            DELETE FROM sales \
            WHERE id = $1::UUID";
        self.exec(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Lock<By<Sale, sale::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Sale, sale::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        const SQL: &str = "\
            SELECT id \
            FROM sales \
            WHERE id = $1::UUID \
            FOR UPDATE";
        self.query(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}
