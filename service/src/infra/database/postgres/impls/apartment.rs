//! [`Apartment`]-related [`Database`] implementations.

use common::operations::{By, Delete, Insert, Lock, Select, Update};
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{apartment, Apartment},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
    read,
};

use super::money;

/// Columns of the `apartments` table.
macro_rules! columns {
    () => {
        "id, number, block, floor, development, \
         total_area, private_area, \
         bedrooms, suites, bathrooms, parking_spots, balcony, \
         price, currency, condo_fee, \
         description, delivery_at, status, created_at"
    };
}

/// Reads a room count stored as `INT2`.
///
/// The `apartments` table constrains counts to fit into [`u8`].
fn count(row: &Row, column: &str) -> u8 {
    u8::try_from(row.get::<_, i16>(column)).expect("count overflow")
}

/// Reads an [`Apartment`] from the provided [`Row`].
fn from_row(row: &Row) -> Apartment {
    let currency = row.get("currency");
    Apartment {
        id: row.get("id"),
        number: row.get("number"),
        block: row.get("block"),
        floor: row.get("floor"),
        development: row.get("development"),
        layout: apartment::Layout {
            total_area: row.get("total_area"),
            private_area: row.get("private_area"),
            bedrooms: count(row, "bedrooms"),
            suites: count(row, "suites"),
            bathrooms: count(row, "bathrooms"),
            parking_spots: count(row, "parking_spots"),
            balcony: row.get("balcony"),
        },
        price: common::Money {
            amount: row.get("price"),
            currency,
        },
        condo_fee: money(row.get("condo_fee"), currency),
        description: row.get("description"),
        delivery_at: row.get("delivery_at"),
        status: row.get("status"),
        created_at: row.get("created_at"),
    }
}

impl<C> Database<Select<By<Option<Apartment>, apartment::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Apartment>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Apartment>, apartment::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        const SQL: &str = concat!(
            "SELECT ",
            columns!(),
            " FROM apartments \
             WHERE id = $1::UUID"
        );
        self.query_opt(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(|row| row.as_ref().map(from_row))
    }
}

impl<C> Database<Select<By<Vec<Apartment>, read::apartment::list::Filter>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Apartment>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Apartment>, read::apartment::list::Filter>>,
    ) -> Result<Self::Ok, Self::Err> {
        let read::apartment::list::Filter { status } = by.into_inner();

        const SQL: &str = concat!(
            "SELECT ",
            columns!(),
            " FROM apartments \
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

impl<C> Database<Select<By<read::apartment::HasSales, apartment::Id>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = read::apartment::HasSales;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<read::apartment::HasSales, apartment::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        const SQL: &str = "\
            SELECT EXISTS (\
                SELECT 1 FROM sales WHERE apartment_id = $1::UUID\
            )";
        self.query_opt(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(|row| {
                read::apartment::HasSales(row.is_some_and(|r| r.get(0)))
            })
    }
}

impl<C> Database<Insert<Apartment>> for Postgres<C>
where
    C: Connection,
    Self: Database<Update<Apartment>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(apartment): Insert<Apartment>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(apartment)).await.map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<Apartment>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(apartment): Update<Apartment>,
    ) -> Result<Self::Ok, Self::Err> {
        let Apartment {
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
        let [bedrooms, suites, bathrooms, parking_spots] =
            [bedrooms, suites, bathrooms, parking_spots].map(i16::from);
        let condo_fee = condo_fee.map(|m| m.amount);

        const SQL: &str = concat!(
            "INSERT INTO apartments (",
            columns!(),
            ") \
             VALUES (\
                 $1::UUID, $2::VARCHAR, $3::VARCHAR, $4::INT2, $5::VARCHAR, \
                 $6::NUMERIC, $7::NUMERIC, \
                 $8::INT2, $9::INT2, $10::INT2, $11::INT2, $12::BOOLEAN, \
                 $13::NUMERIC, $14::INT2, $15::NUMERIC, \
                 $16::TEXT, $17::TIMESTAMPTZ, $18::INT2, $19::TIMESTAMPTZ\
             ) \
             ON CONFLICT (id) DO UPDATE \
             SET number = EXCLUDED.number, \
                 block = EXCLUDED.block, \
                 floor = EXCLUDED.floor, \
                 development = EXCLUDED.development, \
                 total_area = EXCLUDED.total_area, \
                 private_area = EXCLUDED.private_area, \
                 bedrooms = EXCLUDED.bedrooms, \
                 suites = EXCLUDED.suites, \
                 bathrooms = EXCLUDED.bathrooms, \
                 parking_spots = EXCLUDED.parking_spots, \
                 balcony = EXCLUDED.balcony, \
                 price = EXCLUDED.price, \
                 currency = EXCLUDED.currency, \
                 condo_fee = EXCLUDED.condo_fee, \
                 description = EXCLUDED.description, \
                 delivery_at = EXCLUDED.delivery_at, \
                 status = EXCLUDED.status"
        );
        self.exec(
            SQL,
            &[
                &id,
                &number,
                &block,
                &floor,
                &development,
                &total_area,
                &private_area,
                &bedrooms,
                &suites,
                &bathrooms,
                &parking_spots,
                &balcony,
                &price.amount,
                &price.currency,
                &condo_fee,
                &description,
                &delivery_at,
                &status,
                &created_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Delete<By<Apartment, apartment::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Apartment, apartment::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        const SQL: &str = "\
            DELETE FROM apartments \
            WHERE id = $1::UUID";
        self.exec(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Lock<By<Apartment, apartment::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Apartment, apartment::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        const SQL: &str = "\
            SELECT id \
            FROM apartments \
            WHERE id = $1::UUID \
            FOR UPDATE";
        self.query(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}
