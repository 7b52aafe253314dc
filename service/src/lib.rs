//! Service contains the business logic of the application.
//!
//! List of available Cargo features:
#![doc = document_features::document_features!()]
#![deny(
    nonstandard_style,
    rust_2018_idioms,
    rustdoc::all,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code
)]
#![forbid(non_ascii_idents)]
#![warn(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    clippy::pedantic,
    clippy::wildcard_enum_match_arm,
    deprecated_in_future,
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    unreachable_pub,
    unused_crate_dependencies,
    unused_import_braces,
    unused_labels,
    unused_lifetimes,
    unused_qualifications,
    unused_results
)]

pub mod command;
pub mod domain;
pub mod infra;
pub mod query;
pub mod read;
pub mod task;

use std::error::Error;

use common::operations::{By, Start};
use derive_more::Debug;

#[cfg(doc)]
use infra::Database;

pub use self::{command::Command, query::Query, task::Task};

/// [`Service`] configuration.
#[derive(Clone, Debug)]
pub struct Config {
    /// [JWT] encoding key.
    ///
    /// [JWT]: https://datatracker.ietf.org/doc/html/rfc7519
    #[debug(skip)]
    pub jwt_encoding_key: jsonwebtoken::EncodingKey,

    /// [JWT] decoding key.
    ///
    /// [JWT]: https://datatracker.ietf.org/doc/html/rfc7519
    #[debug(skip)]
    pub jwt_decoding_key: jsonwebtoken::DecodingKey,

    /// [`task::CancelStaleSales`] configuration.
    pub cancel_stale_sales: task::cancel_stale_sales::Config,
}

/// Domain service.
#[derive(Clone, Debug)]
pub struct Service<Db> {
    /// Configuration of this [`Service`].
    config: Config,

    /// [`Database`] of this [`Service`].
    database: Db,
}

impl<Db> Service<Db> {
    /// Creates a new [`Service`] with the provided parameters.
    pub fn new(config: Config, database: Db) -> (Self, task::Background)
    where
        Self: Task<
                Start<
                    By<
                        task::CancelStaleSales<Self>,
                        task::cancel_stale_sales::Config,
                    >,
                >,
                Ok = (),
                Err: Error,
            > + Clone
            + 'static,
    {
        let this = Service { config, database };

        let mut bg = task::Background::default();
        let svc = this.clone();
        bg.spawn("CancelStaleSales", async move {
            svc.execute(Start(By::new(svc.config().cancel_stale_sales)))
                .await
        });

        (this, bg)
    }

    /// Returns [`Config`] of this [`Service`].
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns [`Database`] of this [`Service`].
    #[must_use]
    pub fn database(&self) -> &Db {
        &self.database
    }
}

#[cfg(test)]
pub(crate) mod spec {
    //! Fixtures shared by [`Command`] and [`Task`] tests.

    use std::{str::FromStr as _, time::Duration};

    use common::{
        operations::{By, Select},
        DateTime, Money,
    };
    use rust_decimal::Decimal;
    use secrecy::SecretBox;

    use crate::{
        command::{CreateApartment, CreateClient, CreateSale, CreateUser},
        domain::{apartment, client, sale, user, Apartment, Client, Sale},
        infra::{Database as _, Memory},
        task, Command as _, Config, Service,
    };

    /// Secret signing [JWT]s in tests.
    ///
    /// [JWT]: https://datatracker.ietf.org/doc/html/rfc7519
    const JWT_SECRET: &[u8] = b"test-secret";

    /// Creates a new [`Service`] over an empty [`Memory`] database.
    pub(crate) fn service() -> Service<Memory> {
        Service {
            config: Config {
                jwt_encoding_key: jsonwebtoken::EncodingKey::from_secret(
                    JWT_SECRET,
                ),
                jwt_decoding_key: jsonwebtoken::DecodingKey::from_secret(
                    JWT_SECRET,
                ),
                cancel_stale_sales: task::cancel_stale_sales::Config {
                    interval: Duration::from_secs(60 * 60),
                    timeout: Duration::from_secs(30 * 24 * 60 * 60),
                },
            },
            database: Memory::new(),
        }
    }

    /// Parses the provided [`Money`] literal.
    pub(crate) fn money(s: &str) -> Money {
        Money::from_str(s).unwrap()
    }

    /// Password of [`User`]s created by [`create_user()`].
    ///
    /// [`User`]: crate::domain::User
    pub(crate) const PASSWORD: &str = "correct-horse";

    /// Builds a [`CreateUser`] command with the provided credentials.
    pub(crate) fn create_user(login: &str, email: &str) -> CreateUser {
        CreateUser {
            login: user::Login::new(login).unwrap(),
            email: user::Email::new(email).unwrap(),
            password: SecretBox::new(Box::new(
                user::Password::new(PASSWORD).unwrap(),
            )),
            role: user::Role::default(),
        }
    }

    /// Builds a [`CreateClient`] command with the provided CPF.
    pub(crate) fn create_client(cpf: &str) -> CreateClient {
        CreateClient {
            name: client::Name::new("Maria Souza").unwrap(),
            cpf: client::Cpf::new(cpf).unwrap(),
            contacts: client::Contacts::default(),
            birth_date: None,
            monthly_income: Some(money("12000BRL")),
            status: client::Status::Active,
            notes: None,
        }
    }

    /// Builds a [`CreateApartment`] command with the provided price.
    pub(crate) fn create_apartment(price: &str) -> CreateApartment {
        CreateApartment {
            number: apartment::Number::new("101").unwrap(),
            block: Some(apartment::Block::new("A").unwrap()),
            floor: Some(1),
            development: None,
            layout: apartment::Layout {
                total_area: apartment::Area::new(Decimal::from(70)).unwrap(),
                private_area: None,
                bedrooms: 2,
                suites: 1,
                bathrooms: 2,
                parking_spots: 1,
                balcony: true,
            },
            price: money(price),
            condo_fee: None,
            description: None,
            delivery_at: None,
        }
    }

    /// Builds a [`CreateSale`] command with default terms.
    pub(crate) fn create_sale(
        client_id: client::Id,
        apartment_id: apartment::Id,
    ) -> CreateSale {
        CreateSale {
            client_id,
            apartment_id,
            price: None,
            terms: sale::Terms::default(),
            seller: None,
            commission: None,
            notes: None,
        }
    }

    /// Creates a new [`Client`] with the provided CPF.
    pub(crate) async fn new_client(svc: &Service<Memory>, cpf: &str) -> Client {
        svc.execute(create_client(cpf)).await.unwrap()
    }

    /// Creates a new available [`Apartment`] priced `250000BRL`.
    pub(crate) async fn new_apartment(svc: &Service<Memory>) -> Apartment {
        svc.execute(create_apartment("250000BRL")).await.unwrap()
    }

    /// Creates a new [`Client`], [`Apartment`] and a pending [`Sale`] of it.
    pub(crate) async fn new_sale(svc: &Service<Memory>) -> Sale {
        let c = new_client(svc, "52998224725").await;
        let a = new_apartment(svc).await;
        svc.execute(create_sale(c.id, a.id)).await.unwrap()
    }

    /// Returns the current [`apartment::Status`] of an [`Apartment`].
    pub(crate) async fn apartment_status(
        svc: &Service<Memory>,
        id: apartment::Id,
    ) -> apartment::Status {
        svc.database()
            .execute(Select(By::<Option<Apartment>, _>::new(id)))
            .await
            .unwrap()
            .unwrap()
            .status
    }

    /// Returns the current [`Sale`] with the provided ID, if any.
    pub(crate) async fn stored_sale(
        svc: &Service<Memory>,
        id: sale::Id,
    ) -> Option<Sale> {
        svc.database()
            .execute(Select(By::<Option<Sale>, _>::new(id)))
            .await
            .unwrap()
    }

    /// Returns a [`sale::CreationDateTime`] the provided [`Duration`] ago.
    pub(crate) fn ago(d: Duration) -> sale::CreationDateTime {
        (DateTime::now() - d).coerce()
    }
}
