//! [`Command`] for creating a new [`Client`].

use common::{
    operations::{By, Commit, Insert, Lock, Select, Transact, Transacted},
    DateTime, Money,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{client, Client},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for creating a new [`Client`].
#[derive(Clone, Debug)]
pub struct CreateClient {
    /// [`client::Name`] of a new [`Client`].
    pub name: client::Name,

    /// [`client::Cpf`] of a new [`Client`].
    pub cpf: client::Cpf,

    /// [`client::Contacts`] of a new [`Client`].
    pub contacts: client::Contacts,

    /// Birth date of a new [`Client`].
    pub birth_date: Option<client::BirthDateTime>,

    /// Monthly income of a new [`Client`].
    pub monthly_income: Option<Money>,

    /// [`client::Status`] of a new [`Client`].
    pub status: client::Status,

    /// [`client::Notes`] about a new [`Client`].
    pub notes: Option<client::Notes>,
}

impl<Db> Command<CreateClient> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: for<'l> Database<
            Lock<By<Client, &'l client::Cpf>>,
            Err = Traced<database::Error>,
        > + for<'l> Database<
            Select<By<Option<Client>, &'l client::Cpf>>,
            Ok = Option<Client>,
            Err = Traced<database::Error>,
        > + Database<Insert<Client>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Client;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: CreateClient) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateClient {
            name,
            cpf,
            contacts,
            birth_date,
            monthly_income,
            status,
            notes,
        } = cmd;

        if monthly_income.is_some_and(|m| m.is_negative()) {
            return Err(tracerr::new!(E::NegativeIncome));
        }

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Keep the `client::Cpf` free until the insertion is committed.
        tx.execute(Lock(By::new(&cpf)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let existing = tx
            .execute(Select(By::<Option<Client>, _>::new(&cpf)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if existing.is_some() {
            return Err(tracerr::new!(E::CpfOccupied(cpf)));
        }

        let client = Client {
            id: client::Id::new(),
            name,
            cpf,
            contacts,
            birth_date,
            monthly_income,
            status,
            notes,
            created_at: DateTime::now().coerce(),
        };

        tx.execute(Insert(client.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(client)
    }
}

/// Error of [`CreateClient`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`client::Cpf`] is already registered.
    #[display("`Client` with `{}` CPF already exists", _0.formatted())]
    #[from(ignore)]
    CpfOccupied(#[error(not(source))] client::Cpf),

    /// Monthly income is negative.
    #[display("Monthly income must not be negative")]
    NegativeIncome,
}
