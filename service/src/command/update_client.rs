//! [`Command`] for updating a [`Client`].

use common::{
    operations::{By, Commit, Lock, Select, Transact, Transacted, Update},
    Money,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{client, Client},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for replacing the mutable data of a [`Client`].
///
/// [`client::Cpf`] and creation time are never changed.
#[derive(Clone, Debug)]
pub struct UpdateClient {
    /// ID of the [`Client`] to update.
    pub client_id: client::Id,

    /// New [`client::Name`].
    pub name: client::Name,

    /// New [`client::Contacts`].
    pub contacts: client::Contacts,

    /// New birth date.
    pub birth_date: Option<client::BirthDateTime>,

    /// New monthly income.
    pub monthly_income: Option<Money>,

    /// New [`client::Status`].
    pub status: client::Status,

    /// New [`client::Notes`].
    pub notes: Option<client::Notes>,
}

impl<Db> Command<UpdateClient> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Client, client::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Client>, client::Id>>,
            Ok = Option<Client>,
            Err = Traced<database::Error>,
        > + Database<Update<Client>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Client;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: UpdateClient) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let UpdateClient {
            client_id,
            name,
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

        tx.execute(Lock(By::<Client, _>::new(client_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let client = tx
            .execute(Select(By::<Option<Client>, _>::new(client_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::ClientNotExists(client_id))
            .map_err(tracerr::wrap!())?;

        let client = Client {
            name,
            contacts,
            birth_date,
            monthly_income,
            status,
            notes,
            ..client
        };

        tx.execute(Update(client.clone()))
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

/// Error of [`UpdateClient`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`Client`] with the provided ID does not exist.
    #[display("`Client(id: {_0})` does not exist")]
    #[from(ignore)]
    ClientNotExists(#[error(not(source))] client::Id),

    /// Monthly income is negative.
    #[display("Monthly income must not be negative")]
    NegativeIncome,
}

#[cfg(test)]
mod spec {
    use crate::{
        domain::client,
        spec::{new_client, service},
        Command as _,
    };

    use super::{ExecutionError, UpdateClient};

    fn update(client_id: client::Id) -> UpdateClient {
        UpdateClient {
            client_id,
            name: client::Name::new("Maria Souza Lima").unwrap(),
            contacts: client::Contacts {
                city: client::City::new("Campinas"),
                state: client::State::new("sp"),
                ..client::Contacts::default()
            },
            birth_date: None,
            monthly_income: None,
            status: client::Status::Inactive,
            notes: None,
        }
    }

    #[tokio::test]
    async fn replaces_mutable_fields() {
        let svc = service();
        let created = new_client(&svc, "52998224725").await;

        let updated = svc.execute(update(created.id)).await.unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.cpf, created.cpf);
        assert_eq!(updated.created_at, created.created_at);
        assert_eq!(updated.name.to_string(), "Maria Souza Lima");
        assert_eq!(updated.status, client::Status::Inactive);
        assert_eq!(updated.contacts.state.unwrap().to_string(), "SP");
        assert!(updated.monthly_income.is_none());
    }

    #[tokio::test]
    async fn fails_on_absent_client() {
        let svc = service();

        let err = svc.execute(update(client::Id::new())).await.unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::ClientNotExists(_)));
    }
}
