use tracing::debug;

use crate::{
    Client, Error, FailureTable, Operation, ResourceKind,
    account::{ACCOUNT, Account, CURRENT, CreateAccount, GetAccount, UpdateAccount},
    api::Remove,
};

const CREATE: FailureTable = FailureTable::new(
    Operation::CreateAccount,
    &[(400, "Unable to create account: invalid settings"), (409, "Unable to create account: login already exists")],
    "Unable to create account",
);

const UPDATE: FailureTable = FailureTable::new(
    Operation::UpdateAccount,
    &[(400, "Unable to update account: invalid settings")],
    "Unable to update account",
);

/// Reads and manages user accounts.
#[derive(Debug, Clone)]
pub struct AccountService {
    client: Client,
}

impl AccountService {
    /// A service using `client`.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// The account of the logged-in user.
    pub fn get_current(&self) -> Result<Account, Error> {
        self.get_by_uri(CURRENT)
    }

    /// The account with the given id.
    pub fn get_by_id(&self, id: &str) -> Result<Account, Error> {
        self.get_by_uri(&ACCOUNT.expand(&[id]))
    }

    /// The account at the given URI.
    pub fn get_by_uri(&self, uri: &str) -> Result<Account, Error> {
        self.client
            .send(GetAccount { uri })
            .map_err(|e| e.or_not_found(ResourceKind::Account, uri))
    }

    /// Create an account in an organization and return it as stored.
    pub fn create(&self, account: &Account, domain: &str) -> Result<Account, Error> {
        let created = self
            .client
            .send(CreateAccount { domain, account })
            .map_err(|e| CREATE.wrap(e))?;

        debug!(uri = %created.uri, "account created");
        self.get_by_uri(&created.uri)
    }

    /// Store changed settings of an account loaded from the server.
    pub fn update(&self, account: &Account) -> Result<(), Error> {
        let uri = account
            .uri()
            .ok_or(Error::MissingUri {
                kind: ResourceKind::Account,
            })?;

        self.client
            .send(UpdateAccount { uri, account })
            .map_err(|e| UPDATE.wrap(e.or_not_found(ResourceKind::Account, uri)))
    }

    /// Delete an account loaded from the server.
    pub fn remove(&self, account: &Account) -> Result<(), Error> {
        let uri = account
            .uri()
            .ok_or(Error::MissingUri {
                kind: ResourceKind::Account,
            })?;

        self.client
            .send(Remove { uri })
            .map_err(|e| e.or_not_found(ResourceKind::Account, uri))
    }
}


#[cfg(all(test, feature = "_integration-tests"))]
mod live {
    use crate::GoodData;

    #[test]
    fn current_account() -> anyhow::Result<()> {
        let gd = GoodData::from_default_env()?;
        let account = gd.accounts().get_current()?;

        assert!(account.login.is_some());
        assert_eq!(gd.accounts().get_by_uri(account.uri().unwrap_or_default())?, account);

        Ok(())
    }
}
