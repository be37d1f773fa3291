//! API operations concerning user accounts.

use serde::{Deserialize, Serialize};

use crate::api::{ApiRequest, DataResponse, UriResponse, UriTemplate, wrapped};

/// A single account profile.
pub const ACCOUNT: UriTemplate = UriTemplate::new("/gdc/account/profile/{id}");
/// The profile of the logged-in user.
pub const CURRENT: &str = "/gdc/account/profile/current";
/// The users of an organization (domain).
pub const DOMAIN_USERS: UriTemplate = UriTemplate::new("/gdc/account/domains/{domain}/users");

/// A user account, `{"accountSetting": {...}}`.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// The login, usually an email address. Only sent on creation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub login: Option<String>,
    /// The contact email.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// The password. Never returned by the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// The password again. Never returned by the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verify_password: Option<String>,
    /// Given name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    /// Family name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    /// The single-sign-on provider the account logs in through.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sso_provider: Option<String>,
    /// Phone number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    /// Company name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    /// Country.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    /// Preferred language, e.g. `en-US`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Allowed IP ranges.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ip_whitelist: Vec<String>,
    /// Allowed authentication modes, e.g. `SSO`, `PASSWORD`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authentication_modes: Vec<String>,
    /// Server-assigned links. Not sent back on update.
    #[serde(default, skip_serializing)]
    pub links: Option<AccountLinks>,
}

/// Links of an [Account].
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountLinks {
    /// The account itself.
    #[serde(rename = "self")]
    pub self_link: String,
    /// The account's projects.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub projects: Option<String>,
}

wrapped!(Account => "accountSetting");
impl DataResponse for Account {}

impl Account {
    /// The URI of the account, if it came from the server.
    pub fn uri(&self) -> Option<&str> {
        self.links.as_ref().map(|l| l.self_link.as_str())
    }

    /// The account id, parsed out of its URI.
    pub fn id(&self) -> Option<String> {
        let mut values = ACCOUNT.match_uri(self.uri()?)?;
        values.pop()
    }
}

/// Load an account by URI.
#[derive(Debug, Clone)]
pub struct GetAccount<'a> {
    /// The account URI, e.g. `/gdc/account/profile/{id}`.
    pub uri: &'a str,
}

impl ApiRequest for GetAccount<'_> {
    type Response = Account;

    fn path(&self) -> String {
        self.uri.to_owned()
    }
}

/// Create an account in an organization.
#[derive(Debug, Clone)]
pub struct CreateAccount<'a> {
    /// The organization (domain) to create the account in.
    pub domain: &'a str,
    /// The account, including login and password.
    pub account: &'a Account,
}

impl ApiRequest for CreateAccount<'_> {
    type Response = UriResponse;

    fn method(&self) -> http::Method {
        http::Method::POST
    }

    fn path(&self) -> String {
        DOMAIN_USERS.expand(&[self.domain])
    }

    fn body(&self) -> Option<impl Serialize> {
        Some(crate::api::Envelope(self.account))
    }
}

/// Replace the settings of an existing account.
#[derive(Debug, Clone)]
pub struct UpdateAccount<'a> {
    /// The account URI.
    pub uri: &'a str,
    /// The new settings.
    pub account: &'a Account,
}

impl ApiRequest for UpdateAccount<'_> {
    type Response = ();

    fn method(&self) -> http::Method {
        http::Method::PUT
    }

    fn path(&self) -> String {
        self.uri.to_owned()
    }

    fn body(&self) -> Option<impl Serialize> {
        Some(crate::api::Envelope(self.account))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::api::{decode, encode};

    #[test]
    fn decode_fixture() -> anyhow::Result<()> {
        let body = include_bytes!("../../tests/fixtures/account.json");
        let account: Account = decode(&body[..])?;

        assert_eq!(account.login.as_deref(), Some("john.doe@example.com"));
        assert_eq!(account.first_name.as_deref(), Some("John"));
        assert_eq!(account.uri(), Some("/gdc/account/profile/876ec68f5630b38de65852ed5d6236ff"));
        assert_eq!(account.id().as_deref(), Some("876ec68f5630b38de65852ed5d6236ff"));
        assert_eq!(account.authentication_modes, vec!["SSO".to_owned()]);

        Ok(())
    }

    #[test]
    fn encode_omits_absent_fields() -> anyhow::Result<()> {
        let account = Account {
            login: Some("a@example.com".into()),
            password: Some("pw".into()),
            verify_password: Some("pw".into()),
            first_name: Some("A".into()),
            links: Some(AccountLinks {
                self_link: "/gdc/account/profile/1".into(),
                projects: None,
            }),
            ..Default::default()
        };

        let value: serde_json::Value = serde_json::from_slice(&encode(&account)?)?;
        assert_eq!(
            value,
            serde_json::json!({"accountSetting": {
                "login": "a@example.com",
                "password": "pw",
                "verifyPassword": "pw",
                "firstName": "A"
            }})
        );

        Ok(())
    }

    #[test]
    fn create_targets_domain() -> anyhow::Result<()> {
        let account = Account::default();
        let req = CreateAccount {
            domain: "my domain",
            account: &account,
        }
        .into_request(&crate::Profile::new("https://secure.example.com")?)?;

        assert_eq!(req.method(), http::Method::POST);
        assert_eq!(req.uri().path(), "/gdc/account/domains/my%20domain/users");

        Ok(())
    }
}
