//! API operations concerning hierarchical configuration: settings resolved
//! from the platform, the domain and the project, most specific first.

use serde::{Deserialize, Serialize};

use crate::api::{ApiRequest, DataResponse, Envelope, PageItem, UriTemplate, wrapped};

/// All settings of a project.
pub const PROJECT_CONFIG: UriTemplate = UriTemplate::new("/gdc/projects/{projectId}/config");
/// A single setting of a project.
pub const PROJECT_CONFIG_ITEM: UriTemplate =
    UriTemplate::new("/gdc/projects/{projectId}/config/{key}");

/// Where the effective value of a setting comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SourceType {
    /// The platform default.
    Catalog,
    /// The organization.
    Domain,
    /// The project itself.
    Project,
    /// A source this client does not know about.
    #[serde(other)]
    Unknown,
}

/// A setting, `{"settingItem": {"key": "...", "value": "...", "source": "..."}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigItem {
    /// The setting name.
    pub key: String,
    /// The value, always a string on the wire.
    pub value: String,
    /// Where the value comes from. Not sent back on update.
    #[serde(default, skip_serializing)]
    pub source: Option<SourceType>,
    /// Server-assigned links.
    #[serde(default, skip_serializing)]
    pub links: Option<ConfigItemLinks>,
}

/// Links of a [ConfigItem].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigItemLinks {
    /// The item itself.
    #[serde(rename = "self")]
    pub self_link: String,
}

wrapped!(ConfigItem => "settingItem");
impl DataResponse for ConfigItem {}

impl PageItem for ConfigItem {
    const PAGE_ROOT: &'static str = "settings";
}

impl ConfigItem {
    /// A setting to be stored on a project.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            source: None,
            links: None,
        }
    }

    /// The value read as a flag. Returns `None` if it is not one of
    /// `true`, `false`, `1` or `0`.
    pub fn as_bool(&self) -> Option<bool> {
        match self.value.as_str() {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        }
    }

    /// Whether the value is set on the project itself rather than
    /// inherited.
    pub fn is_project_value(&self) -> bool {
        self.source == Some(SourceType::Project)
    }
}

/// Load one setting of a project.
#[derive(Debug, Clone)]
pub struct GetConfigItem<'a> {
    /// The project.
    pub project_id: &'a str,
    /// The setting name.
    pub key: &'a str,
}

impl ApiRequest for GetConfigItem<'_> {
    type Response = ConfigItem;

    fn path(&self) -> String {
        PROJECT_CONFIG_ITEM.expand(&[self.project_id, self.key])
    }
}

/// Store a setting on a project.
#[derive(Debug, Clone)]
pub struct SetConfigItem<'a> {
    /// The project.
    pub project_id: &'a str,
    /// The setting.
    pub item: &'a ConfigItem,
}

impl ApiRequest for SetConfigItem<'_> {
    type Response = ConfigItem;

    fn method(&self) -> http::Method {
        http::Method::PUT
    }

    fn path(&self) -> String {
        PROJECT_CONFIG_ITEM.expand(&[self.project_id, self.item.key.as_str()])
    }

    fn body(&self) -> Option<impl Serialize> {
        Some(Envelope(self.item))
    }
}
