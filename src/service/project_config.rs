use tracing::debug;

use crate::{
    Client, Error, FailureTable, Operation, ResourceKind,
    api::{Follow, Page, Remove},
    project_config::{ConfigItem, GetConfigItem, PROJECT_CONFIG, PROJECT_CONFIG_ITEM, SetConfigItem},
};

const SET: FailureTable = FailureTable::new(
    Operation::SetConfigItem,
    &[(400, "Unable to set config item: invalid value"), (403, "Unable to set config item: not permitted")],
    "Unable to set config item",
);

/// Reads and changes hierarchical configuration: settings resolved from the
/// platform catalog, the domain and the project, most specific first.
#[derive(Debug, Clone)]
pub struct HierarchicalConfigService {
    client: Client,
}

impl HierarchicalConfigService {
    /// A service using `client`.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Every setting in effect for a project, whichever level it comes from.
    pub fn list_project_config(&self, project_id: &str) -> Result<Vec<ConfigItem>, Error> {
        let uri = PROJECT_CONFIG.expand(&[project_id]);
        let page = self
            .client
            .send(Follow::<Page<ConfigItem>>::new(&uri))
            .map_err(|e| e.or_not_found(ResourceKind::Project, project_id))?;

        Ok(page.items)
    }

    /// One setting in effect for a project.
    pub fn get_project_config_item(&self, project_id: &str, key: &str) -> Result<ConfigItem, Error> {
        self.client
            .send(GetConfigItem { project_id, key })
            .map_err(|e| e.or_not_found(ResourceKind::ConfigItem, PROJECT_CONFIG_ITEM.expand(&[project_id, key])))
    }

    /// Set a setting at project level, and return it as stored.
    pub fn set_project_config_item(&self, project_id: &str, item: &ConfigItem) -> Result<ConfigItem, Error> {
        let stored = self
            .client
            .send(SetConfigItem { project_id, item })
            .map_err(|e| SET.wrap(e))?;

        debug!(project_id, key = %item.key, "config item set");
        Ok(stored)
    }

    /// Remove the project-level value of a setting, so the domain or catalog
    /// value applies again.
    pub fn remove_project_config_item(&self, project_id: &str, key: &str) -> Result<(), Error> {
        let uri = PROJECT_CONFIG_ITEM.expand(&[project_id, key]);
        self.client
            .send(Remove { uri: &uri })
            .map_err(|e| e.or_not_found(ResourceKind::ConfigItem, uri.as_str()))
    }
}

#[cfg(test)]
mod test {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;
    use crate::api::testutil::{error_body, test_client};

    #[test]
    fn list_items() -> anyhow::Result<()> {
        let (client, mock) = test_client();
        mock.push(200, include_str!("../../tests/fixtures/project_config.json"));

        let items = HierarchicalConfigService::new(client).list_project_config("p1")?;
        let keys: Vec<_> = items.iter().map(|i| i.key.as_str()).collect();

        assert_eq!(keys, ["enableCustomColorPicker", "locale"]);
        assert_eq!(items[0].as_bool(), Some(true));
        assert!(items[1].is_project_value());
        assert_eq!(mock.path(0), "/gdc/projects/p1/config");

        Ok(())
    }

    #[test]
    fn set_then_remove() -> anyhow::Result<()> {
        let (client, mock) = test_client();
        mock.push_json(200, json!({"settingItem": {
                "key": "locale", "value": "cs-CZ", "source": "project",
                "links": {"self": "/gdc/projects/p1/config/locale"}
            }}))
            .push(204, "");

        let service = HierarchicalConfigService::new(client);
        let stored = service.set_project_config_item("p1", &ConfigItem::new("locale", "cs-CZ"))?;
        assert!(stored.is_project_value());
        service.remove_project_config_item("p1", "locale")?;

        assert_eq!(mock.request(0).method(), http::Method::PUT);
        assert_eq!(mock.json_body(0), json!({"settingItem": {"key": "locale", "value": "cs-CZ"}}));
        assert_eq!(mock.request(1).method(), http::Method::DELETE);
        assert_eq!(mock.path(1), "/gdc/projects/p1/config/locale");

        Ok(())
    }

    #[test]
    fn missing_item() {
        let (client, mock) = test_client();
        mock.push_json(404, error_body("gdc.config.not_found", "No such key"));

        assert_matches!(
            HierarchicalConfigService::new(client).get_project_config_item("p1", "nope"),
            Err(Error::NotFound { kind: ResourceKind::ConfigItem, ref uri, .. })
                if uri == "/gdc/projects/p1/config/nope"
        );
    }

    #[test]
    fn set_forbidden() {
        let (client, mock) = test_client();
        mock.push_json(403, error_body("gdc.forbidden", "Forbidden"));

        let err = HierarchicalConfigService::new(client)
            .set_project_config_item("p1", &ConfigItem::new("locale", "cs-CZ"))
            .unwrap_err();
        assert_eq!(err.to_string(), "Unable to set config item: not permitted");
    }
}
