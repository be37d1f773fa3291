//! API operations concerning project templates.

use serde::{Deserialize, Serialize};

use crate::api::{DataResponse, PageItem, UriTemplate, wrapped};

/// All published templates.
pub const TEMPLATES: &str = "/projectTemplates";
/// One version of a template.
pub const TEMPLATE: UriTemplate = UriTemplate::new("/projectTemplates/{id}/{version}");

/// A template projects can be created from, `{"projectTemplate": {...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectTemplate {
    /// The URL of the template's project model.
    pub url: String,
    /// The identifier, e.g. `urn:gooddata:ZendeskAnalytics`.
    pub urn: String,
    /// The template version.
    pub version: String,
    /// The URIs of the dataset manifests describing how to load data.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub manifests: Vec<String>,
    /// The title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

wrapped!(ProjectTemplate => "projectTemplate");
impl DataResponse for ProjectTemplate {}

impl PageItem for ProjectTemplate {
    const PAGE_ROOT: &'static str = "projectTemplates";
}

impl ProjectTemplate {
    /// The URI of this template version.
    pub fn uri(&self) -> String {
        let id = self.urn.rsplit(':').next().unwrap_or(&self.urn);
        TEMPLATE.expand(&[id, self.version.as_str()])
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::api::{Page, decode};

    #[test]
    fn decode_templates() -> anyhow::Result<()> {
        let page: Page<ProjectTemplate> =
            decode(&include_bytes!("../../tests/fixtures/project_templates.json")[..])?;

        assert_eq!(page.items.len(), 1);
        let template = &page.items[0];
        assert_eq!(template.manifests.len(), 2);
        assert_eq!(template.uri(), "/projectTemplates/ZendeskAnalytics/11");
        assert!(page.paging.next.is_none());

        Ok(())
    }
}
