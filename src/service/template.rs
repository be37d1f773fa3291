use crate::{
    Client, Error, ResourceKind,
    api::{Follow, Page},
    dataset::DatasetManifest,
    template::{ProjectTemplate, TEMPLATE, TEMPLATES},
};

/// Reads the published project templates.
#[derive(Debug, Clone)]
pub struct ProjectTemplateService {
    client: Client,
}

impl ProjectTemplateService {
    /// A service using `client`.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Every published template.
    pub fn list_templates(&self) -> Result<Vec<ProjectTemplate>, Error> {
        let page = self.client.send(Follow::<Page<ProjectTemplate>>::new(TEMPLATES))?;
        Ok(page.items)
    }

    /// One version of a template.
    pub fn get_template(&self, id: &str, version: &str) -> Result<ProjectTemplate, Error> {
        let uri = TEMPLATE.expand(&[id, version]);
        self.client
            .send(Follow::<ProjectTemplate>::new(&uri))
            .map_err(|e| e.or_not_found(ResourceKind::ProjectTemplate, uri.as_str()))
    }

    /// The dataset manifests of a template, in the order it lists them.
    pub fn get_manifests(&self, template: &ProjectTemplate) -> Result<Vec<DatasetManifest>, Error> {
        template
            .manifests
            .iter()
            .map(|uri| {
                self.client
                    .send(Follow::<DatasetManifest>::new(uri))
                    .map_err(|e| e.or_not_found(ResourceKind::Dataset, uri.as_str()))
            })
            .collect()
    }
}

#[cfg(test)]
mod test {
    use assert_matches::assert_matches;

    use super::*;
    use crate::api::testutil::test_client;

    #[test]
    fn templates_and_manifests() -> anyhow::Result<()> {
        let (client, mock) = test_client();
        let manifest = include_str!("../../tests/fixtures/manifest.json");
        mock.push(200, include_str!("../../tests/fixtures/project_templates.json"))
            .push(200, manifest)
            .push(200, manifest);

        let service = ProjectTemplateService::new(client);
        let templates = service.list_templates()?;
        let manifests = service.get_manifests(&templates[0])?;

        assert_eq!(manifests.len(), 2);
        assert_eq!(manifests[0].data_set, "dataset.person");
        assert_eq!(mock.path(0), "/projectTemplates");
        assert_eq!(mock.path(2), "/projectTemplates/ZendeskAnalytics/11/manifests/dataset.users");

        Ok(())
    }

    #[test]
    fn missing_template() {
        let (client, mock) = test_client();
        mock.push(404, "");

        assert_matches!(
            ProjectTemplateService::new(client).get_template("Nope", "1"),
            Err(Error::NotFound { kind: ResourceKind::ProjectTemplate, ref uri, .. })
                if uri == "/projectTemplates/Nope/1"
        );
    }
}
