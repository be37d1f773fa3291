//! API operations concerning the logical data model of a project.

use serde::{Deserialize, Serialize};

use crate::api::{ApiRequest, AsyncTask, DataResponse, Envelope, LinkEntries, UriTemplate, wrapped};

/// Compute the difference between a project's model and a target model.
pub const MODEL_DIFF: UriTemplate = UriTemplate::new("/gdc/projects/{projectId}/model/diff");
/// Execute MAQL DDL against a project.
pub const MANAGE: UriTemplate = UriTemplate::new("/gdc/md/{projectId}/ldm/manage2");

/// The link category of the task status in a [LinkEntries] returned by
/// [MANAGE].
pub const TASKS_STATUS: &str = "tasks-status";

/// The target of a model diff, `{"diffRequest": {"targetModel": {...}}}`.
///
/// The target model is passed through as JSON in the `projectModel` format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffRequest {
    /// The model the project should end up with.
    pub target_model: serde_json::Value,
}

wrapped!(DiffRequest => "diffRequest");

impl DiffRequest {
    /// Diff against `target_model`.
    pub fn new(target_model: serde_json::Value) -> Self {
        Self { target_model }
    }
}

/// The result of a model diff, `{"projectModelDiff": {...}}`.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelDiff {
    /// Human-readable descriptions of the changes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub update_operations: Vec<serde_json::Value>,
    /// Alternative scripts that carry out the change.
    #[serde(default)]
    pub update_scripts: Vec<Envelope<UpdateScript>>,
}

wrapped!(ModelDiff => "projectModelDiff");
impl DataResponse for ModelDiff {}

/// One way of carrying out a [ModelDiff], `{"updateScript": {...}}`.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateScript {
    /// Whether loaded data survives the change.
    #[serde(default)]
    pub preserve_data: bool,
    /// Whether dependent objects are dropped.
    #[serde(default)]
    pub cascade_drops: bool,
    /// The whole script as one statement.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maql_ddl: Option<String>,
    /// The script split into statements that can be run one by one.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub maql_ddl_chunks: Vec<String>,
}

wrapped!(UpdateScript => "updateScript");

impl UpdateScript {
    /// The statements of this script: its chunks if the server split it,
    /// otherwise the single statement.
    pub fn statements(&self) -> Vec<&str> {
        if self.maql_ddl_chunks.is_empty() {
            self.maql_ddl.iter().map(String::as_str).collect()
        } else {
            self.maql_ddl_chunks.iter().map(String::as_str).collect()
        }
    }
}

impl ModelDiff {
    /// The scripts, unwrapped.
    pub fn scripts(&self) -> impl Iterator<Item = &UpdateScript> {
        self.update_scripts.iter().map(|s| &s.0)
    }

    /// The MAQL statements of every script, in the order the server sent
    /// them.
    pub fn update_maql(&self) -> Vec<String> {
        self.scripts()
            .flat_map(UpdateScript::statements)
            .map(str::to_owned)
            .collect()
    }

    /// The MAQL statements of the scripts matching the given flags, in the
    /// order the server sent them.
    pub fn update_maql_with(&self, preserve_data: bool, cascade_drops: bool) -> Vec<String> {
        self.scripts()
            .filter(|s| s.preserve_data == preserve_data && s.cascade_drops == cascade_drops)
            .flat_map(UpdateScript::statements)
            .map(str::to_owned)
            .collect()
    }
}

/// A MAQL DDL statement to execute, `{"manage": {"maql": "..."}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaqlDdl {
    /// The statement.
    pub maql: String,
}

wrapped!(MaqlDdl => "manage");

/// Submit a model diff.
#[derive(Debug, Clone)]
pub struct DiffModel<'a> {
    /// The project whose model is compared.
    pub project_id: &'a str,
    /// The target model.
    pub request: &'a DiffRequest,
}

impl ApiRequest for DiffModel<'_> {
    type Response = AsyncTask;

    fn method(&self) -> http::Method {
        http::Method::POST
    }

    fn path(&self) -> String {
        MODEL_DIFF.expand(&[self.project_id])
    }

    fn body(&self) -> Option<impl Serialize> {
        Some(Envelope(self.request))
    }
}

/// Submit one MAQL DDL statement. The response links to a task status.
#[derive(Debug, Clone)]
pub struct ExecuteMaql<'a> {
    /// The project to change.
    pub project_id: &'a str,
    /// The statement.
    pub maql: &'a str,
}

impl ApiRequest for ExecuteMaql<'_> {
    type Response = LinkEntries;

    fn method(&self) -> http::Method {
        http::Method::POST
    }

    fn path(&self) -> String {
        MANAGE.expand(&[self.project_id])
    }

    fn body(&self) -> Option<impl Serialize> {
        Some(Envelope(MaqlDdl {
            maql: self.maql.to_owned(),
        }))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::api::decode;

    #[test]
    fn maql_in_source_order() -> anyhow::Result<()> {
        let body = include_bytes!("../../tests/fixtures/model_diff.json");
        let diff: ModelDiff = decode(&body[..])?;

        assert_eq!(diff.update_scripts.len(), 2);
        assert_eq!(
            diff.update_maql(),
            vec![
                "CREATE DATASET {dataset.person} VISUAL(TITLE \"Person\");",
                "ALTER DATASET {dataset.person} DROP {attr.person.name};",
            ]
        );
        assert_eq!(
            diff.update_maql_with(false, true),
            vec!["ALTER DATASET {dataset.person} DROP {attr.person.name};"]
        );

        Ok(())
    }

    #[test]
    fn chunks_take_precedence() {
        let script = UpdateScript {
            maql_ddl: Some("A; B;".into()),
            maql_ddl_chunks: vec!["A;".into(), "B;".into()],
            ..Default::default()
        };
        assert_eq!(script.statements(), vec!["A;", "B;"]);
    }

    #[test]
    fn diff_request_body() -> anyhow::Result<()> {
        let request = DiffRequest::new(serde_json::json!({"projectModel": {"datasets": []}}));
        let req = DiffModel {
            project_id: "p1",
            request: &request,
        }
        .into_request(&crate::Profile::new("https://secure.example.com")?)?;

        assert_eq!(req.uri().path(), "/gdc/projects/p1/model/diff");
        assert_eq!(
            serde_json::from_slice::<serde_json::Value>(req.body())?,
            serde_json::json!({"diffRequest": {"targetModel": {"projectModel": {"datasets": []}}}})
        );

        Ok(())
    }
}
