//! API operations concerning the output stage, the warehouse schema a
//! project's automated data distribution reads from.

use serde::{Deserialize, Serialize};

use crate::api::{ApiRequest, DataResponse, Envelope, UriTemplate, wrapped};

/// The output stage of a project.
pub const OUTPUT_STAGE: UriTemplate = UriTemplate::new("/gdc/dataload/projects/{projectId}/outputStage");

/// `{"outputStage": {...}}`.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputStage {
    /// The warehouse schema URI, e.g.
    /// `/gdc/datawarehouse/instances/{id}/schemas/default`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    /// The client id used to pick rows for this project.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    /// The prefix of the tables and views to read.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_stage_prefix: Option<String>,
    /// Server-assigned links.
    #[serde(default, skip_serializing)]
    pub links: Option<OutputStageLinks>,
}

/// Links of an [OutputStage].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputStageLinks {
    /// The output stage itself.
    #[serde(rename = "self")]
    pub self_link: String,
}

wrapped!(OutputStage => "outputStage");
impl DataResponse for OutputStage {}

impl OutputStage {
    /// The URI of the output stage, if it came from the server.
    pub fn uri(&self) -> Option<&str> {
        self.links.as_ref().map(|l| l.self_link.as_str())
    }

    /// The warehouse instance id, parsed out of the schema URI.
    pub fn warehouse_id(&self) -> Option<&str> {
        let rest = self.schema.as_deref()?.strip_prefix("/gdc/datawarehouse/instances/")?;
        rest.split('/').next().filter(|id| !id.is_empty())
    }
}

/// Load the output stage of a project.
#[derive(Debug, Clone)]
pub struct GetOutputStage<'a> {
    /// The project.
    pub project_id: &'a str,
}

impl ApiRequest for GetOutputStage<'_> {
    type Response = OutputStage;

    fn path(&self) -> String {
        OUTPUT_STAGE.expand(&[self.project_id])
    }
}

/// Replace the output stage settings.
#[derive(Debug, Clone)]
pub struct UpdateOutputStage<'a> {
    /// The output stage URI.
    pub uri: &'a str,
    /// The new settings.
    pub output_stage: &'a OutputStage,
}

impl ApiRequest for UpdateOutputStage<'_> {
    type Response = OutputStage;

    fn method(&self) -> http::Method {
        http::Method::PUT
    }

    fn path(&self) -> String {
        self.uri.to_owned()
    }

    fn body(&self) -> Option<impl Serialize> {
        Some(Envelope(self.output_stage))
    }
}
