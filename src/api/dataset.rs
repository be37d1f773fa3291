//! API operations concerning data loads into datasets.

use serde::{Deserialize, Serialize};

use crate::api::{ApiRequest, DataResponse, Envelope, UriTemplate, wrapped};

/// Load data files already uploaded to the project's staging area.
pub const PULL: UriTemplate = UriTemplate::new("/gdc/md/{projectId}/etl/pull2");
/// The single-load-interface manifest of a dataset.
pub const MANIFEST: UriTemplate =
    UriTemplate::new("/gdc/md/{projectId}/ldm/singleloadinterface/{dataSet}/manifest");

/// A load of the staging directory `dir`, `{"pullIntegration": "dir"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Pull(pub String);

wrapped!(Pull => "pullIntegration");

/// Returned when a load is submitted, `{"pull2Task": {"links": {"poll": "..."}}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullTask {
    /// Links of the task.
    pub links: PullTaskLinks,
}

/// Links of a [PullTask].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullTaskLinks {
    /// The task status to poll.
    pub poll: String,
}

wrapped!(PullTask => "pull2Task");
impl DataResponse for PullTask {}

impl PullTask {
    /// The task status to poll.
    pub fn poll_uri(&self) -> &str {
        &self.links.poll
    }
}

/// Start loading the files in a staging directory.
#[derive(Debug, Clone)]
pub struct SubmitPull<'a> {
    /// The project to load into.
    pub project_id: &'a str,
    /// The staging directory holding the data files and `upload_info.json`.
    pub dir: &'a str,
}

impl ApiRequest for SubmitPull<'_> {
    type Response = PullTask;

    fn method(&self) -> http::Method {
        http::Method::POST
    }

    fn path(&self) -> String {
        PULL.expand(&[self.project_id])
    }

    fn body(&self) -> Option<impl Serialize> {
        Some(Envelope(Pull(self.dir.to_owned())))
    }
}

/// How a load changes the data already in a dataset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum UploadMode {
    /// Replace all data.
    #[default]
    Full,
    /// Append or update rows.
    Incremental,
}

/// How one CSV column maps onto the dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestPart {
    /// The column header in the CSV file.
    pub column_name: String,
    /// The model objects the column populates.
    pub populates: Vec<String>,
    /// The load mode.
    #[serde(default)]
    pub mode: UploadMode,
    /// Set on the columns that form the connection point.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_key: Option<u8>,
    /// Date format, for date columns.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraints: Option<serde_json::Value>,
}

/// A dataset's load manifest, `{"dataSetSLIManifest": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetManifest {
    /// The dataset identifier.
    pub data_set: String,
    /// The CSV file name inside the upload.
    pub file: String,
    /// The column mappings.
    #[serde(default)]
    pub parts: Vec<ManifestPart>,
}

wrapped!(DatasetManifest => "dataSetSLIManifest");
impl DataResponse for DatasetManifest {}

impl DatasetManifest {
    /// Set the load mode of every column.
    pub fn set_upload_mode(&mut self, mode: UploadMode) {
        for part in &mut self.parts {
            part.mode = mode;
        }
    }
}

/// Load the manifest of a dataset.
#[derive(Debug, Clone)]
pub struct GetManifest<'a> {
    /// The project owning the dataset.
    pub project_id: &'a str,
    /// The dataset identifier, e.g. `dataset.person`.
    pub dataset: &'a str,
}

impl ApiRequest for GetManifest<'_> {
    type Response = DatasetManifest;

    fn path(&self) -> String {
        MANIFEST.expand(&[self.project_id, self.dataset])
    }
}

/// The `upload_info.json` descriptor placed next to the data files in a
/// staging directory: `{"dataSetSLIManifestList": [...]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadInfo(pub Vec<Envelope<DatasetManifest>>);

wrapped!(UploadInfo => "dataSetSLIManifestList");
