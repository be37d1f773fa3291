//! API operations concerning data load processes (ETL graphs and scripts
//! deployed to a project).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::api::{ApiRequest, DataResponse, Envelope, PageItem, RestError, UriTemplate, wrapped};

/// All processes of a project.
pub const PROCESSES: UriTemplate = UriTemplate::new("/gdc/projects/{projectId}/dataload/processes");
/// A single process.
pub const PROCESS: UriTemplate =
    UriTemplate::new("/gdc/projects/{projectId}/dataload/processes/{processId}");
/// The executions of a process; POST here to run it.
pub const EXECUTIONS: UriTemplate =
    UriTemplate::new("/gdc/projects/{projectId}/dataload/processes/{processId}/executions");

/// A deployed process, `{"process": {...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataloadProcess {
    /// The process name.
    pub name: String,
    /// The process type, e.g. `GRAPH`, `RUBY`, `DATALOAD`.
    #[serde(rename = "type")]
    pub process_type: String,
    /// The executable files within the deployed archive.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub executables: Vec<String>,
    /// Server-assigned links.
    #[serde(default, skip_serializing)]
    pub links: Option<ProcessLinks>,
}

/// Links of a [DataloadProcess].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessLinks {
    /// The process itself.
    #[serde(rename = "self")]
    pub self_link: String,
    /// Its executions.
    pub executions: String,
    /// The deployed archive.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

wrapped!(DataloadProcess => "process");
impl DataResponse for DataloadProcess {}

impl PageItem for DataloadProcess {
    const PAGE_ROOT: &'static str = "processes";
}

impl DataloadProcess {
    /// The URI of the process, if it came from the server.
    pub fn uri(&self) -> Option<&str> {
        self.links.as_ref().map(|l| l.self_link.as_str())
    }

    /// The URI to POST executions to, if the process came from the server.
    pub fn executions_uri(&self) -> Option<&str> {
        self.links.as_ref().map(|l| l.executions.as_str())
    }
}

/// A request to run a process, `{"execution": {...}}`.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessExecution {
    /// The executable to run, for processes that have several.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub executable: Option<String>,
    /// Parameters passed to the process.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub params: BTreeMap<String, String>,
    /// Parameters passed to the process, hidden from logs.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub hidden_params: BTreeMap<String, String>,
}

wrapped!(ProcessExecution => "execution");

impl ProcessExecution {
    /// Run `executable`.
    pub fn new(executable: impl Into<String>) -> Self {
        Self {
            executable: Some(executable.into()),
            ..Default::default()
        }
    }

    /// Add a parameter.
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Add a hidden parameter.
    pub fn hidden_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.hidden_params.insert(key.into(), value.into());
        self
    }
}

/// Returned when an execution is started, `{"executionTask": {"links": {...}}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionTask {
    /// Links of the execution.
    pub links: ExecutionTaskLinks,
}

/// Links of an [ExecutionTask].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionTaskLinks {
    /// Answers 202 while the execution runs and 204 once it has finished.
    pub poll: String,
    /// The [ExecutionDetail] of the execution.
    pub detail: String,
}

wrapped!(ExecutionTask => "executionTask");
impl DataResponse for ExecutionTask {}

/// The state of a finished (or running) execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ExecutionStatus {
    /// Waiting to be scheduled.
    Scheduled,
    /// Running.
    Running,
    /// Finished successfully.
    Ok,
    /// Failed.
    Error,
    /// Cancelled.
    Cancelled,
    /// A state this client does not know about.
    #[serde(other)]
    Unknown,
}

/// The outcome of an execution, `{"executionDetail": {...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionDetail {
    /// The state.
    pub status: ExecutionStatus,
    /// When the execution was requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<chrono::DateTime<chrono::Utc>>,
    /// When it started running.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started: Option<chrono::DateTime<chrono::Utc>>,
    /// When it last changed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<chrono::DateTime<chrono::Utc>>,
    /// When it finished.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished: Option<chrono::DateTime<chrono::Utc>>,
    /// The name of the log file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_file_name: Option<String>,
    /// Why the execution failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RestError>,
    /// Links of the execution.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub links: BTreeMap<String, String>,
}

wrapped!(ExecutionDetail => "executionDetail");
impl DataResponse for ExecutionDetail {}

impl ExecutionDetail {
    /// The URI of the execution log, if there is one.
    pub fn log_uri(&self) -> Option<&str> {
        self.links.get("log").map(String::as_str)
    }
}

/// Start an execution of a process.
#[derive(Debug, Clone)]
pub struct StartExecution<'a> {
    /// The executions URI of the process.
    pub executions_uri: &'a str,
    /// What to run.
    pub execution: &'a ProcessExecution,
}

impl ApiRequest for StartExecution<'_> {
    type Response = ExecutionTask;

    fn method(&self) -> http::Method {
        http::Method::POST
    }

    fn path(&self) -> String {
        self.executions_uri.to_owned()
    }

    fn body(&self) -> Option<impl Serialize> {
        Some(Envelope(self.execution))
    }
}
