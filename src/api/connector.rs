//! API operations concerning connector integrations, which pull data from
//! third-party services into a project.

use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};

use crate::api::{ApiRequest, DataResponse, Envelope, UriResponse, UriTemplate, wrapped};

/// The integration of one connector in a project.
pub const INTEGRATION: UriTemplate =
    UriTemplate::new("/gdc/projects/{projectId}/connectors/{connector}/integration");
/// The processes of an integration; POST here to start one.
pub const INTEGRATION_PROCESSES: UriTemplate =
    UriTemplate::new("/gdc/projects/{projectId}/connectors/{connector}/integration/processes");

/// The supported connectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectorType {
    /// Zendesk.
    Zendesk4,
    /// Coupa.
    Coupa,
    /// Pardot.
    Pardot,
}

impl ConnectorType {
    /// The name used in URIs.
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectorType::Zendesk4 => "zendesk4",
            ConnectorType::Coupa => "coupa",
            ConnectorType::Pardot => "pardot",
        }
    }
}

impl fmt::Display for ConnectorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A connector set up for a project, `{"integration": {...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Integration {
    /// The project template the integration maintains.
    pub project_template: String,
    /// Whether scheduled processes run.
    #[serde(default)]
    pub active: bool,
    /// The last process that finished.
    #[serde(default, skip_serializing)]
    pub last_finished_process: Option<ProcessStatus>,
    /// The last process that finished successfully.
    #[serde(default, skip_serializing)]
    pub last_successful_process: Option<ProcessStatus>,
    /// The process currently running.
    #[serde(default, skip_serializing)]
    pub running_process: Option<ProcessStatus>,
}

wrapped!(Integration => "integration");
impl DataResponse for Integration {}

impl Integration {
    /// An active integration maintaining `project_template`.
    pub fn new(project_template: impl Into<String>) -> Self {
        Self {
            project_template: project_template.into(),
            active: true,
            last_finished_process: None,
            last_successful_process: None,
            running_process: None,
        }
    }
}

/// The code of a connector process status.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ProcessState {
    /// Accepted, not yet started.
    New,
    /// Started, pulling or loading data.
    Running(String),
    /// Finished successfully.
    Synchronized,
    /// Failed because of the platform or the connector.
    Error,
    /// Failed because of the user's configuration.
    UserError,
}

impl From<String> for ProcessState {
    fn from(s: String) -> Self {
        match s.as_str() {
            "NEW" => ProcessState::New,
            "SYNCHRONIZED" => ProcessState::Synchronized,
            "ERROR" => ProcessState::Error,
            "USER_ERROR" => ProcessState::UserError,
            _ => ProcessState::Running(s),
        }
    }
}

impl From<ProcessState> for String {
    fn from(s: ProcessState) -> Self {
        match s {
            ProcessState::New => "NEW".to_owned(),
            ProcessState::Running(s) => s,
            ProcessState::Synchronized => "SYNCHRONIZED".to_owned(),
            ProcessState::Error => "ERROR".to_owned(),
            ProcessState::UserError => "USER_ERROR".to_owned(),
        }
    }
}

impl ProcessState {
    /// Whether the process has stopped.
    pub fn is_finished(&self) -> bool {
        matches!(
            self,
            ProcessState::Synchronized | ProcessState::Error | ProcessState::UserError
        )
    }

    /// Whether the process stopped with a failure.
    pub fn is_failed(&self) -> bool {
        matches!(self, ProcessState::Error | ProcessState::UserError)
    }
}

/// The status block of a [ProcessStatus].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    /// The state.
    pub code: ProcessState,
    /// A short description of the state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Details, usually of a failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// A connector process, `{"process": {...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessStatus {
    /// The state of the process.
    pub status: Status,
    /// When the process started.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started: Option<chrono::DateTime<chrono::Utc>>,
    /// When the process finished.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished: Option<chrono::DateTime<chrono::Utc>>,
    /// Server-assigned links.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub links: BTreeMap<String, String>,
}

wrapped!(ProcessStatus => "process");
impl DataResponse for ProcessStatus {}

impl ProcessStatus {
    /// The URI of the process, if the server sent one.
    pub fn uri(&self) -> Option<&str> {
        self.links.get("self").map(String::as_str)
    }

    /// A description of the state, for error messages.
    pub fn describe(&self) -> String {
        let code = String::from(self.status.code.clone());
        match self.status.detail.as_deref().or(self.status.description.as_deref()) {
            Some(detail) => format!("{code} ({detail})"),
            None => code,
        }
    }
}

/// Settings for running a connector process, `{"process": {...}}`.
///
/// Connector-specific settings (e.g. Zendesk's `incremental`) are passed as
/// parameters.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessExecution {
    /// The settings.
    #[serde(flatten)]
    pub params: BTreeMap<String, serde_json::Value>,
}

wrapped!(ProcessExecution => "process");

impl ProcessExecution {
    /// Set a setting.
    pub fn param(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }
}

/// Load the integration of a connector.
#[derive(Debug, Clone)]
pub struct GetIntegration<'a> {
    /// The project.
    pub project_id: &'a str,
    /// The connector.
    pub connector: ConnectorType,
}

impl ApiRequest for GetIntegration<'_> {
    type Response = Integration;

    fn path(&self) -> String {
        INTEGRATION.expand(&[self.project_id, self.connector.as_str()])
    }
}

/// Create or replace the integration of a connector.
#[derive(Debug, Clone)]
pub struct PutIntegration<'a> {
    /// The project.
    pub project_id: &'a str,
    /// The connector.
    pub connector: ConnectorType,
    /// POST creates a new integration, PUT updates an existing one.
    pub method: http::Method,
    /// The integration settings.
    pub integration: &'a Integration,
}

impl ApiRequest for PutIntegration<'_> {
    type Response = Integration;

    fn method(&self) -> http::Method {
        self.method.clone()
    }

    fn path(&self) -> String {
        INTEGRATION.expand(&[self.project_id, self.connector.as_str()])
    }

    fn body(&self) -> Option<impl Serialize> {
        Some(Envelope(self.integration))
    }
}

/// Start a connector process. The response links to the process, which is
/// polled until it stops.
#[derive(Debug, Clone)]
pub struct StartProcess<'a> {
    /// The project.
    pub project_id: &'a str,
    /// The connector.
    pub connector: ConnectorType,
    /// Settings for the run.
    pub execution: &'a ProcessExecution,
}

impl ApiRequest for StartProcess<'_> {
    type Response = UriResponse;

    fn method(&self) -> http::Method {
        http::Method::POST
    }

    fn path(&self) -> String {
        INTEGRATION_PROCESSES.expand(&[self.project_id, self.connector.as_str()])
    }

    fn body(&self) -> Option<impl Serialize> {
        Some(Envelope(self.execution))
    }
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::*;
    use crate::api::{decode, encode};

    #[test]
    fn decode_integration() -> anyhow::Result<()> {
        let integration: Integration =
            decode(&include_bytes!("../../tests/fixtures/integration.json")[..])?;

        assert!(integration.active);
        assert_eq!(integration.project_template, "/projectTemplates/ZendeskAnalytics/11");

        let last = integration.last_finished_process.as_ref().unwrap();
        assert!(last.status.code.is_failed());
        assert_eq!(last.describe(), "USER_ERROR (Invalid credentials)");

        let running = integration.running_process.as_ref().unwrap();
        assert_eq!(running.status.code, ProcessState::Running("DOWNLOADING".into()));
        assert!(!running.status.code.is_finished());

        Ok(())
    }

    #[test]
    fn encode_integration_skips_processes() -> anyhow::Result<()> {
        let mut integration = Integration::new("/projectTemplates/ZendeskAnalytics/11");
        integration.active = false;

        assert_eq!(
            serde_json::from_slice::<serde_json::Value>(&encode(&integration)?)?,
            json!({"integration": {"projectTemplate": "/projectTemplates/ZendeskAnalytics/11", "active": false}})
        );

        Ok(())
    }

    #[test]
    fn process_settings() -> anyhow::Result<()> {
        let execution = ProcessExecution::default().param("incremental", true);
        assert_eq!(
            serde_json::from_slice::<serde_json::Value>(&encode(&execution)?)?,
            json!({"process": {"incremental": true}})
        );

        assert_eq!(
            serde_json::from_slice::<serde_json::Value>(&encode(&ProcessExecution::default())?)?,
            json!({"process": {}})
        );

        Ok(())
    }
}
