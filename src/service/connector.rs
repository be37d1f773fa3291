use tracing::debug;

use crate::{
    Client, Error, FailureTable, FutureResult, Operation, PollHandler, PollStep, ResourceKind,
    api::{ApiError, Remove},
    client::decode_body,
    connector::{
        ConnectorType, GetIntegration, INTEGRATION, Integration, ProcessExecution, ProcessStatus,
        PutIntegration, StartProcess,
    },
};

const PROCESS: FailureTable = FailureTable::new(
    Operation::ConnectorProcess,
    &[(400, "Connector process failed: invalid parameters"), (409, "Connector process failed: already running")],
    "Connector process failed",
);

/// Manages connector integrations and runs their synchronizations.
#[derive(Debug, Clone)]
pub struct ConnectorService {
    client: Client,
}

impl ConnectorService {
    /// A service using `client`.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// The project's integration with a connector.
    pub fn get_integration(&self, project_id: &str, connector: ConnectorType) -> Result<Integration, Error> {
        self.client
            .send(GetIntegration {
                project_id,
                connector,
            })
            .map_err(|e| {
                e.or_not_found(
                    ResourceKind::Integration,
                    INTEGRATION.expand(&[project_id, connector.as_str()]),
                )
            })
    }

    /// Set up an integration with a connector.
    pub fn create_integration(
        &self,
        project_id: &str,
        connector: ConnectorType,
        integration: &Integration,
    ) -> Result<Integration, Error> {
        self.put(project_id, connector, http::Method::POST, integration)
    }

    /// Change the settings of an existing integration.
    pub fn update_integration(
        &self,
        project_id: &str,
        connector: ConnectorType,
        integration: &Integration,
    ) -> Result<Integration, Error> {
        self.put(project_id, connector, http::Method::PUT, integration)
    }

    fn put(
        &self,
        project_id: &str,
        connector: ConnectorType,
        method: http::Method,
        integration: &Integration,
    ) -> Result<Integration, Error> {
        self.client
            .send(PutIntegration {
                project_id,
                connector,
                method,
                integration,
            })
            .map_err(|e| {
                e.or_not_found(
                    ResourceKind::Integration,
                    INTEGRATION.expand(&[project_id, connector.as_str()]),
                )
            })
    }

    /// Delete the project's integration with a connector.
    pub fn remove_integration(&self, project_id: &str, connector: ConnectorType) -> Result<(), Error> {
        let uri = INTEGRATION.expand(&[project_id, connector.as_str()]);
        self.client
            .send(Remove { uri: &uri })
            .map_err(|e| e.or_not_found(ResourceKind::Integration, uri.as_str()))
    }

    /// Start a synchronization run. The result resolves to the final status
    /// once the run is `SYNCHRONIZED`.
    pub fn execute_process(
        &self,
        project_id: &str,
        connector: ConnectorType,
        execution: &ProcessExecution,
    ) -> Result<FutureResult<ConnectorProcessHandler>, Error> {
        let started = self
            .client
            .send(StartProcess {
                project_id,
                connector,
                execution,
            })
            .map_err(|e| PROCESS.wrap(e))?;

        debug!(project_id, %connector, poll = %started.uri, "connector process started");
        Ok(FutureResult::new(
            self.client.clone(),
            ConnectorProcessHandler { uri: started.uri },
        ))
    }
}

/// Polls a connector process until it leaves its running states.
#[derive(Debug)]
pub struct ConnectorProcessHandler {
    uri: String,
}

impl PollHandler for ConnectorProcessHandler {
    type Output = ProcessStatus;

    fn polling_uri(&self) -> &str {
        &self.uri
    }

    fn handle_poll_result(
        &mut self,
        _client: &Client,
        response: http::Response<Vec<u8>>,
    ) -> Result<PollStep<ProcessStatus>, Error> {
        let process: ProcessStatus = decode_body(response)?;
        let code = &process.status.code;

        if !code.is_finished() {
            Ok(PollStep::Continue)
        } else if code.is_failed() {
            Err(PROCESS.failed(&process.describe()))
        } else {
            Ok(PollStep::Ready(process))
        }
    }

    fn handle_poll_error(&mut self, error: ApiError) -> Error {
        PROCESS.error(error)
    }
}
