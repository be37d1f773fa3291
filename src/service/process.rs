use tracing::debug;

use crate::{
    Client, Error, FailureTable, FutureResult, Operation, PollHandler, PollStep, ResourceKind,
    api::{ApiError, Follow, Page, Remove},
    client::decode_body,
    process::{
        DataloadProcess, ExecutionDetail, ExecutionStatus, PROCESS, PROCESSES, ProcessExecution,
        StartExecution,
    },
};

const EXECUTE: FailureTable = FailureTable::new(
    Operation::ProcessExecution,
    &[(400, "Unable to execute process: invalid execution"), (409, "Unable to execute process: already running")],
    "Unable to execute process",
);

/// Reads, runs and removes data load processes.
#[derive(Debug, Clone)]
pub struct ProcessService {
    client: Client,
}

impl ProcessService {
    /// A service using `client`.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// The process with the given id in a project.
    pub fn get_by_id(&self, project_id: &str, process_id: &str) -> Result<DataloadProcess, Error> {
        self.get_by_uri(&PROCESS.expand(&[project_id, process_id]))
    }

    /// The process at the given URI.
    pub fn get_by_uri(&self, uri: &str) -> Result<DataloadProcess, Error> {
        self.client
            .send(Follow::<DataloadProcess>::new(uri))
            .map_err(|e| e.or_not_found(ResourceKind::Process, uri))
    }

    /// Every process deployed to a project.
    pub fn list(&self, project_id: &str) -> Result<Vec<DataloadProcess>, Error> {
        let uri = PROCESSES.expand(&[project_id]);
        let page = self
            .client
            .send(Follow::<Page<DataloadProcess>>::new(&uri))
            .map_err(|e| e.or_not_found(ResourceKind::Project, project_id))?;

        Ok(page.items)
    }

    /// Delete a process loaded from the server.
    pub fn remove(&self, process: &DataloadProcess) -> Result<(), Error> {
        let uri = process.uri().ok_or(Error::MissingUri {
            kind: ResourceKind::Process,
        })?;

        self.client
            .send(Remove { uri })
            .map_err(|e| e.or_not_found(ResourceKind::Process, uri))
    }

    /// Start running a process. The result resolves to the execution detail
    /// once the run finishes successfully.
    pub fn execute(
        &self,
        process: &DataloadProcess,
        execution: &ProcessExecution,
    ) -> Result<FutureResult<ProcessExecutionHandler>, Error> {
        let executions_uri = process.executions_uri().ok_or(Error::MissingUri {
            kind: ResourceKind::Process,
        })?;

        let task = self
            .client
            .send(StartExecution {
                executions_uri,
                execution,
            })
            .map_err(|e| EXECUTE.wrap(e.or_not_found(ResourceKind::Process, executions_uri)))?;

        debug!(process = %process.name, poll = %task.links.poll, "process execution started");
        Ok(FutureResult::new(
            self.client.clone(),
            ProcessExecutionHandler {
                uri: task.links.poll,
                detail: Some(task.links.detail),
            },
        ))
    }
}

/// Waits for a process run to end, then reads its detail.
///
/// The poll link answers 202 while the run is in progress and 204 once it
/// has ended either way; the detail link then tells which.
#[derive(Debug)]
pub struct ProcessExecutionHandler {
    uri: String,
    detail: Option<String>,
}

impl PollHandler for ProcessExecutionHandler {
    type Output = ExecutionDetail;

    fn polling_uri(&self) -> &str {
        &self.uri
    }

    fn handle_poll_result(
        &mut self,
        _client: &Client,
        response: http::Response<Vec<u8>>,
    ) -> Result<PollStep<ExecutionDetail>, Error> {
        if let Some(detail) = self.detail.take() {
            self.uri = detail;
            return Ok(PollStep::Follow);
        }

        let detail: ExecutionDetail = decode_body(response)?;
        match detail.status {
            ExecutionStatus::Ok => Ok(PollStep::Ready(detail)),
            ExecutionStatus::Scheduled | ExecutionStatus::Running => Ok(PollStep::Continue),
            ExecutionStatus::Error | ExecutionStatus::Cancelled | ExecutionStatus::Unknown => {
                let message = detail
                    .error
                    .as_ref()
                    .map(|e| e.formatted_message())
                    .unwrap_or_default();
                Err(EXECUTE.failed(&message))
            }
        }
    }

    fn handle_poll_error(&mut self, error: ApiError) -> Error {
        if error.is_not_found() {
            return Error::from(error).or_not_found(ResourceKind::ProcessExecution, self.uri.as_str());
        }

        EXECUTE.error(error)
    }
}
