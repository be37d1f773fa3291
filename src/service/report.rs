use tracing::debug;

use crate::{
    Client, Error, FailureTable, FutureResult, Operation, PollHandler, PollStep,
    api::ApiError,
    export::{ExecuteReport, ReportRequest},
    poll::decode_json,
};

const EXECUTE: FailureTable = FailureTable::new(
    Operation::ReportExecution,
    &[(400, "Report definition is not valid"), (413, "Report is too large")],
    "Unable to execute report",
);

/// Computes reports and fetches their raw data.
#[derive(Debug, Clone)]
pub struct ReportService {
    client: Client,
}

impl ReportService {
    /// A service using `client`.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Start computing a report. The result is the raw data document, or
    /// `None` if the report has no data.
    pub fn execute(&self, report: &ReportRequest) -> Result<FutureResult<ReportDataHandler>, Error> {
        let result = self
            .client
            .send(ExecuteReport { report })
            .map_err(|e| EXECUTE.wrap(e))?;

        debug!(report = report.uri(), poll = %result.data_result, "report executed");
        Ok(FutureResult::new(
            self.client.clone(),
            ReportDataHandler {
                uri: result.data_result,
            },
        ))
    }
}

/// Polls a report data result.
#[derive(Debug)]
pub struct ReportDataHandler {
    uri: String,
}

impl PollHandler for ReportDataHandler {
    type Output = Option<serde_json::Value>;

    fn polling_uri(&self) -> &str {
        &self.uri
    }

    fn handle_poll_result(
        &mut self,
        _client: &Client,
        response: http::Response<Vec<u8>>,
    ) -> Result<PollStep<Self::Output>, Error> {
        if response.status() == http::StatusCode::NO_CONTENT {
            return Ok(PollStep::Ready(None));
        }

        decode_json(response).map(|data| PollStep::Ready(Some(data)))
    }

    fn handle_poll_error(&mut self, error: ApiError) -> Error {
        EXECUTE.error(error)
    }
}
