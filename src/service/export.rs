use std::{fmt, io::Write};

use tracing::debug;

use crate::{
    Client, Error, FailureTable, FutureResult, Operation, PollHandler, PollStep,
    api::ApiError,
    export::{ExportFormat, ReportRequest, SubmitExport, SubmitRawExport},
};

const EXPORT: FailureTable = FailureTable::new(
    Operation::ReportExport,
    &[(204, "Report contains no data")],
    "Unable to export report",
);

const RAW: FailureTable = FailureTable::new(
    Operation::RawExport,
    &[(204, "Report contains no data"), (413, "Report is too large to export")],
    "Unable to export report",
);

/// Exports reports to files.
#[derive(Debug, Clone)]
pub struct ExportService {
    client: Client,
}

impl ExportService {
    /// A service using `client`.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Start exporting a report in the given format. Once the export is
    /// ready its bytes are copied into `output`, and the result resolves to
    /// the number of bytes written.
    pub fn export_report<W: Write>(
        &self,
        report: &ReportRequest,
        format: ExportFormat,
        output: W,
    ) -> Result<FutureResult<ExportHandler<W>>, Error> {
        let submitted = self
            .client
            .send(SubmitExport { report, format })
            .map_err(|e| EXPORT.wrap(e))?;

        debug!(report = report.uri(), %format, poll = %submitted.uri, "export submitted");
        Ok(FutureResult::new(
            self.client.clone(),
            ExportHandler::new(submitted.uri, output, EXPORT),
        ))
    }

    /// Start exporting the raw (unformatted CSV) data behind a report.
    pub fn export_raw<W: Write>(
        &self,
        project_id: &str,
        report: &ReportRequest,
        output: W,
    ) -> Result<FutureResult<ExportHandler<W>>, Error> {
        let submitted = self
            .client
            .send(SubmitRawExport { project_id, report })
            .map_err(|e| RAW.wrap(e))?;

        debug!(project_id, report = report.uri(), poll = %submitted.uri, "raw export submitted");
        Ok(FutureResult::new(
            self.client.clone(),
            ExportHandler::new(submitted.uri, output, RAW),
        ))
    }
}

/// Polls an export link and copies the exported file into a writer.
pub struct ExportHandler<W> {
    uri: String,
    output: W,
    failures: FailureTable,
}

impl<W> fmt::Debug for ExportHandler<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExportHandler")
            .field("uri", &self.uri)
            .field("operation", &self.failures.operation())
            .finish_non_exhaustive()
    }
}

impl<W: Write> ExportHandler<W> {
    fn new(uri: String, output: W, failures: FailureTable) -> Self {
        Self {
            uri,
            output,
            failures,
        }
    }

    /// Take back the writer, e.g. to inspect what was written.
    pub fn into_output(self) -> W {
        self.output
    }
}

impl<W: Write> PollHandler for ExportHandler<W> {
    type Output = u64;

    const ACCEPT: &'static str = "*/*";

    fn polling_uri(&self) -> &str {
        &self.uri
    }

    fn handle_poll_result(
        &mut self,
        _client: &Client,
        response: http::Response<Vec<u8>>,
    ) -> Result<PollStep<u64>, Error> {
        if response.status() == http::StatusCode::NO_CONTENT {
            return Err(self.failures.error_for_status(response.status()));
        }

        let body = response.into_body();
        self.output.write_all(&body)?;
        self.output.flush()?;

        Ok(PollStep::Ready(body.len() as u64))
    }

    fn handle_poll_error(&mut self, error: ApiError) -> Error {
        self.failures.error(error)
    }
}

impl<W: Write> FutureResult<ExportHandler<W>> {
    /// Block until the export is written, then hand back the writer.
    pub fn into_output(mut self) -> Result<W, Error> {
        self.get()?;
        Ok(self.into_handler().into_output())
    }
}
