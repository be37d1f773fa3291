//! API operations concerning report execution and export.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::api::{ApiRequest, DataResponse, Envelope, UriResponse, UriTemplate, wrapped};

/// Export an executed report to a file format.
pub const EXPORTER: &str = "/gdc/exporter/executor";
/// Export a report's raw data as CSV.
pub const RAW_EXPORT: UriTemplate = UriTemplate::new("/gdc/app/projects/{projectId}/execute/raw");
/// Execute a report and compute its data.
pub const EXECUTOR: &str = "/gdc/xtab2/executor3";

/// What to execute: a saved report or a bare report definition.
///
/// Serialized as `{"report_req": {"report": "..."}}` or
/// `{"report_req": {"reportDefinition": "..."}}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReportRequest {
    /// The URI of a report.
    Report(String),
    /// The URI of a report definition.
    ReportDefinition(String),
}

wrapped!(ReportRequest => "report_req");

impl ReportRequest {
    /// The URI of the executed object.
    pub fn uri(&self) -> &str {
        match self {
            ReportRequest::Report(uri) | ReportRequest::ReportDefinition(uri) => uri,
        }
    }
}

/// The file formats reports export to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Portable document format.
    Pdf,
    /// Legacy Excel.
    Xls,
    /// Excel.
    Xlsx,
    /// Comma-separated values.
    Csv,
    /// An image of the report.
    Png,
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ExportFormat::Pdf => "pdf",
            ExportFormat::Xls => "xls",
            ExportFormat::Xlsx => "xlsx",
            ExportFormat::Csv => "csv",
            ExportFormat::Png => "png",
        })
    }
}

impl ExportFormat {
    /// The media type of exported files.
    pub fn media_type(&self) -> &'static str {
        match self {
            ExportFormat::Pdf => "application/pdf",
            ExportFormat::Xls => "application/vnd.ms-excel",
            ExportFormat::Xlsx => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
            ExportFormat::Csv => "text/csv",
            ExportFormat::Png => "image/png",
        }
    }
}

/// An export job, `{"result_req": {"format": "csv", "result": {"report_req": ...}}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportRequest {
    /// The output format.
    pub format: ExportFormat,
    /// What to export.
    pub result: Envelope<ReportRequest>,
}

wrapped!(ExportRequest => "result_req");

/// Submit an export. The response links to the file, which is polled until
/// it is ready.
#[derive(Debug, Clone)]
pub struct SubmitExport<'a> {
    /// What to export.
    pub report: &'a ReportRequest,
    /// The output format.
    pub format: ExportFormat,
}

impl ApiRequest for SubmitExport<'_> {
    type Response = UriResponse;

    fn method(&self) -> http::Method {
        http::Method::POST
    }

    fn path(&self) -> String {
        EXPORTER.to_owned()
    }

    fn body(&self) -> Option<impl Serialize> {
        Some(Envelope(ExportRequest {
            format: self.format,
            result: Envelope(self.report.clone()),
        }))
    }
}

/// Submit a raw CSV export of a report's data.
#[derive(Debug, Clone)]
pub struct SubmitRawExport<'a> {
    /// The project owning the report.
    pub project_id: &'a str,
    /// What to export.
    pub report: &'a ReportRequest,
}

impl ApiRequest for SubmitRawExport<'_> {
    type Response = UriResponse;

    fn method(&self) -> http::Method {
        http::Method::POST
    }

    fn path(&self) -> String {
        RAW_EXPORT.expand(&[self.project_id])
    }

    fn body(&self) -> Option<impl Serialize> {
        Some(Envelope(self.report))
    }
}

/// Returned when a report execution is submitted,
/// `{"execResult": {"dataResult": "..."}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecResult {
    /// The link to poll for the computed data.
    pub data_result: String,
}

wrapped!(ExecResult => "execResult");
impl DataResponse for ExecResult {}

/// Submit a report execution.
#[derive(Debug, Clone)]
pub struct ExecuteReport<'a> {
    /// What to execute.
    pub report: &'a ReportRequest,
}

impl ApiRequest for ExecuteReport<'_> {
    type Response = ExecResult;

    fn method(&self) -> http::Method {
        http::Method::POST
    }

    fn path(&self) -> String {
        EXECUTOR.to_owned()
    }

    fn body(&self) -> Option<impl Serialize> {
        Some(Envelope(self.report))
    }
}
