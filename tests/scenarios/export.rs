use serde_json::json;

use crate::gooddata;
use gooddata::export::{ExportFormat, ReportRequest};

#[test]
fn export_bytes_written_verbatim() -> anyhow::Result<()> {
    let (gd, server) = gooddata();
    let bytes: Vec<u8> = (0..=255).collect();
    server
        .then_json(201, json!({"uri": "/gdc/exporter/result/p1/xyz"}))
        .then(202, "")
        .then(200, bytes.clone());

    let report = ReportRequest::Report("/gdc/md/p1/obj/42".into());
    let export = gd.exports().export_report(&report, ExportFormat::Xlsx, Vec::new())?;
    let written = export.into_output()?;

    assert_eq!(written, bytes);
    assert_eq!(server.count(), 3);

    Ok(())
}
