//! API operations concerning AFM executions.
//!
//! An AFM (analytical form model) describes a query in terms of attributes,
//! measures and filters. Submitting one returns an [ExecutionResponse] whose
//! result link is polled for the computed data.

use serde::{Deserialize, Serialize};

use crate::api::{ApiRequest, DataResponse, Envelope, ObjRef, UriTemplate, wrapped};

/// Submit an AFM execution.
pub const AFM_EXECUTION: UriTemplate = UriTemplate::new("/gdc/app/projects/{projectId}/executeAfm");

/// An attribute in an [Afm].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeItem {
    /// The identifier the result refers to the attribute by.
    pub local_identifier: String,
    /// The display form to show.
    pub display_form: ObjRef,
    /// A title overriding the display form's.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
}

/// A measure in an [Afm].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasureItem {
    /// The identifier the result refers to the measure by.
    pub local_identifier: String,
    /// How the measure is computed, passed through as JSON.
    pub definition: serde_json::Value,
    /// A title overriding the measure's.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    /// A number format.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

/// The query of an [Execution].
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Afm {
    /// Attributes to slice by.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<AttributeItem>,
    /// Measures to compute.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub measures: Vec<MeasureItem>,
    /// Filters, passed through as JSON.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<serde_json::Value>,
    /// Totals computed natively by the engine, passed through as JSON.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub native_totals: Vec<serde_json::Value>,
}

/// An AFM query with an optional result layout, `{"execution": {...}}`.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Execution {
    /// The query.
    pub afm: Afm,
    /// How to lay out the result (dimensions, sorts), passed through as JSON.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_spec: Option<serde_json::Value>,
}

wrapped!(Execution => "execution");

/// Returned on submission of an [Execution], `{"executionResponse": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResponse {
    /// The dimensions of the result, with their headers.
    #[serde(default)]
    pub dimensions: Vec<serde_json::Value>,
    /// Links to the result.
    pub links: ExecutionLinks,
}

/// Links of an [ExecutionResponse].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionLinks {
    /// The link to poll for the computed data.
    pub execution_result: String,
}

wrapped!(ExecutionResponse => "executionResponse");
impl DataResponse for ExecutionResponse {}

impl ExecutionResponse {
    /// The link to poll for the computed data.
    pub fn result_uri(&self) -> &str {
        &self.links.execution_result
    }
}

/// The computed data of an execution, `{"executionResult": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    /// The data, one nesting level per dimension.
    pub data: serde_json::Value,
    /// Where the data sits in the full result, per dimension.
    pub paging: ResultPaging,
    /// Header items per dimension.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub header_items: Vec<serde_json::Value>,
    /// Totals per dimension.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub totals: Vec<serde_json::Value>,
}

/// Paging of an [ExecutionResult], one entry per dimension.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultPaging {
    /// The number of values in this page.
    pub count: Vec<u64>,
    /// The offset of this page.
    pub offset: Vec<u64>,
    /// The number of values in the full result.
    pub total: Vec<u64>,
}

wrapped!(ExecutionResult => "executionResult");
impl DataResponse for ExecutionResult {}

/// Submit an AFM execution.
#[derive(Debug, Clone)]
pub struct ExecuteAfm<'a> {
    /// The project to query.
    pub project_id: &'a str,
    /// The query.
    pub execution: &'a Execution,
}

impl ApiRequest for ExecuteAfm<'_> {
    type Response = ExecutionResponse;

    fn method(&self) -> http::Method {
        http::Method::POST
    }

    fn path(&self) -> String {
        AFM_EXECUTION.expand(&[self.project_id])
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
    fn execution_body() -> anyhow::Result<()> {
        let execution = Execution {
            afm: Afm {
                attributes: vec![AttributeItem {
                    local_identifier: "a1".into(),
                    display_form: ObjRef {
                        uri: "/gdc/md/p/obj/10".into(),
                    },
                    alias: None,
                }],
                ..Default::default()
            },
            result_spec: None,
        };

        assert_eq!(
            serde_json::from_slice::<serde_json::Value>(&encode(&execution)?)?,
            json!({"execution": {"afm": {"attributes": [
                {"localIdentifier": "a1", "displayForm": {"uri": "/gdc/md/p/obj/10"}}
            ]}}})
        );

        Ok(())
    }

    #[test]
    fn decode_fixtures() -> anyhow::Result<()> {
        let response: ExecutionResponse =
            decode(&include_bytes!("../../tests/fixtures/execution_response.json")[..])?;
        assert_eq!(
            response.result_uri(),
            "/gdc/app/projects/p/executionResults/123?q=abc&c=def&offset=0%2C0&limit=1000%2C1000&dimensions=2&totals=0%2C0"
        );
        assert_eq!(response.dimensions.len(), 2);

        let result: ExecutionResult =
            decode(&include_bytes!("../../tests/fixtures/execution_result.json")[..])?;
        assert_eq!(result.paging.total, vec![2, 1]);
        assert_eq!(result.data, json!([["1"], ["2"]]));

        Ok(())
    }
}
