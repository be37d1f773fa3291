use tracing::debug;

use crate::{
    Client, Error, FailureTable, FutureResult, Operation, ResultHandler,
    afm::{ExecuteAfm, Execution, ExecutionResponse, ExecutionResult},
};

const EXECUTE: FailureTable = FailureTable::new(
    Operation::AfmExecution,
    &[(400, "AFM execution is not valid")],
    "Unable to execute AFM",
);

const RESULT: FailureTable = FailureTable::new(
    Operation::AfmExecution,
    &[
        (204, "Result contains no data"),
        (400, "AFM execution is not computable"),
        (410, "Result is no longer available"),
        (413, "Result is too large"),
    ],
    "Unable to get AFM execution result",
);

/// Runs AFM executions and fetches their results.
#[derive(Debug, Clone)]
pub struct ExecuteAfmService {
    client: Client,
}

impl ExecuteAfmService {
    /// A service using `client`.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Submit an execution. The response describes the result's dimensions
    /// and links to where it will be computed.
    pub fn execute(&self, project_id: &str, execution: &Execution) -> Result<ExecutionResponse, Error> {
        let response = self
            .client
            .send(ExecuteAfm {
                project_id,
                execution,
            })
            .map_err(|e| EXECUTE.wrap(e))?;

        debug!(project_id, result = response.result_uri(), "AFM executed");
        Ok(response)
    }

    /// Poll for the computed result of an execution.
    pub fn get_result(&self, response: &ExecutionResponse) -> FutureResult<ResultHandler<ExecutionResult>> {
        FutureResult::new(
            self.client.clone(),
            ResultHandler::new(response.result_uri(), RESULT),
        )
    }
}

#[cfg(test)]
mod test {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;
    use crate::{
        afm::Afm,
        api::testutil::{error_body, test_client},
    };

    fn execution() -> Execution {
        Execution {
            afm: Afm::default(),
            result_spec: Some(json!({"dimensions": []})),
        }
    }

    #[test]
    fn execute_then_poll() -> anyhow::Result<()> {
        let (client, mock) = test_client();
        mock.push(201, include_str!("../../tests/fixtures/execution_response.json"))
            .push(202, "")
            .push(200, include_str!("../../tests/fixtures/execution_result.json"));

        let service = ExecuteAfmService::new(client);
        let response = service.execute("p", &execution())?;
        let mut result = service.get_result(&response);

        assert_eq!(result.get()?.paging.total, vec![2, 1]);
        assert_eq!(mock.path(0), "/gdc/app/projects/p/executeAfm");
        assert_eq!(mock.path(2), response.result_uri());
        assert_eq!(mock.json_body(0)["execution"]["resultSpec"], json!({"dimensions": []}));

        Ok(())
    }

    #[test]
    fn result_failures() -> anyhow::Result<()> {
        for (status, message) in [
            (204, "Result contains no data"),
            (400, "AFM execution is not computable"),
            (410, "Result is no longer available"),
            (413, "Result is too large"),
            (500, "Unable to get AFM execution result"),
        ] {
            let (client, mock) = test_client();
            mock.push(201, include_str!("../../tests/fixtures/execution_response.json"));
            if status == 204 {
                mock.push(status, "");
            } else {
                mock.push_json(status, error_body("gdc.afm", "failed"));
            }

            let service = ExecuteAfmService::new(client);
            let mut result = service.get_result(&service.execute("p", &execution())?);
            let err = result.get().unwrap_err();

            assert_eq!(err.to_string(), message);
            assert_eq!(err.status().map(|s| s.as_u16()), Some(status));
        }

        Ok(())
    }

    #[test]
    fn rejected_execution() {
        let (client, mock) = test_client();
        mock.push_json(400, error_body("gdc.afm.invalid", "Unknown attribute"));

        assert_matches!(
            ExecuteAfmService::new(client).execute("p", &execution()),
            Err(Error::Operation { operation: Operation::AfmExecution, ref message, .. })
                if message == "AFM execution is not valid"
        );
    }
}
