use std::collections::VecDeque;

use tracing::debug;

use crate::{
    Client, Error, FailureTable, FutureResult, Operation, PollHandler, PollStep, ResultHandler,
    TaskStatusHandler,
    api::{ApiError, TaskStatus},
    client::decode_body,
    model::{DiffModel, DiffRequest, ExecuteMaql, ModelDiff, TASKS_STATUS},
};

const DIFF: FailureTable = FailureTable::new(
    Operation::ModelDiff,
    &[],
    "Unable to get project model diff",
);

const UPDATE: FailureTable = FailureTable::new(
    Operation::ModelUpdate,
    &[(400, "Unable to update project model: invalid MAQL")],
    "Unable to update project model",
);

/// Compares and changes the logical data model of projects.
#[derive(Debug, Clone)]
pub struct ModelService {
    client: Client,
}

impl ModelService {
    /// A service using `client`.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Start computing what it takes to turn the project's model into the
    /// target model.
    pub fn diff(
        &self,
        project_id: &str,
        request: &DiffRequest,
    ) -> Result<FutureResult<ResultHandler<ModelDiff>>, Error> {
        let task = self
            .client
            .send(DiffModel {
                project_id,
                request,
            })
            .map_err(|e| DIFF.wrap(e))?;

        debug!(project_id, poll = task.poll_uri(), "model diff submitted");
        Ok(FutureResult::new(
            self.client.clone(),
            ResultHandler::new(task.poll_uri(), DIFF),
        ))
    }

    /// Apply a diff, running its MAQL statements in order.
    pub fn update_model(
        &self,
        project_id: &str,
        diff: &ModelDiff,
    ) -> Result<FutureResult<ModelUpdateHandler>, Error> {
        self.execute_maql(project_id, diff.update_maql())
    }

    /// Run MAQL DDL statements against a project, one after the other. Each
    /// statement is submitted once the previous one has finished; the first
    /// failure ends the chain.
    pub fn execute_maql<I, S>(
        &self,
        project_id: &str,
        statements: I,
    ) -> Result<FutureResult<ModelUpdateHandler>, Error>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut remaining: VecDeque<String> = statements.into_iter().map(Into::into).collect();
        let Some(first) = remaining.pop_front() else {
            return Err(UPDATE.failed("no MAQL statements to execute"));
        };

        let uri = submit_maql(&self.client, project_id, &first)?;
        Ok(FutureResult::new(
            self.client.clone(),
            ModelUpdateHandler {
                project_id: project_id.to_owned(),
                uri,
                next: None,
                remaining,
                executed: 0,
            },
        ))
    }
}

fn submit_maql(client: &Client, project_id: &str, maql: &str) -> Result<String, Error> {
    let links = client
        .send(ExecuteMaql { project_id, maql })
        .map_err(|e| UPDATE.wrap(e))?;

    let uri = links
        .by_category(TASKS_STATUS)
        .ok_or_else(|| UPDATE.failed("no task status link in the response"))?;

    debug!(project_id, poll = uri, "MAQL submitted");
    Ok(uri.to_owned())
}

/// Polls a chain of MAQL statements, submitting each one after the previous
/// has succeeded. Resolves to the number of statements executed.
///
/// A statement is submitted before the poll that follows its predecessor's
/// success, never while reading a poll response.
#[derive(Debug)]
pub struct ModelUpdateHandler {
    project_id: String,
    uri: String,
    next: Option<String>,
    remaining: VecDeque<String>,
    executed: usize,
}

impl ModelUpdateHandler {
    /// How many statements have finished so far.
    pub fn executed(&self) -> usize {
        self.executed
    }
}

impl PollHandler for ModelUpdateHandler {
    type Output = usize;

    fn polling_uri(&self) -> &str {
        &self.uri
    }

    fn handle_poll_result(
        &mut self,
        _client: &Client,
        response: http::Response<Vec<u8>>,
    ) -> Result<PollStep<usize>, Error> {
        let status: TaskStatus = decode_body(response)?;
        match TaskStatusHandler::step(&UPDATE, status)? {
            PollStep::Ready(_) => self.executed += 1,
            PollStep::Continue => return Ok(PollStep::Continue),
            PollStep::Follow => return Ok(PollStep::Follow),
        }

        match self.remaining.pop_front() {
            None => Ok(PollStep::Ready(self.executed)),
            Some(next) => {
                self.next = Some(next);
                Ok(PollStep::Follow)
            }
        }
    }

    fn handle_poll_error(&mut self, error: ApiError) -> Error {
        UPDATE.error(error)
    }

    fn has_pending_submission(&self) -> bool {
        self.next.is_some()
    }

    fn submit(&mut self, client: &Client) -> Result<(), Error> {
        if let Some(next) = self.next.take() {
            self.uri = submit_maql(client, &self.project_id, &next)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use std::time;

    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;
    use crate::api::testutil::{error_body, test_client};

    fn tasks_status(n: u32) -> serde_json::Value {
        json!({"entries": [
            {"link": format!("/gdc/md/p1/tasks/{n}/status"), "category": "tasks-status"}
        ]})
    }

    #[test]
    fn diff_polls_the_task() -> anyhow::Result<()> {
        let (client, mock) = test_client();
        mock.push_json(202, json!({"asyncTask": {"link": {"poll": "/gdc/projects/p1/model/diff/1"}}}))
            .push(202, "")
            .push(200, include_str!("../../tests/fixtures/model_diff.json"));

        let mut diff = ModelService::new(client).diff("p1", &DiffRequest::new(json!({})))?;
        assert_eq!(mock.request_count(), 1);
        assert_eq!(diff.get()?.update_maql().len(), 2);
        assert_eq!(mock.path(2), "/gdc/projects/p1/model/diff/1");

        Ok(())
    }

    #[test]
    fn diff_submission_fails_immediately() {
        let (client, mock) = test_client();
        mock.push_json(400, error_body("gdc.model.invalid", "Invalid model"));

        assert_matches!(
            ModelService::new(client).diff("p1", &DiffRequest::new(json!({}))),
            Err(Error::Operation { operation: Operation::ModelDiff, .. })
        );
    }

    #[test]
    fn statements_run_in_order() -> anyhow::Result<()> {
        let (client, mock) = test_client();
        mock.push_json(200, tasks_status(1))
            .push_json(200, json!({"wTaskStatus": {"status": "RUNNING"}}))
            .push_json(200, json!({"wTaskStatus": {"status": "OK"}}))
            .push_json(200, tasks_status(2))
            .push_json(200, json!({"wTaskStatus": {"status": "WARNING"}}));

        let service = ModelService::new(client);
        let mut update = service.execute_maql("p1", ["CREATE A;", "CREATE B;"])?;
        assert_eq!(*update.get()?, 2);

        let paths: Vec<_> = (0..5).map(|n| mock.path(n)).collect();
        assert_eq!(
            paths,
            vec![
                "/gdc/md/p1/ldm/manage2",
                "/gdc/md/p1/tasks/1/status",
                "/gdc/md/p1/tasks/1/status",
                "/gdc/md/p1/ldm/manage2",
                "/gdc/md/p1/tasks/2/status",
            ]
        );
        assert_eq!(mock.json_body(0), json!({"manage": {"maql": "CREATE A;"}}));
        assert_eq!(mock.json_body(3), json!({"manage": {"maql": "CREATE B;"}}));

        Ok(())
    }

    #[test]
    fn failed_statement_ends_chain() -> anyhow::Result<()> {
        let (client, mock) = test_client();
        mock.push_json(200, tasks_status(1)).push_json(
            200,
            json!({"wTaskStatus": {"status": "ERROR", "messages": [
                {"error": {"message": "Object %s not found", "parameters": ["attr.x"]}}
            ]}}),
        );

        let mut update = ModelService::new(client).execute_maql("p1", ["DROP A;", "DROP B;"])?;
        let err = update.get().unwrap_err();

        assert_eq!(err.to_string(), "Unable to update project model: Object attr.x not found");
        assert_eq!(update.handler().executed(), 0);
        assert_eq!(mock.request_count(), 2);

        Ok(())
    }

    fn status(state: &str) -> serde_json::Value {
        json!({"wTaskStatus": {"status": state}})
    }

    #[test]
    fn peek_never_submits() -> anyhow::Result<()> {
        let (client, mock) = test_client();
        mock.push_json(200, tasks_status(1)).push_json(200, status("OK"));

        let mut update = ModelService::new(client).execute_maql("p1", ["CREATE A;", "CREATE B;"])?;
        assert!(!update.is_done());
        assert_eq!(mock.methods(), [http::Method::POST, http::Method::GET]);
        assert_eq!(update.handler().executed(), 1);

        // The second statement waits for a blocking call.
        assert!(!update.is_done());
        assert_eq!(mock.request_count(), 2);

        mock.push_json(200, tasks_status(2)).push_json(200, status("OK"));
        assert_eq!(*update.get()?, 2);
        assert_eq!(mock.path(2), "/gdc/md/p1/ldm/manage2");
        assert_eq!(mock.path(3), "/gdc/md/p1/tasks/2/status");
        assert!(update.is_done());
        assert_eq!(mock.request_count(), 4);

        Ok(())
    }

    #[test]
    fn timeout_stops_the_chain() -> anyhow::Result<()> {
        let (client, mock) = test_client();
        let statements: Vec<_> = (1..=10).map(|n| format!("CREATE M{n};")).collect();
        for n in 1..=10 {
            mock.push_json(200, tasks_status(n)).push_json(200, status("OK"));
        }

        let mut update = ModelService::new(client).execute_maql("p1", statements)?;
        mock.set_latency(time::Duration::from_millis(20));

        let started = time::Instant::now();
        assert_matches!(
            update.get_timeout(time::Duration::from_millis(30)),
            Err(Error::Timeout { .. })
        );
        assert!(started.elapsed() < time::Duration::from_millis(500));
        assert!(mock.request_count() < 6);
        assert!(update.handler().executed() < 10);

        // Giving up did not spoil the chain.
        mock.set_latency(time::Duration::ZERO);
        assert_eq!(*update.get()?, 10);
        assert_eq!(mock.request_count(), 20);

        Ok(())
    }

    #[test]
    fn nothing_to_execute() {
        let (client, mock) = test_client();
        let result = ModelService::new(client).update_model("p1", &ModelDiff::default());

        assert_matches!(result, Err(Error::Operation { operation: Operation::ModelUpdate, .. }));
        assert_eq!(mock.request_count(), 0);
    }
}
