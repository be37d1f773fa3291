use tracing::debug;

use crate::{
    Client, Error, FailureTable, FutureResult, Operation, ResourceKind, TaskStatusHandler,
    dataset::{DatasetManifest, GetManifest, SubmitPull},
};

const LOAD: FailureTable = FailureTable::new(
    Operation::DatasetLoad,
    &[(400, "Unable to load dataset: invalid upload")],
    "Unable to load dataset",
);

/// Loads uploaded data into project datasets.
#[derive(Debug, Clone)]
pub struct DatasetService {
    client: Client,
}

impl DatasetService {
    /// A service using `client`.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Start loading the data already uploaded to `dir` (a directory in the
    /// project's staging area, holding the CSV files and an
    /// `upload_info.json`). The result resolves once the load task finishes.
    pub fn load_dataset(&self, project_id: &str, dir: &str) -> Result<FutureResult<TaskStatusHandler>, Error> {
        let task = self
            .client
            .send(SubmitPull { project_id, dir })
            .map_err(|e| LOAD.wrap(e))?;

        debug!(project_id, dir, poll = task.poll_uri(), "dataset load submitted");
        Ok(FutureResult::new(
            self.client.clone(),
            TaskStatusHandler::new(task.poll_uri(), LOAD),
        ))
    }

    /// The manifest describing how CSV columns map onto a dataset.
    pub fn get_manifest(&self, project_id: &str, dataset: &str) -> Result<DatasetManifest, Error> {
        self.client
            .send(GetManifest {
                project_id,
                dataset,
            })
            .map_err(|e| e.or_not_found(ResourceKind::Dataset, dataset))
    }
}

#[cfg(test)]
mod test {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;
    use crate::api::{TaskState, testutil::test_client};

    const POLL: &str = "/gdc/md/p1/etl/task/1";

    #[test]
    fn load_until_ok() -> anyhow::Result<()> {
        let (client, mock) = test_client();
        mock.push_json(201, json!({"pull2Task": {"links": {"poll": POLL}}}))
            .push(202, "")
            .push_json(200, json!({"wTaskStatus": {"status": "RUNNING"}}))
            .push_json(200, json!({"wTaskStatus": {"status": "OK"}}));

        let status = DatasetService::new(client)
            .load_dataset("p1", "upload-1")?
            .wait()?;

        assert_eq!(status.status, TaskState::Ok);
        assert_eq!(mock.request_count(), 4);
        assert_eq!(mock.path(3), POLL);

        Ok(())
    }

    #[test]
    fn load_fails_with_messages() -> anyhow::Result<()> {
        let (client, mock) = test_client();
        mock.push_json(201, json!({"pull2Task": {"links": {"poll": POLL}}}))
            .push_json(200, json!({"wTaskStatus": {"status": "ERROR", "messages": [
                {"error": {"message": "Manifest %s is missing", "parameters": ["upload_info.json"]}}
            ]}}));

        let err = DatasetService::new(client)
            .load_dataset("p1", "upload-1")?
            .wait()
            .unwrap_err();

        assert_matches!(err, Error::Operation { operation: Operation::DatasetLoad, status: None, .. });
        assert_eq!(err.to_string(), "Unable to load dataset: Manifest upload_info.json is missing");

        Ok(())
    }

    #[test]
    fn missing_manifest() {
        let (client, mock) = test_client();
        mock.push(404, "");

        assert_matches!(
            DatasetService::new(client).get_manifest("p1", "dataset.nope"),
            Err(Error::NotFound { kind: ResourceKind::Dataset, ref uri, .. }) if uri == "dataset.nope"
        );
        assert_eq!(
            mock.path(0),
            "/gdc/md/p1/ldm/singleloadinterface/dataset.nope/manifest"
        );
    }
}
