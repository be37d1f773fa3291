use crate::{
    Client, Error, FailureTable, Operation, ResourceKind,
    output_stage::{GetOutputStage, OUTPUT_STAGE, OutputStage, UpdateOutputStage},
};

const UPDATE: FailureTable = FailureTable::new(
    Operation::UpdateOutputStage,
    &[(400, "Unable to update output stage: invalid settings")],
    "Unable to update output stage",
);

/// Reads and changes a project's output stage.
#[derive(Debug, Clone)]
pub struct OutputStageService {
    client: Client,
}

impl OutputStageService {
    /// A service using `client`.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// The output stage of a project.
    pub fn get(&self, project_id: &str) -> Result<OutputStage, Error> {
        self.client
            .send(GetOutputStage { project_id })
            .map_err(|e| e.or_not_found(ResourceKind::OutputStage, OUTPUT_STAGE.expand(&[project_id])))
    }

    /// Store changed settings of an output stage loaded from the server, and
    /// return it as stored.
    pub fn update(&self, output_stage: &OutputStage) -> Result<OutputStage, Error> {
        let uri = output_stage.uri().ok_or(Error::MissingUri {
            kind: ResourceKind::OutputStage,
        })?;

        self.client
            .send(UpdateOutputStage { uri, output_stage })
            .map_err(|e| UPDATE.wrap(e.or_not_found(ResourceKind::OutputStage, uri)))
    }
}
