use tracing::debug;

use crate::{
    Client, Error, FailureTable, FutureResult, Operation, PollHandler, PollStep, ResourceKind,
    api::{ApiError, Follow, Page, Remove, paginate, with_query},
    client::decode_body,
    project::{
        CreateProject, GetProject, ListProjectsQuery, PROJECT, Project, ProjectState, USER_PROJECTS,
    },
    service::AccountService,
};

const CREATE: FailureTable = FailureTable::new(
    Operation::CreateProject,
    &[(400, "Unable to create project: invalid settings"), (403, "Unable to create project: invalid authorization token")],
    "Unable to create project",
);

const PAGE_SIZE: u64 = 100;

/// Reads and manages projects.
#[derive(Debug, Clone)]
pub struct ProjectService {
    client: Client,
}

impl ProjectService {
    /// A service using `client`.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// The project with the given id.
    pub fn get_by_id(&self, id: &str) -> Result<Project, Error> {
        self.get_by_uri(&PROJECT.expand(&[id]))
    }

    /// The project at the given URI.
    pub fn get_by_uri(&self, uri: &str) -> Result<Project, Error> {
        self.client
            .send(GetProject { uri })
            .map_err(|e| e.or_not_found(ResourceKind::Project, uri))
    }

    /// The projects the logged-in user has access to, fetched lazily page
    /// by page.
    pub fn list(&self) -> Result<impl Iterator<Item = Result<Project, Error>> + use<>, Error> {
        let account = AccountService::new(self.client.clone()).get_current()?;
        let id = account.id().ok_or(Error::MissingUri {
            kind: ResourceKind::Account,
        })?;

        Ok(self.list_for(&id, None))
    }

    /// The projects an account has access to, fetched lazily page by page,
    /// up to `limit` projects.
    pub fn list_for(
        &self,
        account_id: &str,
        limit: Option<usize>,
    ) -> impl Iterator<Item = Result<Project, Error>> + use<> {
        let query = ListProjectsQuery {
            offset: None,
            limit: Some(PAGE_SIZE),
        };
        let first = with_query(USER_PROJECTS.expand(&[account_id]), &query);

        let client = self.client.clone();
        paginate(first, limit, move |uri: &str| {
            client
                .send(Follow::<Page<Project>>::new(uri))
                .map_err(|e| e.or_not_found(ResourceKind::Account, uri))
        })
    }

    /// Start creating a project. The result resolves once the project is
    /// enabled.
    pub fn create(
        &self,
        project: &Project,
    ) -> Result<FutureResult<ProjectCreationHandler>, Error> {
        let created = self
            .client
            .send(CreateProject { project })
            .map_err(|e| CREATE.wrap(e))?;

        debug!(uri = %created.uri, "project creation submitted");
        Ok(FutureResult::new(
            self.client.clone(),
            ProjectCreationHandler { uri: created.uri },
        ))
    }

    /// Delete a project loaded from the server.
    pub fn remove(&self, project: &Project) -> Result<(), Error> {
        let uri = project
            .uri()
            .ok_or(Error::MissingUri {
                kind: ResourceKind::Project,
            })?;

        self.client
            .send(Remove { uri })
            .map_err(|e| e.or_not_found(ResourceKind::Project, uri))
    }
}

/// Polls a new project until it is enabled.
#[derive(Debug)]
pub struct ProjectCreationHandler {
    uri: String,
}

impl PollHandler for ProjectCreationHandler {
    type Output = Project;

    fn polling_uri(&self) -> &str {
        &self.uri
    }

    fn handle_poll_result(
        &mut self,
        _client: &Client,
        response: http::Response<Vec<u8>>,
    ) -> Result<PollStep<Project>, Error> {
        let project: Project = decode_body(response)?;
        match project.state() {
            Some(ProjectState::Enabled) => Ok(PollStep::Ready(project)),
            Some(state @ (ProjectState::Deleted | ProjectState::Archived | ProjectState::Disabled)) => {
                Err(CREATE.failed(&format!("project ended up {state}")))
            }
            _ => Ok(PollStep::Continue),
        }
    }

    fn handle_poll_error(&mut self, error: ApiError) -> Error {
        CREATE.wrap(Error::from(error).or_not_found(ResourceKind::Project, self.uri.as_str()))
    }
}
