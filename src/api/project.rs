//! API operations concerning projects (workspaces).

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::api::{ApiRequest, DataResponse, Envelope, PageItem, UriResponse, UriTemplate, bool_string, wrapped};

/// All projects; POST here to create one.
pub const PROJECTS: &str = "/gdc/projects";
/// A single project.
pub const PROJECT: UriTemplate = UriTemplate::new("/gdc/projects/{id}");
/// The projects an account has access to, paged.
pub const USER_PROJECTS: UriTemplate = UriTemplate::new("/gdc/account/profile/{id}/projects");

/// The lifecycle state of a [Project].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ProjectState {
    /// Ready for use.
    Enabled,
    /// Being provisioned.
    Preparing,
    /// Provisioned, not yet enabled.
    Prepared,
    /// Loading data.
    Loading,
    /// Disabled by an administrator.
    Disabled,
    /// Archived; will not become usable again.
    Archived,
    /// Deleted.
    Deleted,
    /// A state this client does not know about.
    Other(String),
}

impl From<String> for ProjectState {
    fn from(s: String) -> Self {
        match s.as_str() {
            "ENABLED" => ProjectState::Enabled,
            "PREPARING" => ProjectState::Preparing,
            "PREPARED" => ProjectState::Prepared,
            "LOADING" => ProjectState::Loading,
            "DISABLED" => ProjectState::Disabled,
            "ARCHIVED" => ProjectState::Archived,
            "DELETED" => ProjectState::Deleted,
            _ => ProjectState::Other(s),
        }
    }
}

impl From<ProjectState> for String {
    fn from(s: ProjectState) -> Self {
        s.to_string()
    }
}

impl fmt::Display for ProjectState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ProjectState::Enabled => "ENABLED",
            ProjectState::Preparing => "PREPARING",
            ProjectState::Prepared => "PREPARED",
            ProjectState::Loading => "LOADING",
            ProjectState::Disabled => "DISABLED",
            ProjectState::Archived => "ARCHIVED",
            ProjectState::Deleted => "DELETED",
            ProjectState::Other(s) => s,
        })
    }
}

/// The database engine backing a project.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectDriver {
    /// Vertica.
    #[default]
    #[serde(rename = "vertica")]
    Vertica,
    /// PostgreSQL.
    #[serde(rename = "Pg")]
    Postgres,
}

/// A project, `{"project": {"meta": {...}, "content": {...}, "links": {...}}}`.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// Title, summary and audit fields.
    pub meta: ProjectMeta,
    /// Settings.
    pub content: ProjectContent,
    /// Server-assigned links.
    #[serde(default, skip_serializing)]
    pub links: Option<ProjectLinks>,
}

/// The metadata block of a [Project].
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectMeta {
    /// The project title.
    pub title: String,
    /// A free-form description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// The template the project was created from.
    #[serde(
        default,
        rename = "projectTemplate",
        skip_serializing_if = "Option::is_none"
    )]
    pub project_template: Option<String>,
    /// The creating account.
    #[serde(default, skip_serializing)]
    pub author: Option<String>,
    /// When the project was created.
    #[serde(default, skip_serializing)]
    pub created: Option<String>,
    /// When the project was last changed.
    #[serde(default, skip_serializing)]
    pub updated: Option<String>,
}

/// The content block of a [Project].
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectContent {
    /// The authorization token the project is billed to. Only sent on
    /// creation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authorization_token: Option<String>,
    /// The database engine.
    #[serde(default)]
    pub driver: ProjectDriver,
    /// `PRODUCTION`, `DEVELOPMENT` or `TESTING`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
    /// The lifecycle state.
    #[serde(default, skip_serializing)]
    pub state: Option<ProjectState>,
    /// Whether guided navigation is enabled.
    #[serde(default, with = "bool_string")]
    pub guided_navigation: bool,
    /// Whether the project is public.
    #[serde(default, with = "bool_string")]
    pub is_public: bool,
}

/// Links of a [Project].
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectLinks {
    /// The project itself.
    #[serde(rename = "self")]
    pub self_link: String,
    /// The project's users.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub users: Option<String>,
    /// The project's metadata root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<String>,
}

wrapped!(Project => "project");
impl DataResponse for Project {}

impl PageItem for Project {
    const PAGE_ROOT: &'static str = "projects";
}

impl Project {
    /// A new project with a title, billed to `authorization_token`.
    pub fn new(title: impl Into<String>, authorization_token: impl Into<String>) -> Self {
        Self {
            meta: ProjectMeta {
                title: title.into(),
                ..Default::default()
            },
            content: ProjectContent {
                authorization_token: Some(authorization_token.into()),
                guided_navigation: true,
                ..Default::default()
            },
            links: None,
        }
    }

    /// The URI of the project, if it came from the server.
    pub fn uri(&self) -> Option<&str> {
        self.links.as_ref().map(|l| l.self_link.as_str())
    }

    /// The project id, parsed out of its URI.
    pub fn id(&self) -> Option<String> {
        PROJECT.match_uri(self.uri()?)?.pop()
    }

    /// The lifecycle state, if known.
    pub fn state(&self) -> Option<&ProjectState> {
        self.content.state.as_ref()
    }
}

/// Load a project by URI.
#[derive(Debug, Clone)]
pub struct GetProject<'a> {
    /// The project URI, e.g. `/gdc/projects/{id}`.
    pub uri: &'a str,
}

impl ApiRequest for GetProject<'_> {
    type Response = Project;

    fn path(&self) -> String {
        self.uri.to_owned()
    }
}

/// Query parameters for listing an account's projects.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct ListProjectsQuery {
    /// The offset of the first project.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u64>,
    /// The page size.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
}

/// Start provisioning a project. The response links to the new project,
/// which has to be polled until it is enabled.
#[derive(Debug, Clone)]
pub struct CreateProject<'a> {
    /// The project to create.
    pub project: &'a Project,
}

impl ApiRequest for CreateProject<'_> {
    type Response = UriResponse;

    fn method(&self) -> http::Method {
        http::Method::POST
    }

    fn path(&self) -> String {
        PROJECTS.to_owned()
    }

    fn body(&self) -> Option<impl Serialize> {
        Some(Envelope(self.project))
    }
}
