use std::{collections::BTreeMap, fmt, io::Read, marker::PhantomData};

use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::Profile;

pub mod account;
pub mod afm;
pub mod connector;
pub mod dataset;
mod envelope;
mod error;
pub mod export;
pub mod lcm;
pub mod model;
pub mod notification;
pub mod output_stage;
mod paginate;
pub mod process;
pub mod project_config;
pub mod project;
pub mod template;
mod uri;

#[cfg(test)]
pub(crate) mod testutil;

pub use envelope::{Envelope, Wrapped, bool_string, decode, encode};
pub(crate) use envelope::wrapped;
pub use error::*;
pub use paginate::*;
pub use uri::UriTemplate;

/// Implemented by types that can be sent as requests to the platform.
pub trait ApiRequest: Sized {
    /// The corresponding response type.
    type Response: ApiResponse;

    /// The path (or absolute URI) that the request should target.
    fn path(&self) -> String;

    /// The method to use.
    fn method(&self) -> http::Method {
        http::Method::GET
    }

    /// The serializable request body.
    fn body(&self) -> Option<impl Serialize> {
        None::<&()>
    }

    /// The serializable query string.
    fn query(&self) -> Option<impl Serialize> {
        None::<&()>
    }

    /// The media type to ask for.
    fn accept(&self) -> &'static str {
        "application/json"
    }

    /// Consume the request and return an [http::Request] suitable for passing
    /// to your favorite HTTP client.
    fn into_request(self, profile: &Profile) -> Result<http::Request<Vec<u8>>, http::Error> {
        let mut path = self.path();
        if let Some(query) = self.query() {
            path = with_query(path, &query);
        }

        let req = http::Request::builder()
            .method(self.method())
            .uri(resolve(&profile.endpoint, &path)?)
            .header(http::header::ACCEPT, self.accept())
            .header(http::header::USER_AGENT, &profile.user_agent);

        if let Some(body) = self.body() {
            let body = serde_json::to_vec(&body).expect("JSON serialization should be infallible");
            req.header(http::header::CONTENT_TYPE, "application/json")
                .header(http::header::CONTENT_LENGTH, body.len())
                .body(body)
        } else {
            req.body(Vec::new())
        }
    }
}

/// Append the serialized `query` to `path`, if it serializes to anything.
pub(crate) fn with_query(mut path: String, query: &impl Serialize) -> String {
    let qs = serde_qs::to_string(query).expect("query string serialization should be infallible");
    if !qs.is_empty() {
        path.push(if path.contains('?') { '&' } else { '?' });
        path.push_str(&qs);
    }

    path
}

/// Resolve a server-relative path against the endpoint. Absolute URIs are
/// returned unchanged.
pub(crate) fn resolve(endpoint: &http::Uri, path: &str) -> Result<http::Uri, http::Error> {
    let target: http::Uri = path.parse()?;
    if target.scheme().is_some() {
        return Ok(target);
    }

    let mut parts = endpoint.clone().into_parts();
    parts.path_and_query = target.into_parts().path_and_query;
    Ok(http::Uri::from_parts(parts)?)
}

/// Implemented by types that can be read as responses from the platform.
pub trait ApiResponse: Sized {
    /// Read the response from an [http::Response] object.
    fn from_response(resp: http::Response<impl Read>) -> Result<Self, ApiError> {
        let (parts, body) = resp.into_parts();
        Self::from_response_parts(parts, body)
    }

    /// Read the response from pre-parsed parts.
    fn from_response_parts(parts: http::response::Parts, body: impl Read)
    -> Result<Self, ApiError>;
}

/// A private trait for types that deserialize from a wrapped body.
pub(crate) trait DataResponse: Wrapped + DeserializeOwned {}

impl<T: DataResponse> ApiResponse for T {
    fn from_response_parts(
        parts: http::response::Parts,
        body: impl Read,
    ) -> Result<Self, ApiError> {
        if !parts.status.is_success() {
            return Err(ApiError::from_error_parts(&parts, body));
        }

        decode(body).map_err(|e| ApiError::invalid(parts.status, e))
    }
}

// For calls that answer with an empty body (usually 204).
impl ApiResponse for () {
    fn from_response_parts(
        parts: http::response::Parts,
        body: impl Read,
    ) -> Result<Self, ApiError> {
        if parts.status.is_success() {
            Ok(())
        } else {
            Err(ApiError::from_error_parts(&parts, body))
        }
    }
}

/// A bare `{"uri": "..."}` body, returned when the platform creates a
/// resource or accepts an asynchronous job. This is the only envelope that
/// is not wrapped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UriResponse {
    /// The created resource, or the link to poll.
    pub uri: String,
}

impl ApiResponse for UriResponse {
    fn from_response_parts(
        parts: http::response::Parts,
        body: impl Read,
    ) -> Result<Self, ApiError> {
        if !parts.status.is_success() {
            return Err(ApiError::from_error_parts(&parts, body));
        }

        let de = &mut serde_json::Deserializer::from_reader(body);
        serde_path_to_error::deserialize(de).map_err(|e| ApiError::invalid(parts.status, e))
    }
}

/// Returned on submission of an asynchronous job:
/// `{"asyncTask": {"link": {"poll": "..."}}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AsyncTask {
    /// The links of the task.
    pub link: AsyncTaskLink,
}

/// The links of an [AsyncTask].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AsyncTaskLink {
    /// The URI to poll.
    pub poll: String,
}

wrapped!(AsyncTask => "asyncTask");
impl DataResponse for AsyncTask {}

impl AsyncTask {
    /// The URI to poll.
    pub fn poll_uri(&self) -> &str {
        &self.link.poll
    }
}

/// The state carried by a [TaskStatus].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TaskState {
    /// Finished successfully.
    Ok,
    /// Finished successfully, with warnings.
    Warning,
    /// Still running.
    Running,
    /// Failed.
    Error,
    /// A state this client does not know about. Treated as failed.
    Other(String),
}

impl From<String> for TaskState {
    fn from(s: String) -> Self {
        match s.as_str() {
            "OK" => TaskState::Ok,
            "WARNING" => TaskState::Warning,
            "RUNNING" => TaskState::Running,
            "ERROR" => TaskState::Error,
            _ => TaskState::Other(s),
        }
    }
}

impl From<TaskState> for String {
    fn from(s: TaskState) -> Self {
        s.to_string()
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TaskState::Ok => "OK",
            TaskState::Warning => "WARNING",
            TaskState::Running => "RUNNING",
            TaskState::Error => "ERROR",
            TaskState::Other(s) => s,
        })
    }
}

/// Returned by polling a task link:
/// `{"wTaskStatus": {"status": "OK", "links": {"poll": "..."}, "messages": []}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskStatus {
    /// The task state.
    pub status: TaskState,
    /// Links of the task.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<TaskStatusLinks>,
    /// Messages keyed by severity (e.g. `{"error": {...}}`).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub messages: Vec<BTreeMap<String, RestError>>,
}

/// Links of a [TaskStatus].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskStatusLinks {
    /// The task's own poll link, echoed back.
    pub poll: String,
}

wrapped!(TaskStatus => "wTaskStatus");
impl DataResponse for TaskStatus {}

impl TaskStatus {
    /// Whether the task has reached a terminal state.
    pub fn is_finished(&self) -> bool {
        self.status != TaskState::Running
    }

    /// Whether the task finished successfully.
    pub fn is_success(&self) -> bool {
        matches!(self.status, TaskState::Ok | TaskState::Warning)
    }

    /// The poll link echoed back by the server, if any.
    pub fn poll_uri(&self) -> Option<&str> {
        self.links.as_ref().map(|l| l.poll.as_str())
    }

    /// All messages, formatted and joined by newlines.
    pub fn describe(&self) -> String {
        self.messages
            .iter()
            .flat_map(|m| m.values())
            .map(RestError::formatted_message)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// One entry of a `{"entries": [...]}` link list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkEntry {
    /// The linked URI.
    pub link: String,
    /// What the link points at, e.g. `tasks-status`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

/// A flat `{"entries": [...]}` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkEntries {
    /// The links.
    pub entries: Vec<LinkEntry>,
}

impl LinkEntries {
    /// The first link of the given category.
    pub fn by_category(&self, category: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.category.as_deref() == Some(category))
            .map(|e| e.link.as_str())
    }
}

impl ApiResponse for LinkEntries {
    fn from_response_parts(
        parts: http::response::Parts,
        body: impl Read,
    ) -> Result<Self, ApiError> {
        if !parts.status.is_success() {
            return Err(ApiError::from_error_parts(&parts, body));
        }

        let de = &mut serde_json::Deserializer::from_reader(body);
        serde_path_to_error::deserialize(de).map_err(|e| ApiError::invalid(parts.status, e))
    }
}

/// Fetch whatever lives at a URI handed out by the server.
pub struct Follow<'a, T> {
    /// The URI to GET.
    pub uri: &'a str,
    _response: PhantomData<fn() -> T>,
}

impl<'a, T> Follow<'a, T> {
    /// Follow `uri`, decoding the body as `T`.
    pub fn new(uri: &'a str) -> Self {
        Self {
            uri,
            _response: PhantomData,
        }
    }
}

impl<T> fmt::Debug for Follow<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Follow").field("uri", &self.uri).finish()
    }
}

impl<T> Clone for Follow<'_, T> {
    fn clone(&self) -> Self {
        Self::new(self.uri)
    }
}

impl<T: ApiResponse> ApiRequest for Follow<'_, T> {
    type Response = T;

    fn path(&self) -> String {
        self.uri.to_owned()
    }
}

/// Delete the resource at a URI handed out by the server.
#[derive(Debug, Clone)]
pub struct Remove<'a> {
    /// The URI to DELETE.
    pub uri: &'a str,
}

impl ApiRequest for Remove<'_> {
    type Response = ();

    fn method(&self) -> http::Method {
        http::Method::DELETE
    }

    fn path(&self) -> String {
        self.uri.to_owned()
    }
}

/// A `{"uri": "..."}`-style reference to another object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjRef {
    /// The referenced object.
    pub uri: String,
}

#[cfg(test)]
mod test {
    use assert_matches::assert_matches;

    use super::*;

    fn profile() -> Profile {
        Profile::new("https://secure.example.com").unwrap()
    }

    #[derive(Debug, Clone, Serialize)]
    struct Body {
        value: u32,
    }

    wrapped!(Body => "body");

    struct Post;

    #[derive(Serialize)]
    struct Query {
        offset: u32,
    }

    impl ApiRequest for Post {
        type Response = ();

        fn method(&self) -> http::Method {
            http::Method::POST
        }

        fn path(&self) -> String {
            "/gdc/things?a=1".into()
        }

        fn body(&self) -> Option<impl Serialize> {
            Some(Envelope(Body { value: 3 }))
        }

        fn query(&self) -> Option<impl Serialize> {
            Some(Query { offset: 10 })
        }
    }

    #[test]
    fn builds_request() -> anyhow::Result<()> {
        let req = Post.into_request(&profile())?;

        assert_eq!(req.method(), http::Method::POST);
        assert_eq!(
            req.uri().to_string(),
            "https://secure.example.com/gdc/things?a=1&offset=10"
        );
        assert_eq!(req.headers()[http::header::CONTENT_TYPE], "application/json");
        assert_eq!(req.body(), br#"{"body":{"value":3}}"#);

        Ok(())
    }

    #[test]
    fn query_appended() {
        #[derive(Serialize)]
        struct Query {
            limit: u32,
        }

        assert_eq!(with_query("/gdc/x".into(), &Query { limit: 5 }), "/gdc/x?limit=5");
        assert_eq!(with_query("/gdc/x?offset=5".into(), &Query { limit: 5 }), "/gdc/x?offset=5&limit=5");
    }

    #[test]
    fn absolute_uris_pass_through() -> anyhow::Result<()> {
        let req = Follow::<TaskStatus>::new("https://other.example.com/gdc/poll/1")
            .into_request(&profile())?;
        assert_eq!(req.uri().host(), Some("other.example.com"));
        assert!(req.body().is_empty());

        Ok(())
    }

    #[test]
    fn task_status() -> anyhow::Result<()> {
        let body = br#"{"wTaskStatus": {
            "status": "ERROR",
            "links": {"poll": "/gdc/md/p/tasks/1/status"},
            "messages": [{"error": {"message": "Column %s missing", "parameters": ["x"]}}]
        }}"#;

        let resp = http::Response::builder().status(200).body(&body[..])?;
        let status = TaskStatus::from_response(resp)?;

        assert!(status.is_finished());
        assert!(!status.is_success());
        assert_eq!(status.poll_uri(), Some("/gdc/md/p/tasks/1/status"));
        assert_eq!(status.describe(), "Column x missing");

        Ok(())
    }

    #[test]
    fn unknown_task_state() {
        assert_eq!(
            TaskState::from("CANCELED".to_owned()),
            TaskState::Other("CANCELED".into())
        );
        assert_eq!(TaskState::Running.to_string(), "RUNNING");
    }

    #[test]
    fn malformed_success_body() {
        let resp = http::Response::builder()
            .status(200)
            .body(&br#"{"asyncTask": {"link": {"poll": 5}}}"#[..])
            .unwrap();

        assert_matches!(
            AsyncTask::from_response(resp),
            Err(ApiError::InvalidResponse { status, source })
                if status == http::StatusCode::OK && source.path().to_string() == "asyncTask.link.poll"
        );
    }
}
