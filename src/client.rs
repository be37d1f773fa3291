use std::{
    fmt,
    io::Read as _,
    sync::{Arc, PoisonError, RwLock},
};

use http::{HeaderMap, HeaderName, HeaderValue};
use tracing::{debug, warn};

use crate::{ApiRequest, ApiResponse, Error, Profile, TransportError, api::ApiError};

/// The header carrying a super-secured token.
pub const SST_HEADER: HeaderName = HeaderName::from_static("x-gdc-authsst");
/// The header carrying a temporary token.
pub const TT_HEADER: HeaderName = HeaderName::from_static("x-gdc-authtt");

/// Performs one HTTP exchange.
///
/// Implementations must return `Ok` for any response the server sent,
/// whatever its status, and `Err` only when no response was received.
/// Implementations are shared between threads.
pub trait Transport: Send + Sync {
    /// Send the request and read the full response body.
    fn execute(
        &self,
        request: http::Request<Vec<u8>>,
    ) -> Result<http::Response<Vec<u8>>, TransportError>;
}

/// A blocking [Transport] backed by [ureq].
pub struct UreqTransport {
    agent: ureq::Agent,
    retries: u32,
}

impl fmt::Debug for UreqTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UreqTransport")
            .field("retries", &self.retries)
            .finish()
    }
}

impl UreqTransport {
    /// Build a transport using the timeout and retry settings of `profile`.
    pub fn new(profile: &Profile) -> Self {
        let agent = ureq::Agent::new_with_config(
            ureq::config::Config::builder()
                .http_status_as_error(false)
                .timeout_global(Some(profile.timeout))
                .build(),
        );

        Self {
            agent,
            retries: profile.retries,
        }
    }

    fn execute_once(
        &self,
        request: http::Request<Vec<u8>>,
    ) -> Result<http::Response<Vec<u8>>, ureq::Error> {
        let resp = self.agent.run(request)?;
        let (parts, body) = resp.into_parts();

        let mut buf = Vec::new();
        body.into_reader().read_to_end(&mut buf)?;
        Ok(http::Response::from_parts(parts, buf))
    }
}

impl Transport for UreqTransport {
    fn execute(
        &self,
        request: http::Request<Vec<u8>>,
    ) -> Result<http::Response<Vec<u8>>, TransportError> {
        if !request.method().is_idempotent() || self.retries == 0 {
            return self.execute_once(request).map_err(Into::into);
        }

        let (parts, body) = request.into_parts();
        let mut attempt = 0;
        loop {
            match self.execute_once(rebuild(&parts, &body)) {
                Ok(resp) => return Ok(resp),
                Err(e) if attempt < self.retries => {
                    attempt += 1;
                    warn!(
                        uri = %parts.uri,
                        attempt,
                        error = %e,
                        "Request failed with transport error, retrying"
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

fn rebuild(parts: &http::request::Parts, body: &[u8]) -> http::Request<Vec<u8>> {
    let mut req = http::Request::new(body.to_vec());
    *req.method_mut() = parts.method.clone();
    *req.uri_mut() = parts.uri.clone();
    *req.version_mut() = parts.version;
    *req.headers_mut() = parts.headers.clone();
    req
}

/// The credential headers shared by every request made through one
/// [Client].
///
/// Any number of threads may read the session while one updates it.
#[derive(Clone, Default)]
pub struct Session {
    headers: Arc<RwLock<HeaderMap>>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<_> = self
            .headers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .map(HeaderName::to_string)
            .collect();
        f.debug_struct("Session").field("headers", &names).finish()
    }
}

impl Session {
    /// An empty session.
    pub fn new() -> Self {
        Self::default()
    }

    /// A session seeded from the profile's token, if it has one.
    pub fn from_profile(profile: &Profile) -> Self {
        let session = Self::new();
        if let Some(sst) = &profile.sst {
            match HeaderValue::from_str(sst) {
                Ok(value) => session.set(SST_HEADER, value),
                Err(_) => warn!(profile = %profile.name, "ignoring a token that is not a valid header value"),
            }
        }

        session
    }

    /// Set (or replace) a credential header.
    pub fn set(&self, name: HeaderName, mut value: HeaderValue) {
        value.set_sensitive(true);
        self.headers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name, value);
    }

    /// Remove a credential header.
    pub fn remove(&self, name: &HeaderName) -> Option<HeaderValue> {
        self.headers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name)
    }

    /// The current value of a credential header.
    pub fn get(&self, name: &HeaderName) -> Option<HeaderValue> {
        self.headers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    fn apply(&self, headers: &mut HeaderMap) {
        let session = self.headers.read().unwrap_or_else(PoisonError::into_inner);
        for (name, value) in session.iter() {
            headers.insert(name.clone(), value.clone());
        }
    }
}

struct Inner {
    transport: Box<dyn Transport>,
    profile: Profile,
    session: Session,
}

/// The shared HTTP-call helper every service is built on.
///
/// Cloning is cheap; all clones share the transport and the session.
#[derive(Clone)]
pub struct Client {
    inner: Arc<Inner>,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("profile", &self.inner.profile)
            .field("session", &self.inner.session)
            .finish()
    }
}

impl Client {
    /// A client using [UreqTransport].
    pub fn new(profile: Profile) -> Self {
        let transport = UreqTransport::new(&profile);
        Self::with_transport(profile, transport)
    }

    /// A client using a custom transport.
    pub fn with_transport(profile: Profile, transport: impl Transport + 'static) -> Self {
        let session = Session::from_profile(&profile);
        Self::with_session(profile, transport, session)
    }

    /// A client using a custom transport and an existing session.
    pub fn with_session(
        profile: Profile,
        transport: impl Transport + 'static,
        session: Session,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                transport: Box::new(transport),
                profile,
                session,
            }),
        }
    }

    /// The profile the client was built from.
    pub fn profile(&self) -> &Profile {
        &self.inner.profile
    }

    /// The credential session.
    pub fn session(&self) -> &Session {
        &self.inner.session
    }

    /// Send a request and decode its typed response. Non-success statuses
    /// come back as [Error::Api].
    pub fn send<R: ApiRequest>(&self, req: R) -> Result<R::Response, Error> {
        let resp = self.execute(req)?;
        Ok(R::Response::from_response(resp.map(std::io::Cursor::new))?)
    }

    /// Send a request and return the raw response, whatever its status.
    pub fn execute<R: ApiRequest>(&self, req: R) -> Result<http::Response<Vec<u8>>, Error> {
        let mut req = req.into_request(&self.inner.profile)?;
        if same_origin(req.uri(), &self.inner.profile.endpoint) {
            self.inner.session.apply(req.headers_mut());
        } else {
            debug!(uri = %req.uri(), "not sending credentials to a foreign host");
        }

        debug!(method = %req.method(), uri = %req.uri(), "sending request");
        let resp = self.inner.transport.execute(req)?;
        debug!(status = %resp.status(), "received response");

        Ok(resp)
    }

    /// GET a URI handed out by the server and return the raw response.
    pub fn follow(&self, uri: &str, accept: &'static str) -> Result<http::Response<Vec<u8>>, Error> {
        self.execute(Raw { uri, accept })
    }
}

/// Credentials only go to the configured endpoint's scheme and authority.
fn same_origin(uri: &http::Uri, endpoint: &http::Uri) -> bool {
    uri.scheme() == endpoint.scheme() && uri.authority() == endpoint.authority()
}

struct Raw<'a> {
    uri: &'a str,
    accept: &'static str,
}

impl ApiRequest for Raw<'_> {
    type Response = ();

    fn path(&self) -> String {
        self.uri.to_owned()
    }

    fn accept(&self) -> &'static str {
        self.accept
    }
}

/// Decode a raw response that is already known to be a success.
pub(crate) fn decode_body<T: ApiResponse>(resp: http::Response<Vec<u8>>) -> Result<T, Error> {
    Ok(T::from_response(resp.map(std::io::Cursor::new))?)
}

/// The error carried by a raw response that is known to have failed.
pub(crate) fn error_of(resp: http::Response<Vec<u8>>) -> ApiError {
    let (parts, body) = resp.into_parts();
    ApiError::from_error_parts(&parts, &body[..])
}

#[cfg(test)]
mod test {
    use assert_matches::assert_matches;

    use super::*;
    use crate::api::{
        self,
        testutil::{MockTransport, test_profile},
    };

    #[test]
    fn session_headers_applied() -> anyhow::Result<()> {
        let mock = MockTransport::new();
        mock.push(204, "");

        let client = Client::with_transport(test_profile().with_sst("s3cr3t")?, mock.clone());
        client.session().set(TT_HEADER, HeaderValue::from_static("tt"));
        client.send(api::Remove { uri: "/gdc/x" })?;

        let req = mock.request(0);
        assert_eq!(req.method(), http::Method::DELETE);
        assert_eq!(req.headers()[SST_HEADER], "s3cr3t");
        assert_eq!(req.headers()[TT_HEADER], "tt");

        Ok(())
    }

    #[test]
    fn credentials_stay_on_the_endpoint() -> anyhow::Result<()> {
        let mock = MockTransport::new();
        mock.push(200, "").push(200, "").push(200, "");

        let client = Client::with_transport(test_profile().with_sst("s3cr3t")?, mock.clone());
        client.follow("https://secure.example.com/gdc/poll/1", "*/*")?;
        client.follow("https://downloads.example.net/gdc/poll/1", "*/*")?;
        client.follow("http://secure.example.com/gdc/poll/1", "*/*")?;

        assert_eq!(mock.request(0).headers()[SST_HEADER], "s3cr3t");
        assert!(mock.request(1).headers().get(SST_HEADER).is_none());
        assert!(mock.request(2).headers().get(SST_HEADER).is_none());

        Ok(())
    }

    #[test]
    fn session_shared_between_clones() {
        let client = Client::with_transport(test_profile(), MockTransport::new());
        let other = client.clone();

        other.session().set(TT_HEADER, HeaderValue::from_static("a"));
        assert_eq!(client.session().get(&TT_HEADER).unwrap(), "a");

        client.session().remove(&TT_HEADER);
        assert!(other.session().get(&TT_HEADER).is_none());
    }

    #[test]
    fn transport_failure() {
        let mock = MockTransport::new();
        mock.push_failure("connection refused");

        let client = Client::with_transport(test_profile(), mock);
        assert_matches!(client.send(api::Remove { uri: "/gdc/x" }), Err(Error::Transport(_)));
    }

    #[test]
    fn rebuild_copies_everything() {
        let req = http::Request::builder()
            .method(http::Method::PUT)
            .uri("https://example.com/a")
            .header("x-a", "1")
            .body(b"body".to_vec())
            .unwrap();
        let (parts, body) = req.into_parts();

        let copy = rebuild(&parts, &body);
        assert_eq!(copy.method(), http::Method::PUT);
        assert_eq!(copy.uri(), "https://example.com/a");
        assert_eq!(copy.headers()["x-a"], "1");
        assert_eq!(copy.body(), b"body");
    }
}
