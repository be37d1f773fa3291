//! Test utilities: a scripted transport standing in for the platform.

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, Once},
    time,
};

use crate::{Client, Profile, Transport, TransportError};

enum Scripted {
    Response(http::Response<Vec<u8>>),
    Failure(String),
}

/// A [Transport] that answers from a queue of scripted responses and records
/// every request it sees.
#[derive(Clone, Default)]
pub(crate) struct MockTransport {
    responses: Arc<Mutex<VecDeque<Scripted>>>,
    requests: Arc<Mutex<Vec<http::Request<Vec<u8>>>>>,
    latency: Arc<Mutex<time::Duration>>,
}

impl MockTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Queue a response with a raw body.
    pub(crate) fn push(&self, status: u16, body: impl Into<Vec<u8>>) -> &Self {
        self.push_with_headers(status, &[], body)
    }

    /// Queue a response with a JSON body.
    pub(crate) fn push_json(&self, status: u16, body: serde_json::Value) -> &Self {
        self.push_with_headers(
            status,
            &[("content-type", "application/json")],
            body.to_string(),
        )
    }

    pub(crate) fn push_with_headers(
        &self,
        status: u16,
        headers: &[(&str, &str)],
        body: impl Into<Vec<u8>>,
    ) -> &Self {
        let mut resp = http::Response::builder().status(status);
        for (name, value) in headers {
            resp = resp.header(*name, *value);
        }

        let resp = resp.body(body.into()).expect("invalid scripted response");
        self.responses
            .lock()
            .unwrap()
            .push_back(Scripted::Response(resp));
        self
    }

    /// Make every later request take at least `latency`.
    pub(crate) fn set_latency(&self, latency: time::Duration) -> &Self {
        *self.latency.lock().unwrap() = latency;
        self
    }

    /// The methods of every request sent so far.
    pub(crate) fn methods(&self) -> Vec<http::Method> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|req| req.method().clone())
            .collect()
    }

    /// Queue a connection-level failure.
    pub(crate) fn push_failure(&self, message: &str) -> &Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(Scripted::Failure(message.to_owned()));
        self
    }

    /// How many requests were sent.
    pub(crate) fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// The method, path and body of the nth request.
    pub(crate) fn request(&self, n: usize) -> http::Request<Vec<u8>> {
        let requests = self.requests.lock().unwrap();
        let req = &requests[n];

        let mut copy = http::Request::new(req.body().clone());
        *copy.method_mut() = req.method().clone();
        *copy.uri_mut() = req.uri().clone();
        *copy.headers_mut() = req.headers().clone();
        copy
    }

    /// The path and query of the nth request.
    pub(crate) fn path(&self, n: usize) -> String {
        self.request(n)
            .uri()
            .path_and_query()
            .map(|pq| pq.as_str().to_owned())
            .unwrap_or_default()
    }

    /// The body of the nth request, parsed as JSON.
    pub(crate) fn json_body(&self, n: usize) -> serde_json::Value {
        serde_json::from_slice(self.request(n).body()).expect("request body is not JSON")
    }
}

impl Transport for MockTransport {
    fn execute(
        &self,
        request: http::Request<Vec<u8>>,
    ) -> Result<http::Response<Vec<u8>>, TransportError> {
        let uri = request.uri().to_string();
        self.requests.lock().unwrap().push(request);

        let latency = *self.latency.lock().unwrap();
        if !latency.is_zero() {
            std::thread::sleep(latency);
        }

        match self.responses.lock().unwrap().pop_front() {
            Some(Scripted::Response(resp)) => Ok(resp),
            Some(Scripted::Failure(message)) => Err(message.into()),
            None => panic!("no scripted response left for {uri}"),
        }
    }
}

fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// A profile pointing at a fake endpoint which polls without waiting.
pub(crate) fn test_profile() -> Profile {
    init_tracing();
    Profile::new("https://secure.example.com")
        .expect("valid endpoint")
        .with_poll_interval(time::Duration::from_millis(1))
}

/// A client backed by a fresh [MockTransport].
pub(crate) fn test_client() -> (Client, MockTransport) {
    let mock = MockTransport::new();
    (Client::with_transport(test_profile(), mock.clone()), mock)
}

/// A platform error envelope.
pub(crate) fn error_body(code: &str, message: &str) -> serde_json::Value {
    serde_json::json!({
        "error": {
            "errorClass": "com.gooddata.exception.GdcException",
            "component": "Webapp",
            "errorCode": code,
            "message": message,
            "parameters": [],
            "requestId": "test:1"
        }
    })
}
