//! Polling of asynchronous platform operations.
//!
//! Submitting a long-running job (a model diff, a report export, a data
//! load) returns a poll link. A [PollHandler] knows how to read each answer
//! to a GET on that link, and a [FutureResult] drives the handler until the
//! job reaches a terminal state.
//!
//! By convention `202 Accepted` means the job is still running. Any other
//! status ends polling: a success status is handed to
//! [PollHandler::handle_poll_result], anything else to
//! [PollHandler::handle_poll_error].

use std::{fmt, marker::PhantomData, thread, time};

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::{
    Client, Error, FailureTable,
    api::{ApiError, ApiResponse, TaskStatus},
    client::{decode_body, error_of},
};

/// What a handler decided after reading one finished poll response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollStep<T> {
    /// Not done yet; wait the poll interval and poll again.
    Continue,
    /// Poll again right away, at the handler's current URI. Handlers use
    /// this after moving the URI, or to have a pending submission made.
    Follow,
    /// Done.
    Ready(T),
}

/// Interprets the responses to polling one asynchronous operation.
pub trait PollHandler {
    /// The result of the operation.
    type Output;

    /// The media type to ask for when polling.
    const ACCEPT: &'static str = "application/json";

    /// The URI to GET next. Stable unless the handler moves it.
    fn polling_uri(&self) -> &str;

    /// Whether `response` ends this round of polling. Only the status may be
    /// looked at: `202 Accepted` means poll again.
    fn is_finished(&self, response: &http::Response<Vec<u8>>) -> bool {
        response.status() != http::StatusCode::ACCEPTED
    }

    /// Read a finished response with a success status.
    fn handle_poll_result(
        &mut self,
        client: &Client,
        response: http::Response<Vec<u8>>,
    ) -> Result<PollStep<Self::Output>, Error>;

    /// Turn a finished response with a failure status into the error the
    /// caller sees.
    fn handle_poll_error(&mut self, error: ApiError) -> Error;

    /// Whether the handler holds work to submit before its next poll, such as
    /// the next stage of a chained operation.
    fn has_pending_submission(&self) -> bool {
        false
    }

    /// Submit the pending work. Called only when
    /// [PollHandler::has_pending_submission] is true.
    fn submit(&mut self, _client: &Client) -> Result<(), Error> {
        Ok(())
    }
}

/// The handle for an operation the platform runs asynchronously.
///
/// Nothing happens until it is asked for its result. [FutureResult::get]
/// blocks the calling thread, polling at the client's configured interval,
/// until the operation reaches a terminal state. Once resolved, the result
/// (or the error) is cached and no further requests are made.
///
/// Every accessor takes `&mut self`, so one future is driven by one caller at
/// a time. Giving up with [FutureResult::get_timeout] only stops the client
/// from waiting; the server-side job keeps running.
pub struct FutureResult<H: PollHandler> {
    client: Client,
    handler: H,
    interval: time::Duration,
    polls: u32,
    outcome: Option<Result<H::Output, Error>>,
}

impl<H> fmt::Debug for FutureResult<H>
where
    H: PollHandler + fmt::Debug,
    H::Output: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FutureResult")
            .field("handler", &self.handler)
            .field("interval", &self.interval)
            .field("polls", &self.polls)
            .field("outcome", &self.outcome)
            .finish()
    }
}

impl<H: PollHandler> FutureResult<H> {
    /// Wrap a handler, polling at the interval configured on the client.
    pub fn new(client: Client, handler: H) -> Self {
        let interval = client.profile().poll_interval;
        Self {
            client,
            handler,
            interval,
            polls: 0,
            outcome: None,
        }
    }

    /// Override the interval between polls.
    pub fn with_interval(self, interval: time::Duration) -> Self {
        Self { interval, ..self }
    }

    /// The URI that will be polled next.
    pub fn polling_uri(&self) -> &str {
        self.handler.polling_uri()
    }

    /// How many poll requests were made so far.
    pub fn polls(&self) -> u32 {
        self.polls
    }

    /// The handler driving this future.
    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// Give up the future and take its handler.
    pub fn into_handler(self) -> H {
        self.handler
    }

    /// Block until the operation finishes, then return its result.
    pub fn get(&mut self) -> Result<&H::Output, Error> {
        self.get_until(None)
    }

    /// Like [FutureResult::get], but give up with [Error::Timeout] if the
    /// operation has not finished within `timeout`. The future stays usable
    /// after a timeout.
    pub fn get_timeout(&mut self, timeout: time::Duration) -> Result<&H::Output, Error> {
        self.get_until(Some(timeout))
    }

    /// Whether the operation has reached a terminal state. Polls at most
    /// once, and never waits.
    ///
    /// Only ever issues the poll GET. A chained operation whose next stage is
    /// waiting to be submitted stays not done until [FutureResult::get] (or
    /// one of its siblings) moves it on.
    pub fn is_done(&mut self) -> bool {
        if self.outcome.is_none() && !self.handler.has_pending_submission() {
            self.poll_once();
        }

        self.outcome.is_some()
    }

    /// Block until the operation finishes and take its result.
    pub fn wait(mut self) -> Result<H::Output, Error> {
        self.get_until(None)?;
        match self.outcome {
            Some(outcome) => outcome,
            None => unreachable!("resolved future has no outcome"),
        }
    }

    fn get_until(&mut self, timeout: Option<time::Duration>) -> Result<&H::Output, Error> {
        let started = time::Instant::now();

        while self.outcome.is_none() {
            self.remaining(started, timeout)?;

            if self.handler.has_pending_submission() {
                self.submit();
                continue;
            }

            if self.poll_once() || self.outcome.is_some() {
                continue;
            }

            let pause = match self.remaining(started, timeout)? {
                Some(left) => self.interval.min(left),
                None => self.interval,
            };

            thread::sleep(pause);
        }

        match &self.outcome {
            Some(outcome) => outcome.as_ref().map_err(Clone::clone),
            None => unreachable!("resolved future has no outcome"),
        }
    }

    /// How much of `timeout` is left, or [Error::Timeout] once it has run
    /// out. Checked before every request.
    fn remaining(
        &self,
        started: time::Instant,
        timeout: Option<time::Duration>,
    ) -> Result<Option<time::Duration>, Error> {
        let Some(timeout) = timeout else {
            return Ok(None);
        };

        let waited = started.elapsed();
        if waited >= timeout {
            return Err(Error::Timeout {
                uri: self.handler.polling_uri().to_owned(),
                waited,
            });
        }

        Ok(Some(timeout - waited))
    }

    fn submit(&mut self) {
        if let Err(e) = self.handler.submit(&self.client) {
            debug!(uri = %self.handler.polling_uri(), error = %e, "submission failed");
            self.outcome = Some(Err(e));
        }
    }

    /// Issue one poll. Returns whether to poll again without waiting.
    fn poll_once(&mut self) -> bool {
        self.polls += 1;
        let uri = self.handler.polling_uri().to_owned();

        let response = match self.client.follow(&uri, H::ACCEPT) {
            Ok(r) => r,
            Err(e) => {
                self.outcome = Some(Err(e));
                return false;
            }
        };

        debug!(%uri, attempt = self.polls, status = %response.status(), "polled");
        if !self.handler.is_finished(&response) {
            return false;
        }

        let step = if response.status().is_success() {
            self.handler.handle_poll_result(&self.client, response)
        } else {
            Err(self.handler.handle_poll_error(error_of(response)))
        };

        match step {
            Ok(PollStep::Continue) => false,
            Ok(PollStep::Follow) => {
                debug!(from = %uri, to = %self.handler.polling_uri(), "polling again");
                true
            }
            Ok(PollStep::Ready(value)) => {
                debug!(%uri, polls = self.polls, "operation finished");
                self.outcome = Some(Ok(value));
                false
            }
            Err(e) => {
                debug!(%uri, polls = self.polls, error = %e, "operation failed");
                self.outcome = Some(Err(e));
                false
            }
        }
    }
}

/// Polls a link until it answers 200 with a wrapped `T`.
pub struct ResultHandler<T> {
    uri: String,
    failures: FailureTable,
    _result: PhantomData<fn() -> T>,
}

impl<T> fmt::Debug for ResultHandler<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultHandler")
            .field("uri", &self.uri)
            .field("operation", &self.failures.operation())
            .finish()
    }
}

impl<T> ResultHandler<T> {
    /// Poll `uri`, reporting failures through `failures`.
    pub fn new(uri: impl Into<String>, failures: FailureTable) -> Self {
        Self {
            uri: uri.into(),
            failures,
            _result: PhantomData,
        }
    }
}

impl<T: ApiResponse> PollHandler for ResultHandler<T> {
    type Output = T;

    fn polling_uri(&self) -> &str {
        &self.uri
    }

    fn handle_poll_result(
        &mut self,
        _client: &Client,
        response: http::Response<Vec<u8>>,
    ) -> Result<PollStep<T>, Error> {
        if response.status() == http::StatusCode::NO_CONTENT {
            return Err(self.failures.error_for_status(response.status()));
        }

        decode_body(response).map(PollStep::Ready)
    }

    fn handle_poll_error(&mut self, error: ApiError) -> Error {
        self.failures.error(error)
    }
}

/// Polls a task status link (`{"wTaskStatus": ...}`) until the task leaves
/// the `RUNNING` state.
#[derive(Debug)]
pub struct TaskStatusHandler {
    uri: String,
    failures: FailureTable,
}

impl TaskStatusHandler {
    /// Poll the status link `uri`.
    pub fn new(uri: impl Into<String>, failures: FailureTable) -> Self {
        Self {
            uri: uri.into(),
            failures,
        }
    }

    /// Interpret one decoded status: keep going, succeed, or fail.
    pub(crate) fn step(failures: &FailureTable, status: TaskStatus) -> Result<PollStep<TaskStatus>, Error> {
        if !status.is_finished() {
            Ok(PollStep::Continue)
        } else if status.is_success() {
            Ok(PollStep::Ready(status))
        } else {
            Err(failures.failed(&status.describe()))
        }
    }
}

impl PollHandler for TaskStatusHandler {
    type Output = TaskStatus;

    fn polling_uri(&self) -> &str {
        &self.uri
    }

    fn handle_poll_result(
        &mut self,
        _client: &Client,
        response: http::Response<Vec<u8>>,
    ) -> Result<PollStep<TaskStatus>, Error> {
        let status: TaskStatus = decode_body(response)?;
        Self::step(&self.failures, status)
    }

    fn handle_poll_error(&mut self, error: ApiError) -> Error {
        self.failures.error(error)
    }
}

/// Decode a raw JSON body of any shape, for handlers whose results are not
/// wrapped.
pub(crate) fn decode_json<T: DeserializeOwned>(
    response: http::Response<Vec<u8>>,
) -> Result<T, Error> {
    let status = response.status();
    let de = &mut serde_json::Deserializer::from_slice(response.body());
    serde_path_to_error::deserialize(de).map_err(|e| ApiError::invalid(status, e).into())
}
