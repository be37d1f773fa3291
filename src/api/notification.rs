//! API operations concerning project notifications.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::api::{ApiRequest, Envelope, UriTemplate, wrapped};

/// Events raised on a project; subscriptions on the project deliver them.
pub const EVENTS: UriTemplate = UriTemplate::new("/gdc/projects/{projectId}/notifications/events");

/// A custom event, `{"projectEvent": {"type": "...", "parameters": {...}}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectEvent {
    /// The event type subscriptions match on.
    #[serde(rename = "type")]
    pub event_type: String,
    /// Values made available to notification templates.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: BTreeMap<String, String>,
}

wrapped!(ProjectEvent => "projectEvent");

impl ProjectEvent {
    /// An event of `event_type` with no parameters.
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            parameters: BTreeMap::new(),
        }
    }

    /// Add a parameter.
    pub fn parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }
}

/// Raise an event on a project. Answers 204.
#[derive(Debug, Clone)]
pub struct RaiseEvent<'a> {
    /// The project.
    pub project_id: &'a str,
    /// The event.
    pub event: &'a ProjectEvent,
}

impl ApiRequest for RaiseEvent<'_> {
    type Response = ();

    fn method(&self) -> http::Method {
        http::Method::POST
    }

    fn path(&self) -> String {
        EVENTS.expand(&[self.project_id])
    }

    fn body(&self) -> Option<impl Serialize> {
        Some(Envelope(self.event))
    }
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::*;

    #[test]
    fn event_body() -> anyhow::Result<()> {
        let event = ProjectEvent::new("etl.finished").parameter("process", "Load sales");
        let req = RaiseEvent {
            project_id: "p1",
            event: &event,
        }
        .into_request(&crate::Profile::new("https://secure.example.com")?)?;

        assert_eq!(req.method(), http::Method::POST);
        assert_eq!(req.uri().path(), "/gdc/projects/p1/notifications/events");
        assert_eq!(
            serde_json::from_slice::<serde_json::Value>(req.body())?,
            json!({"projectEvent": {"type": "etl.finished", "parameters": {"process": "Load sales"}}})
        );

        Ok(())
    }
}
