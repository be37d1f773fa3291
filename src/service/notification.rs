use tracing::debug;

use crate::{
    Client, Error, FailureTable, Operation,
    client::error_of,
    notification::{ProjectEvent, RaiseEvent},
};

const NOTIFY: FailureTable = FailureTable::new(
    Operation::Notification,
    &[(400, "Unable to post project event: invalid event")],
    "Unable to post project event",
);

/// Raises project events, which trigger notification channels subscribed
/// to them.
#[derive(Debug, Clone)]
pub struct NotificationService {
    client: Client,
}

impl NotificationService {
    /// A service using `client`.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Raise an event in a project. The platform acknowledges with
    /// `204 No Content`; any other answer is a failure.
    pub fn notify_project(&self, project_id: &str, event: &ProjectEvent) -> Result<(), Error> {
        let response = self.client.execute(RaiseEvent { project_id, event })?;
        let status = response.status();

        if status == http::StatusCode::NO_CONTENT {
            debug!(project_id, event = %event.event_type, "project event raised");
            Ok(())
        } else if status.is_success() {
            Err(NOTIFY.error_for_status(status))
        } else {
            Err(NOTIFY.error(error_of(response)))
        }
    }
}
