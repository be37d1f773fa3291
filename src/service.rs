//! Services grouping the platform's REST operations by area.
//!
//! Every service holds a clone of one shared [Client]. Synchronous
//! operations return their result directly; asynchronous ones submit the job
//! and return a [FutureResult](crate::FutureResult) to block on.

use crate::{Client, Profile, Transport, config};

mod account;
mod afm;
mod connector;
mod dataset;
mod export;
mod lcm;
mod model;
mod notification;
mod output_stage;
mod process;
mod project;
mod project_config;
mod report;
mod template;

pub use account::AccountService;
pub use afm::ExecuteAfmService;
pub use connector::{ConnectorProcessHandler, ConnectorService};
pub use dataset::DatasetService;
pub use export::{ExportHandler, ExportService};
pub use lcm::LcmService;
pub use model::{ModelService, ModelUpdateHandler};
pub use notification::NotificationService;
pub use output_stage::OutputStageService;
pub use process::{ProcessExecutionHandler, ProcessService};
pub use project::{ProjectCreationHandler, ProjectService};
pub use project_config::HierarchicalConfigService;
pub use report::{ReportDataHandler, ReportService};
pub use template::ProjectTemplateService;

/// The entry point: one client, and every service built on it.
///
/// ```no_run
/// use gooddata::{GoodData, Profile};
///
/// # fn main() -> anyhow::Result<()> {
/// let gd = GoodData::new(Profile::from_default_env()?);
/// let account = gd.accounts().get_current()?;
/// println!("Logged in as {:?}", account.login);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct GoodData {
    client: Client,
}

impl GoodData {
    /// Connect with the default transport.
    pub fn new(profile: Profile) -> Self {
        Self::with_client(Client::new(profile))
    }

    /// Connect with the profile selected by the environment.
    pub fn from_default_env() -> Result<Self, config::Error> {
        Ok(Self::new(Profile::from_default_env()?))
    }

    /// Connect through a custom transport.
    pub fn with_transport(profile: Profile, transport: impl Transport + 'static) -> Self {
        Self::with_client(Client::with_transport(profile, transport))
    }

    /// Use an existing client.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// The shared client.
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Account operations.
    pub fn accounts(&self) -> AccountService {
        AccountService::new(self.client.clone())
    }

    /// Project operations.
    pub fn projects(&self) -> ProjectService {
        ProjectService::new(self.client.clone())
    }

    /// Logical data model operations.
    pub fn model(&self) -> ModelService {
        ModelService::new(self.client.clone())
    }

    /// Report exports.
    pub fn exports(&self) -> ExportService {
        ExportService::new(self.client.clone())
    }

    /// AFM executions.
    pub fn afm(&self) -> ExecuteAfmService {
        ExecuteAfmService::new(self.client.clone())
    }

    /// Report executions.
    pub fn reports(&self) -> ReportService {
        ReportService::new(self.client.clone())
    }

    /// Dataset loads.
    pub fn datasets(&self) -> DatasetService {
        DatasetService::new(self.client.clone())
    }

    /// Data load processes.
    pub fn processes(&self) -> ProcessService {
        ProcessService::new(self.client.clone())
    }

    /// Connector integrations.
    pub fn connectors(&self) -> ConnectorService {
        ConnectorService::new(self.client.clone())
    }

    /// Output stage settings.
    pub fn output_stage(&self) -> OutputStageService {
        OutputStageService::new(self.client.clone())
    }

    /// Project notifications.
    pub fn notifications(&self) -> NotificationService {
        NotificationService::new(self.client.clone())
    }

    /// Hierarchical configuration.
    pub fn config(&self) -> HierarchicalConfigService {
        HierarchicalConfigService::new(self.client.clone())
    }

    /// Life-cycle management entities.
    pub fn lcm(&self) -> LcmService {
        LcmService::new(self.client.clone())
    }

    /// Project templates.
    pub fn templates(&self) -> ProjectTemplateService {
        ProjectTemplateService::new(self.client.clone())
    }
}
