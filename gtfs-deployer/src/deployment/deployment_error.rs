use crate::deployment::rebuild_scheduler::RebuildStoreError;
use crate::registry::RegistryError;

#[derive(thiserror::Error, Debug)]
pub enum DeploymentError {
    #[error("transit registry error: {0}")]
    Registry(#[from] RegistryError),
    #[error("rebuild store error: {0}")]
    Store(#[from] RebuildStoreError),
    #[error("supersession chain cycles at feed '{0}'")]
    SupersessionCycle(String),
    #[error("failure sending deployment plan: {0}")]
    DispatchSend(#[from] reqwest::Error),
    #[error("deployer rejected plan for region {region_id} with status {status}")]
    DispatchRejected { region_id: i64, status: u16 },
    #[error("failure serializing deployment plan: {0}")]
    PlanSerialization(#[from] serde_json::Error),
    #[error("failure loading deployer settings: {0}")]
    SettingsError(String),
    #[error("{failed} of {total} region builds failed")]
    RegionBuildFailures { failed: usize, total: usize },
}
