pub mod app;
mod deployment_error;
pub mod dispatch;
mod feed_descriptor;
mod plan;
mod rebuild_scheduler;
mod settings;
pub mod walk_ops;

pub use deployment_error::DeploymentError;
pub use feed_descriptor::FeedDescriptor;
pub use plan::{generate_due_plans, DeploymentPlan};
pub use rebuild_scheduler::{
    JsonRebuildStore, MemoryRebuildStore, RebuildScheduler, RebuildStore, RebuildStoreError,
    ScheduledRebuild,
};
pub use settings::DeployerSettings;
