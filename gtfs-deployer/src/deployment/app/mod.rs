mod deployer_app;
mod operation;

pub use deployer_app::DeployerApp;
pub use operation::DeployerOperation;
