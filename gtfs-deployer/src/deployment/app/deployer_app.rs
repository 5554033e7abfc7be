use clap::Parser;

use super::DeployerOperation;

/// command line tool for curating regional transit feeds and planning
/// graph deployments
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct DeployerApp {
    #[command(subcommand)]
    pub op: DeployerOperation,
}
