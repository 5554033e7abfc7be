use clap::Parser;
use gtfs_deployer::deployment::app::DeployerApp;

fn main() {
    env_logger::init();
    let args = DeployerApp::parse();
    match args.op.run() {
        Ok(_) => log::info!("finished."),
        Err(e) => {
            log::error!("failed running gtfs_deployer: {e}");
            std::process::exit(1);
        }
    }
}
