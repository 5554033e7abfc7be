use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use clap::{value_parser, Subcommand};

use crate::deployment::{
    dispatch, generate_due_plans, DeployerSettings, DeploymentError, DeploymentPlan,
    JsonRebuildStore, MemoryRebuildStore, RebuildStore,
};
use crate::registry::{TransitDataset, TransitRegistry};

#[derive(Debug, Clone, Subcommand)]
pub enum DeployerOperation {
    /// build deployment plans for one region, or for every region in the
    /// dataset, and print them as JSON
    Build {
        /// JSON transit dataset describing feeds, agencies and regions
        #[arg(long)]
        dataset: String,
        /// region to plan for; omit to plan every region
        #[arg(long)]
        region: Option<i64>,
        /// reference date for the plan, defaults to today
        #[arg(long, value_parser = value_parser!(NaiveDate))]
        date: Option<NaiveDate>,
        /// override the configured plan window, in days
        #[arg(long)]
        window: Option<i64>,
        /// path to the persistent rebuild store; when omitted, rebuild
        /// records are kept in memory and discarded on exit
        #[arg(long)]
        rebuild_store: Option<String>,
        /// dispatch each plan to this deployer URL after building
        #[arg(long)]
        send_to: Option<String>,
        /// TOML settings file
        #[arg(long)]
        settings: Option<String>,
    },
    /// list the regions with a scheduled rebuild due on or before a date
    Due {
        #[arg(long)]
        rebuild_store: String,
        /// defaults to now
        #[arg(long, value_parser = value_parser!(NaiveDate))]
        date: Option<NaiveDate>,
    },
    /// build and dispatch plans for every region due for a rebuild. intended
    /// to run from cron.
    Generate {
        #[arg(long)]
        dataset: String,
        #[arg(long)]
        rebuild_store: String,
        /// defaults to now
        #[arg(long, value_parser = value_parser!(NaiveDate))]
        date: Option<NaiveDate>,
        /// TOML settings file
        #[arg(long)]
        settings: Option<String>,
    },
}

impl DeployerOperation {
    pub fn run(&self) -> Result<(), DeploymentError> {
        match self {
            DeployerOperation::Build {
                dataset,
                region,
                date,
                window,
                rebuild_store,
                send_to,
                settings,
            } => {
                let settings = load_settings(settings.as_deref())?;
                let registry = load_registry(dataset)?;
                let store = open_store(rebuild_store.as_deref())?;
                let reference = reference_instant(date);
                let window_days = window.unwrap_or(settings.plan_window_days);
                let region_ids = match region {
                    Some(id) => vec![*id],
                    None => registry.region_ids(),
                };
                for region_id in region_ids {
                    let plan = DeploymentPlan::build(
                        &registry,
                        store.as_ref(),
                        region_id,
                        reference,
                        window_days,
                    )?;
                    let body = dispatch::to_wire_json(&plan)?;
                    println!("{}", serde_json::to_string_pretty(&body)?);
                    if let Some(endpoint) = send_to {
                        if registry.region(region_id)?.disabled {
                            log::info!(
                                "region {region_id} is disabled, not dispatching its plan"
                            );
                        } else {
                            dispatch::send_plan(&plan, endpoint, settings.dispatch_timeout())?;
                        }
                    }
                }
                Ok(())
            }
            DeployerOperation::Due {
                rebuild_store,
                date,
            } => {
                let store = JsonRebuildStore::open(rebuild_store)?;
                let due = store.due_regions(reference_instant(date))?;
                for region_id in due {
                    println!("{region_id}");
                }
                Ok(())
            }
            DeployerOperation::Generate {
                dataset,
                rebuild_store,
                date,
                settings,
            } => {
                let settings = load_settings(settings.as_deref())?;
                let registry = load_registry(dataset)?;
                let store = JsonRebuildStore::open(rebuild_store)?;
                let results =
                    generate_due_plans(&registry, &store, reference_instant(date), &settings)?;
                let total = results.len();
                let failed = results.iter().filter(|(_, r)| r.is_err()).count();
                if failed > 0 {
                    return Err(DeploymentError::RegionBuildFailures { failed, total });
                }
                log::info!("generated {total} plans");
                Ok(())
            }
        }
    }
}

fn load_settings(path: Option<&str>) -> Result<DeployerSettings, DeploymentError> {
    match path {
        Some(p) => DeployerSettings::from_file(Path::new(p)),
        None => Ok(DeployerSettings::default()),
    }
}

fn load_registry(dataset: &str) -> Result<TransitRegistry, DeploymentError> {
    let registry = TransitDataset::from_file(dataset)?.into_registry()?;
    Ok(registry)
}

fn open_store(path: Option<&str>) -> Result<Box<dyn RebuildStore>, DeploymentError> {
    match path {
        Some(p) => Ok(Box::new(JsonRebuildStore::open(p)?)),
        None => Ok(Box::new(MemoryRebuildStore::new())),
    }
}

/// plans are day-granular; a bare date maps to midnight UTC.
fn reference_instant(date: &Option<NaiveDate>) -> DateTime<Utc> {
    match date {
        Some(d) => d.and_time(NaiveTime::MIN).and_utc(),
        None => Utc::now(),
    }
}
