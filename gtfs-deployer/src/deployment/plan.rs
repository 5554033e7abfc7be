use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use itertools::Itertools;
use rayon::prelude::*;

use crate::deployment::deployment_error::DeploymentError;
use crate::deployment::feed_descriptor::FeedDescriptor;
use crate::deployment::rebuild_scheduler::{RebuildScheduler, RebuildStore};
use crate::deployment::settings::DeployerSettings;
use crate::deployment::{dispatch, walk_ops};
use crate::model::BikeRentalSystem;
use crate::registry::TransitRegistry;

/// everything the downstream graph builder needs to serve one region over
/// the plan window: the deduplicated feed versions with their effective
/// expirations, plus the region's bike rental systems.
#[derive(Debug, Clone, PartialEq)]
pub struct DeploymentPlan {
    pub region_id: i64,
    pub region_name: String,
    pub feeds: Vec<FeedDescriptor>,
    pub bike_rental_systems: Vec<BikeRentalSystem>,
}

impl DeploymentPlan {
    /// builds the plan for one region at the given reference date, covering
    /// `window_days` days forward.
    ///
    /// clears the region's scheduled rebuilds first; any still applicable
    /// are recreated by the walk, so after a successful build the persisted
    /// records are exactly the ones implied by this plan. a store failure
    /// mid-build propagates and the caller should retry the whole build
    /// rather than dispatch a plan whose schedule state is inconsistent.
    pub fn build(
        registry: &TransitRegistry,
        store: &dyn RebuildStore,
        region_id: i64,
        reference: DateTime<Utc>,
        window_days: i64,
    ) -> Result<DeploymentPlan, DeploymentError> {
        let region = registry.region(region_id)?;
        let scheduler = RebuildScheduler::new(registry, store);
        scheduler.clear(region_id)?;

        let window_end = reference + Duration::days(window_days);
        let mut plan_feeds: BTreeMap<String, FeedDescriptor> = BTreeMap::new();
        for agency_id in &region.agencies {
            let agency = registry.agency(agency_id)?;
            if agency.disabled {
                log::debug!("skipping disabled agency '{}'", agency.id);
                continue;
            }
            for head in registry.lineage_heads(agency) {
                let label = format!("{}-{}", agency.name, head.stored_id);
                walk_ops::walk_lineage(
                    registry,
                    &scheduler,
                    head,
                    &label,
                    reference,
                    window_end,
                    window_days,
                    &mut plan_feeds,
                )?;
            }
        }

        log::info!(
            "built plan for region {} ('{}'): {} feeds",
            region_id,
            region.name,
            plan_feeds.len()
        );
        Ok(DeploymentPlan {
            region_id,
            region_name: region.name.clone(),
            feeds: plan_feeds.into_values().collect_vec(),
            bike_rental_systems: region.bike_rental_systems.clone(),
        })
    }
}

/// builds (and optionally dispatches) plans for every region with a rebuild
/// record due at `now`. regions are built in parallel; each region's outcome
/// is reported individually so one failed build or rejected dispatch never
/// aborts the others. plans for disabled regions are computed but not
/// dispatched.
pub fn generate_due_plans(
    registry: &TransitRegistry,
    store: &dyn RebuildStore,
    now: DateTime<Utc>,
    settings: &DeployerSettings,
) -> Result<Vec<(i64, Result<DeploymentPlan, DeploymentError>)>, DeploymentError> {
    let due = store.due_regions(now)?;
    log::info!("{} regions due for a plan rebuild", due.len());
    let results = due
        .into_iter()
        .collect_vec()
        .into_par_iter()
        .map(|region_id| {
            let result = DeploymentPlan::build(
                registry,
                store,
                region_id,
                now,
                settings.plan_window_days,
            )
            .and_then(|plan| {
                if let Some(endpoint) = &settings.deployer_url {
                    let region = registry.region(region_id)?;
                    if region.disabled {
                        log::info!(
                            "region {} is disabled, not dispatching its plan",
                            region_id
                        );
                    } else {
                        dispatch::send_plan(&plan, endpoint, settings.dispatch_timeout())?;
                    }
                }
                Ok(plan)
            });
            if let Err(e) = &result {
                log::error!("plan generation failed for region {region_id}: {e}");
            }
            (region_id, result)
        })
        .collect();
    Ok(results)
}
