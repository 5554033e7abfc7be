use std::time::Duration;

use serde::Serialize;

use crate::deployment::deployment_error::DeploymentError;
use crate::deployment::feed_descriptor::FeedDescriptor;
use crate::deployment::plan::DeploymentPlan;
use crate::model::{BikeRentalSystem, BikeRentalSystemType};

// wire shape consumed by the graph builder
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DeploymentPlanBody<'a> {
    region_id: i64,
    region_name: &'a str,
    feeds: &'a [FeedDescriptor],
    auxiliary_resources: Vec<AuxiliaryResourceBody<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AuxiliaryResourceBody<'a> {
    name: &'a str,
    #[serde(rename = "type")]
    system_type: BikeRentalSystemType,
    url: &'a str,
    currency: &'a str,
    fare_classes: &'a [String],
}

impl<'a> From<&'a BikeRentalSystem> for AuxiliaryResourceBody<'a> {
    fn from(system: &'a BikeRentalSystem) -> AuxiliaryResourceBody<'a> {
        AuxiliaryResourceBody {
            name: &system.name,
            system_type: system.system_type,
            url: &system.url,
            currency: &system.currency,
            fare_classes: &system.fare_classes,
        }
    }
}

fn body_of(plan: &DeploymentPlan) -> DeploymentPlanBody<'_> {
    DeploymentPlanBody {
        region_id: plan.region_id,
        region_name: &plan.region_name,
        feeds: &plan.feeds,
        auxiliary_resources: plan.bike_rental_systems.iter().map(Into::into).collect(),
    }
}

/// serializes a plan to the JSON body sent to the deployer. exposed so the
/// CLI can print exactly what would be dispatched.
pub fn to_wire_json(plan: &DeploymentPlan) -> Result<serde_json::Value, DeploymentError> {
    serde_json::to_value(body_of(plan)).map_err(DeploymentError::from)
}

/// delivers a plan to the deployer endpoint as a single blocking POST. any
/// non-success response is a hard failure carrying the region id and the
/// received status; a silently dropped plan would leave the region serving
/// stale data with nothing to notice it.
pub fn send_plan(
    plan: &DeploymentPlan,
    endpoint: &str,
    timeout: Duration,
) -> Result<(), DeploymentError> {
    let client = reqwest::blocking::Client::builder()
        .timeout(timeout)
        .build()?;
    let response = client.post(endpoint).json(&body_of(plan)).send()?;
    let status = response.status();
    if !status.is_success() {
        return Err(DeploymentError::DispatchRejected {
            region_id: plan.region_id,
            status: status.as_u16(),
        });
    }
    log::info!(
        "dispatched plan for region {} ({} feeds) to {}",
        plan.region_id,
        plan.feeds.len(),
        endpoint
    );
    Ok(())
}
