use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::model::BikesAllowed;

/// one feed version selected into a deployment plan.
///
/// plan membership is keyed by `feed_id` alone; `default_agency_id` is a
/// per-lineage label (`"<agencyName>-<lineageHeadId>"`) carried for the graph
/// builder but deliberately excluded from the dedup key, so a combined feed
/// reached through several agencies is still served exactly once. the plan
/// set is therefore a map from feed id to descriptor rather than a set with
/// custom equality.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedDescriptor {
    pub feed_id: String,
    /// calendar date in the feed's own time zone after which this version
    /// should no longer be served.
    pub expire_on: NaiveDate,
    pub default_agency_id: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub realtime_urls: Vec<String>,
    pub default_bikes_allowed: BikesAllowed,
}
