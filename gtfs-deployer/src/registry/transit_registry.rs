use std::collections::{HashMap, HashSet};

use itertools::Itertools;

use crate::model::{Agency, FeedParseStatus, FeedVersion, Region};
use crate::registry::registry_error::RegistryError;

/// read-only lookup graph over feeds, agencies and regions.
///
/// the supersession chain is stored on each feed as a forward link only; the
/// reverse direction ("which feeds does X supersede") is materialized here as
/// an index at construction time, so chain traversal never issues repeated
/// store queries. the reverse direction may be ambiguous when several feeds
/// claim the same successor; callers choose between the resolution orderings
/// below.
pub struct TransitRegistry {
    feeds: HashMap<String, FeedVersion>,
    agencies: HashMap<String, Agency>,
    regions: HashMap<i64, Region>,
    /// successor feed id -> ids of the feeds it supersedes
    predecessors: HashMap<String, Vec<String>>,
    /// feed id -> ids of the agencies that own it
    feed_agencies: HashMap<String, Vec<String>>,
    /// agency id -> ids of the regions containing it
    agency_regions: HashMap<String, Vec<i64>>,
}

impl TransitRegistry {
    /// builds the registry, validating that every cross-reference in the
    /// dataset resolves and materializing the reverse lookup indices.
    pub fn new(
        feeds: Vec<FeedVersion>,
        agencies: Vec<Agency>,
        regions: Vec<Region>,
    ) -> Result<TransitRegistry, RegistryError> {
        let mut feed_map: HashMap<String, FeedVersion> = HashMap::with_capacity(feeds.len());
        for feed in feeds {
            if feed_map.contains_key(&feed.stored_id) {
                return Err(RegistryError::DuplicateFeed(feed.stored_id));
            }
            feed_map.insert(feed.stored_id.clone(), feed);
        }
        let mut agency_map: HashMap<String, Agency> = HashMap::with_capacity(agencies.len());
        for agency in agencies {
            let id = agency.id.clone();
            if agency_map.insert(id.clone(), agency).is_some() {
                return Err(RegistryError::DuplicateAgency(id));
            }
        }
        let mut region_map: HashMap<i64, Region> = HashMap::with_capacity(regions.len());
        for region in regions {
            let id = region.id;
            if region_map.insert(id, region).is_some() {
                return Err(RegistryError::DuplicateRegion(id));
            }
        }

        let mut predecessors: HashMap<String, Vec<String>> = HashMap::new();
        for feed in feed_map.values() {
            if let Some(successor_id) = &feed.superseded_by {
                if !feed_map.contains_key(successor_id) {
                    return Err(RegistryError::UnknownSuccessor(
                        feed.stored_id.clone(),
                        successor_id.clone(),
                    ));
                }
                predecessors
                    .entry(successor_id.clone())
                    .or_default()
                    .push(feed.stored_id.clone());
            }
        }

        let mut feed_agencies: HashMap<String, Vec<String>> = HashMap::new();
        for agency in agency_map.values() {
            for feed_id in &agency.feeds {
                if !feed_map.contains_key(feed_id) {
                    return Err(RegistryError::UnknownFeedReference(
                        agency.id.clone(),
                        feed_id.clone(),
                    ));
                }
                feed_agencies
                    .entry(feed_id.clone())
                    .or_default()
                    .push(agency.id.clone());
            }
        }

        let mut agency_regions: HashMap<String, Vec<i64>> = HashMap::new();
        for region in region_map.values() {
            for agency_id in &region.agencies {
                if !agency_map.contains_key(agency_id) {
                    return Err(RegistryError::UnknownAgencyReference(
                        region.id,
                        agency_id.clone(),
                    ));
                }
                agency_regions
                    .entry(agency_id.clone())
                    .or_default()
                    .push(region.id);
            }
        }

        Ok(TransitRegistry {
            feeds: feed_map,
            agencies: agency_map,
            regions: region_map,
            predecessors,
            feed_agencies,
            agency_regions,
        })
    }

    pub fn feed(&self, feed_id: &str) -> Result<&FeedVersion, RegistryError> {
        self.feeds
            .get(feed_id)
            .ok_or_else(|| RegistryError::UnknownFeed(feed_id.to_string()))
    }

    pub fn agency(&self, agency_id: &str) -> Result<&Agency, RegistryError> {
        self.agencies
            .get(agency_id)
            .ok_or_else(|| RegistryError::UnknownAgency(agency_id.to_string()))
    }

    pub fn region(&self, region_id: i64) -> Result<&Region, RegistryError> {
        self.regions
            .get(&region_id)
            .ok_or(RegistryError::UnknownRegion(region_id))
    }

    /// all region ids, in ascending order.
    pub fn region_ids(&self) -> Vec<i64> {
        self.regions.keys().copied().sorted().collect_vec()
    }

    /// the newest version of each supersession chain owned by an agency,
    /// i.e. the feeds not yet superseded by anything. order follows the
    /// agency's feed list.
    pub fn lineage_heads(&self, agency: &Agency) -> Vec<&FeedVersion> {
        agency
            .feeds
            .iter()
            .filter_map(|id| self.feeds.get(id))
            .filter(|feed| feed.superseded_by.is_none())
            .collect_vec()
    }

    /// feeds directly superseded by the given feed.
    pub fn predecessors_of(&self, feed_id: &str) -> Vec<&FeedVersion> {
        self.predecessors
            .get(feed_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
            .iter()
            .filter_map(|id| self.feeds.get(id))
            .collect_vec()
    }

    /// resolves an ambiguous reverse lookup by preferring the predecessor
    /// with the latest expiration date.
    pub fn latest_expiring_predecessor(&self, feed_id: &str) -> Option<&FeedVersion> {
        self.predecessors_of(feed_id)
            .into_iter()
            .max_by_key(|feed| feed.expiration_date)
    }

    /// resolves an ambiguous reverse lookup by preferring the predecessor
    /// with the latest start date.
    pub fn latest_starting_predecessor(&self, feed_id: &str) -> Option<&FeedVersion> {
        self.predecessors_of(feed_id)
            .into_iter()
            .max_by_key(|feed| feed.start_date)
    }

    /// follows the forward supersession links from a feed, skipping any
    /// successor that is disabled or failed, and returns the first eligible
    /// successor if one exists. used to force expirations, never to decide
    /// plan membership.
    pub fn next_eligible_successor(&self, feed: &FeedVersion) -> Option<&FeedVersion> {
        let mut seen: HashSet<&str> = HashSet::new();
        seen.insert(&feed.stored_id);
        let mut next_id = feed.superseded_by.as_deref();
        while let Some(id) = next_id {
            if !seen.insert(id) {
                log::warn!("supersession chain cycles at feed '{id}'");
                return None;
            }
            let successor = self.feeds.get(id)?;
            if !successor.disabled && successor.status != FeedParseStatus::Failed {
                return Some(successor);
            }
            next_id = successor.superseded_by.as_deref();
        }
        None
    }

    /// agencies that own the given feed. a feed shared by several agencies
    /// (a combined regional feed) resolves to all of them.
    pub fn agency_ids_for_feed(&self, feed_id: &str) -> &[String] {
        self.feed_agencies
            .get(feed_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn region_ids_for_agency(&self, agency_id: &str) -> &[i64] {
        self.agency_regions
            .get(agency_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod test {
    use chrono::{TimeZone, Utc};

    use super::TransitRegistry;
    use crate::model::{Agency, BikesAllowed, FeedParseStatus, FeedVersion};

    fn feed(id: &str, year: i32, superseded_by: Option<&str>) -> FeedVersion {
        FeedVersion {
            stored_id: id.to_string(),
            start_date: Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0).unwrap(),
            expiration_date: Utc.with_ymd_and_hms(year, 12, 31, 0, 0, 0).unwrap(),
            timezone: chrono_tz::UTC,
            status: FeedParseStatus::Successful,
            disabled: false,
            realtime_urls: vec![],
            default_bikes_allowed: BikesAllowed::Warn,
            superseded_by: superseded_by.map(String::from),
        }
    }

    fn agency(id: &str, feeds: &[&str]) -> Agency {
        Agency {
            id: id.to_string(),
            name: id.to_string(),
            disabled: false,
            feeds: feeds.iter().map(|f| f.to_string()).collect(),
        }
    }

    #[test]
    fn test_next_eligible_successor_skips_disabled_and_failed() {
        let v1 = feed("v1", 2010, Some("v2"));
        let mut v2 = feed("v2", 2011, Some("v3"));
        v2.disabled = true;
        let mut v3 = feed("v3", 2012, Some("v4"));
        v3.status = FeedParseStatus::Failed;
        let v4 = feed("v4", 2013, None);
        let registry = TransitRegistry::new(
            vec![v1, v2, v3, v4],
            vec![agency("a", &["v1", "v2", "v3", "v4"])],
            vec![],
        )
        .expect("fixture dataset should validate");

        let head = registry.feed("v1").expect("feed should resolve");
        let successor = registry
            .next_eligible_successor(head)
            .expect("an eligible successor exists");
        assert_eq!(successor.stored_id, "v4");

        let end = registry.feed("v4").expect("feed should resolve");
        assert!(registry.next_eligible_successor(end).is_none());
    }

    #[test]
    fn test_ambiguous_predecessor_resolution_orderings() {
        // both claim v3; one starts later, the other expires later
        let mut early_start = feed("early-start", 2010, Some("v3"));
        early_start.expiration_date = Utc.with_ymd_and_hms(2012, 6, 1, 0, 0, 0).unwrap();
        let late_start = feed("late-start", 2011, Some("v3"));
        let v3 = feed("v3", 2012, None);
        let registry = TransitRegistry::new(
            vec![early_start, late_start, v3],
            vec![agency("a", &["early-start", "late-start", "v3"])],
            vec![],
        )
        .expect("fixture dataset should validate");

        let by_expiration = registry
            .latest_expiring_predecessor("v3")
            .expect("predecessors exist");
        assert_eq!(by_expiration.stored_id, "early-start");
        let by_start = registry
            .latest_starting_predecessor("v3")
            .expect("predecessors exist");
        assert_eq!(by_start.stored_id, "late-start");
    }
}
