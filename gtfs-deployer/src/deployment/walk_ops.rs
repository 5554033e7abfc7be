use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Duration, Utc};

use crate::deployment::deployment_error::DeploymentError;
use crate::deployment::feed_descriptor::FeedDescriptor;
use crate::deployment::rebuild_scheduler::RebuildScheduler;
use crate::model::{FeedParseStatus, FeedVersion};
use crate::registry::TransitRegistry;

/// walks one supersession chain backwards from its head, collecting the feed
/// versions needed to cover `[reference, window_end]` into `plan_feeds` and
/// scheduling a future rebuild for any version that becomes valid only after
/// the window ends.
///
/// rules applied at each version, newest first:
///   - a failed version is never served; the walk resumes from the
///     predecessor with the latest expiration date.
///   - a version starting inside the window is included (unless disabled)
///     and the walk continues into older versions to cover the earlier part
///     of the window. if the feed id is already in the plan, another lineage
///     has covered it and the walk stops.
///   - a version starting after the window schedules a rebuild of every
///     region it reaches, dated `window + 1` days before its start so the
///     rebuild lands strictly before the version becomes valid.
///   - a version that already started is the last one examined: the chain is
///     walked in roughly chronological order, so once a current version is
///     found, older history is irrelevant. if it is disabled, the walk falls
///     back to the predecessor instead (an agency may publish bad new data
///     over good old data). if it expired before the reference date, the
///     walk stops without emitting anything; older versions cannot re-cover
///     a window the newest known version has already aged out of.
pub fn walk_lineage(
    registry: &TransitRegistry,
    scheduler: &RebuildScheduler<'_>,
    head: &FeedVersion,
    label: &str,
    reference: DateTime<Utc>,
    window_end: DateTime<Utc>,
    window_days: i64,
    plan_feeds: &mut BTreeMap<String, FeedDescriptor>,
) -> Result<(), DeploymentError> {
    let mut visited: HashSet<String> = HashSet::new();
    let mut current = head;
    loop {
        if !visited.insert(current.stored_id.clone()) {
            return Err(DeploymentError::SupersessionCycle(current.stored_id.clone()));
        }

        if current.status == FeedParseStatus::Failed {
            match registry.latest_expiring_predecessor(&current.stored_id) {
                Some(older) => {
                    log::debug!(
                        "feed '{}' failed to parse, falling back to '{}'",
                        current.stored_id,
                        older.stored_id
                    );
                    current = older;
                    continue;
                }
                None => return Ok(()),
            }
        }

        if reference < current.start_date {
            // version is not yet valid at the reference date
            if window_end > current.start_date {
                // it becomes valid inside the window
                if !current.disabled {
                    if plan_feeds.contains_key(&current.stored_id) {
                        return Ok(());
                    }
                    let descriptor = describe_feed(registry, current, label);
                    plan_feeds.insert(current.stored_id.clone(), descriptor);
                }
            } else {
                // it becomes valid only after the window ends; rebuild the
                // affected regions once it is about to come into range
                let rebuild_after = current.start_date - Duration::days(window_days + 1);
                scheduler.schedule(current, rebuild_after)?;
            }
            match registry.latest_starting_predecessor(&current.stored_id) {
                Some(older) => current = older,
                // history does not go back far enough
                None => return Ok(()),
            }
        } else {
            if reference > current.expiration_date {
                return Ok(());
            }
            if current.disabled {
                match registry.latest_starting_predecessor(&current.stored_id) {
                    Some(older) => {
                        log::debug!(
                            "feed '{}' is disabled, falling back to '{}'",
                            current.stored_id,
                            older.stored_id
                        );
                        current = older;
                    }
                    None => return Ok(()),
                }
            } else {
                let descriptor = describe_feed(registry, current, label);
                plan_feeds
                    .entry(current.stored_id.clone())
                    .or_insert(descriptor);
                return Ok(());
            }
        }
    }
}

/// builds the plan entry for one feed version. the expiration is the feed's
/// own, unless an eligible successor starts on or before it, in which case
/// the version is forced to expire 12 hours before the successor starts.
/// subtracting half a day rather than a whole one keeps the rendered date on
/// the day preceding the successor's start even across daylight-saving
/// shifts. the instant is rendered as a calendar date in the feed's own time
/// zone; this is the only place the time zone is consulted.
pub fn describe_feed(
    registry: &TransitRegistry,
    feed: &FeedVersion,
    label: &str,
) -> FeedDescriptor {
    let expire_on = match registry.next_eligible_successor(feed) {
        Some(successor) if feed.expiration_date >= successor.start_date => {
            (successor.start_date - Duration::hours(12))
                .with_timezone(&feed.timezone)
                .date_naive()
        }
        _ => feed
            .expiration_date
            .with_timezone(&feed.timezone)
            .date_naive(),
    };
    FeedDescriptor {
        feed_id: feed.stored_id.clone(),
        expire_on,
        default_agency_id: label.to_string(),
        realtime_urls: feed.realtime_urls.clone(),
        default_bikes_allowed: feed.default_bikes_allowed,
    }
}

#[cfg(test)]
mod test {
    use std::collections::BTreeMap;

    use chrono::{DateTime, Duration, TimeZone, Utc};
    use chrono_tz::Tz;

    use super::walk_lineage;
    use crate::deployment::feed_descriptor::FeedDescriptor;
    use crate::deployment::rebuild_scheduler::{MemoryRebuildStore, RebuildScheduler, RebuildStore};
    use crate::model::{Agency, BikesAllowed, FeedParseStatus, FeedVersion, Region};
    use crate::registry::TransitRegistry;

    const TZ: Tz = chrono_tz::America::Los_Angeles;

    fn local_midnight(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        TZ.with_ymd_and_hms(y, m, d, 0, 0, 0)
            .single()
            .expect("unambiguous fixture date")
            .with_timezone(&Utc)
    }

    fn feed(
        id: &str,
        start: (i32, u32, u32),
        expire: (i32, u32, u32),
        superseded_by: Option<&str>,
    ) -> FeedVersion {
        FeedVersion {
            stored_id: id.to_string(),
            start_date: local_midnight(start.0, start.1, start.2),
            expiration_date: local_midnight(expire.0, expire.1, expire.2),
            timezone: TZ,
            status: FeedParseStatus::Successful,
            disabled: false,
            realtime_urls: vec![],
            default_bikes_allowed: BikesAllowed::Warn,
            superseded_by: superseded_by.map(String::from),
        }
    }

    fn agency(id: &str, name: &str, feeds: &[&str]) -> Agency {
        Agency {
            id: id.to_string(),
            name: name.to_string(),
            disabled: false,
            feeds: feeds.iter().map(|f| f.to_string()).collect(),
        }
    }

    fn region(id: i64, name: &str, agencies: &[&str]) -> Region {
        Region {
            id,
            name: name.to_string(),
            disabled: false,
            agencies: agencies.iter().map(|a| a.to_string()).collect(),
            bike_rental_systems: vec![],
        }
    }

    /// three BART versions chained v1 -> v2 -> v3 plus an independent Muni
    /// feed, all serving one region.
    fn bay_area_registry() -> TransitRegistry {
        TransitRegistry::new(
            vec![
                feed("bart1", (2011, 1, 1), (2012, 8, 1), Some("bart2")),
                feed("bart2", (2012, 7, 16), (2013, 1, 15), Some("bart3")),
                feed("bart3", (2012, 12, 10), (2013, 6, 30), None),
                feed("muni", (2012, 1, 5), (2013, 12, 31), None),
            ],
            vec![
                agency("bart", "BART", &["bart1", "bart2", "bart3"]),
                agency("muni", "Muni", &["muni"]),
            ],
            vec![region(1, "San Francisco, CA", &["bart", "muni"])],
        )
        .expect("fixture dataset should validate")
    }

    fn walk_heads(
        registry: &TransitRegistry,
        reference: DateTime<Utc>,
        window_days: i64,
    ) -> (BTreeMap<String, FeedDescriptor>, MemoryRebuildStore) {
        let store = MemoryRebuildStore::new();
        let scheduler = RebuildScheduler::new(registry, &store);
        let window_end = reference + Duration::days(window_days);
        let mut plan_feeds = BTreeMap::new();
        for region_id in registry.region_ids() {
            let region = registry.region(region_id).expect("region should resolve");
            for agency_id in &region.agencies {
                let agency = registry.agency(agency_id).expect("agency should resolve");
                for head in registry.lineage_heads(agency) {
                    let label = format!("{}-{}", agency.name, head.stored_id);
                    walk_lineage(
                        registry,
                        &scheduler,
                        head,
                        &label,
                        reference,
                        window_end,
                        window_days,
                        &mut plan_feeds,
                    )
                    .expect("walk should succeed");
                }
            }
        }
        (plan_feeds, store)
    }

    #[test]
    fn test_wide_window_includes_full_chain() {
        let registry = bay_area_registry();
        let (plan_feeds, _) = walk_heads(&registry, local_midnight(2012, 6, 10), 420);

        let ids: Vec<&String> = plan_feeds.keys().collect();
        assert_eq!(ids, ["bart1", "bart2", "bart3", "muni"]);

        // each superseded version is forced to expire the day before its
        // successor starts
        assert_eq!(plan_feeds["bart1"].expire_on.to_string(), "2012-07-15");
        assert_eq!(plan_feeds["bart2"].expire_on.to_string(), "2012-12-09");
        // the head of the chain expires naturally
        assert_eq!(plan_feeds["bart3"].expire_on.to_string(), "2013-06-30");
        assert_eq!(plan_feeds["muni"].expire_on.to_string(), "2013-12-31");

        assert_eq!(plan_feeds["bart2"].default_agency_id, "BART-bart3");
    }

    #[test]
    fn test_narrow_window_skips_covered_history() {
        let registry = bay_area_registry();
        let (plan_feeds, store) = walk_heads(&registry, local_midnight(2012, 10, 10), 20);

        // bart2 covers the reference date, so bart1 is never reached; bart3
        // starts beyond the window and is excluded
        let ids: Vec<&String> = plan_feeds.keys().collect();
        assert_eq!(ids, ["bart2", "muni"]);
        assert_eq!(plan_feeds["bart2"].expire_on.to_string(), "2012-12-09");

        // bart3 leaves a rebuild record 21 days before it starts
        let records = store.records_for(1).expect("read should succeed");
        let expected = local_midnight(2012, 12, 10) - Duration::days(21);
        assert_eq!(records, vec![expected]);
    }

    #[test]
    fn test_excludes_feeds_not_yet_valid() {
        let registry = bay_area_registry();
        let (plan_feeds, _) = walk_heads(&registry, local_midnight(2011, 12, 31), 1);

        // bart2, bart3 and muni all start beyond the one-day window
        let ids: Vec<&String> = plan_feeds.keys().collect();
        assert_eq!(ids, ["bart1"]);
    }

    #[test]
    fn test_shared_regional_feed_emitted_once() {
        let registry = TransitRegistry::new(
            vec![
                feed("combined", (2012, 1, 1), (2013, 1, 1), None),
                feed("ferry", (2012, 1, 1), (2013, 1, 1), None),
            ],
            vec![
                agency("a", "Alpha Transit", &["combined"]),
                agency("b", "Beta Buses", &["combined"]),
                agency("c", "Ferry Co", &["ferry"]),
            ],
            vec![region(1, "Combined Metro", &["a", "b", "c"])],
        )
        .expect("fixture dataset should validate");

        let (plan_feeds, _) = walk_heads(&registry, local_midnight(2012, 6, 1), 14);

        // two distinct feeds, not three descriptors: the combined feed is
        // reached under both agency labels but keyed once by id
        assert_eq!(plan_feeds.len(), 2);
        assert_eq!(
            plan_feeds["combined"].default_agency_id,
            "Alpha Transit-combined"
        );
    }

    #[test]
    fn test_future_feed_schedules_rebuild() {
        let registry = TransitRegistry::new(
            vec![feed("next", (2013, 3, 1), (2013, 9, 1), None)],
            vec![agency("a", "Alpha Transit", &["next"])],
            vec![region(1, "Metro", &["a"])],
        )
        .expect("fixture dataset should validate");

        let (plan_feeds, store) = walk_heads(&registry, local_midnight(2012, 6, 1), 14);

        assert!(plan_feeds.is_empty());
        let records = store.records_for(1).expect("read should succeed");
        let expected = local_midnight(2013, 3, 1) - Duration::days(15);
        assert_eq!(records, vec![expected]);
    }

    #[test]
    fn test_disabled_head_falls_back_to_predecessor() {
        let mut bad = feed("v2", (2012, 5, 1), (2013, 5, 1), None);
        bad.disabled = true;
        let registry = TransitRegistry::new(
            vec![feed("v1", (2011, 5, 1), (2012, 6, 1), Some("v2")), bad],
            vec![agency("a", "Alpha Transit", &["v1", "v2"])],
            vec![region(1, "Metro", &["a"])],
        )
        .expect("fixture dataset should validate");

        let (plan_feeds, _) = walk_heads(&registry, local_midnight(2012, 5, 15), 14);

        // v2 is current but disabled; the last known-good version is served
        // with its own expiration. v2 is not an eligible successor, so v1's
        // expiration is not forced down to v2's start.
        let ids: Vec<&String> = plan_feeds.keys().collect();
        assert_eq!(ids, ["v1"]);
        assert_eq!(plan_feeds["v1"].expire_on.to_string(), "2012-06-01");
    }

    #[test]
    fn test_failed_head_bypassed_via_latest_expiring_predecessor() {
        let mut broken = feed("v3", (2012, 5, 1), (2013, 5, 1), None);
        broken.status = FeedParseStatus::Failed;
        let registry = TransitRegistry::new(
            vec![
                // two feeds claim v3 as successor; the one expiring later wins
                feed("v1", (2011, 1, 1), (2012, 7, 1), Some("v3")),
                feed("v2", (2011, 6, 1), (2012, 10, 1), Some("v3")),
                broken,
            ],
            vec![agency("a", "Alpha Transit", &["v1", "v2", "v3"])],
            vec![region(1, "Metro", &["a"])],
        )
        .expect("fixture dataset should validate");

        let (plan_feeds, _) = walk_heads(&registry, local_midnight(2012, 6, 1), 14);

        let ids: Vec<&String> = plan_feeds.keys().collect();
        assert_eq!(ids, ["v2"]);
        // v3 never parses, so it does not force v2's expiration either
        assert_eq!(plan_feeds["v2"].expire_on.to_string(), "2012-10-01");
    }

    #[test]
    fn test_expired_lineage_is_not_resurrected() {
        let registry = TransitRegistry::new(
            vec![
                feed("old", (2011, 1, 1), (2011, 12, 1), Some("new")),
                feed("new", (2011, 11, 1), (2012, 3, 1), None),
            ],
            vec![agency("a", "Alpha Transit", &["old", "new"])],
            vec![region(1, "Metro", &["a"])],
        )
        .expect("fixture dataset should validate");

        // the newest version expired before the reference date; the walk
        // stops rather than searching for older coverage
        let (plan_feeds, _) = walk_heads(&registry, local_midnight(2012, 6, 1), 14);
        assert!(plan_feeds.is_empty());
    }

    #[test]
    fn test_walk_is_deterministic() {
        let registry = bay_area_registry();
        let reference = local_midnight(2012, 6, 10);
        let (first, first_store) = walk_heads(&registry, reference, 420);
        let (second, second_store) = walk_heads(&registry, reference, 420);
        assert_eq!(first, second);
        assert_eq!(
            first_store.records_for(1).expect("read should succeed"),
            second_store.records_for(1).expect("read should succeed"),
        );
    }
}
