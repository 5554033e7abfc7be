use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// outcome of the last parse attempt for a feed version. a failed version is
/// kept in the version chain for traversal but is never served.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeedParseStatus {
    Successful,
    Failed,
}

/// feed-wide default for bicycle carriage on trips that do not specify one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BikesAllowed {
    Yes,
    No,
    Warn,
}

/// one stored version of an agency's transit schedule data.
///
/// `start_date` and `expiration_date` are absolute instants; all comparisons
/// between versions use them directly. `timezone` only matters when an
/// expiration is rendered as a feed-local calendar date for the deployer.
///
/// `superseded_by` is a weak forward link to the version replacing this one,
/// by stored id. it is used for traversal only; the reverse direction is a
/// lookup resolved by the registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedVersion {
    pub stored_id: String,
    pub start_date: DateTime<Utc>,
    pub expiration_date: DateTime<Utc>,
    pub timezone: Tz,
    pub status: FeedParseStatus,
    /// a version may be disabled by an operator independently of its parse
    /// status, for example when an agency publishes bad data over good data.
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub realtime_urls: Vec<String>,
    pub default_bikes_allowed: BikesAllowed,
    #[serde(default)]
    pub superseded_by: Option<String>,
}
