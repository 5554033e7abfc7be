use serde::{Deserialize, Serialize};

/// a transit agency and the feed versions it owns. disabled agencies are
/// skipped when assembling deployment plans.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agency {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub disabled: bool,
    /// stored ids of every feed version owned by this agency, across all of
    /// its supersession chains.
    #[serde(default)]
    pub feeds: Vec<String>,
}
