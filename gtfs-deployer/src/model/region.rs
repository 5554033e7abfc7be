use serde::{Deserialize, Serialize};

use crate::model::BikeRentalSystem;

/// a served metropolitan region: one or more transit agencies plus the
/// shared-mobility systems echoed into its deployment plans.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Region {
    pub id: i64,
    pub name: String,
    /// disabled regions still have plans computed (and rebuild records
    /// rewritten), but plans are not dispatched for them.
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub agencies: Vec<String>,
    #[serde(default)]
    pub bike_rental_systems: Vec<BikeRentalSystem>,
}
