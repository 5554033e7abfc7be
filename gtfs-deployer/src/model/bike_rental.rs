use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BikeRentalSystemType {
    KeolisRennes,
    Bixi,
    #[serde(rename = "CITYBIKES")]
    CityBikes,
    Static,
}

/// a bike rental system operating within a region. carried through to the
/// deployment plan reduced to the fields the graph builder needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BikeRentalSystem {
    pub name: String,
    pub system_type: BikeRentalSystemType,
    pub url: String,
    pub currency: String,
    #[serde(default)]
    pub fare_classes: Vec<String>,
}
