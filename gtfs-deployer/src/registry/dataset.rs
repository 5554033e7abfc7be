use std::fs::File;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::model::{Agency, FeedVersion, Region};
use crate::registry::{RegistryError, TransitRegistry};

/// on-disk description of the feeds, agencies and regions served by a
/// deployer instance. loaded from JSON and validated into a
/// [`TransitRegistry`] before any plan is built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitDataset {
    #[serde(default)]
    pub feeds: Vec<FeedVersion>,
    #[serde(default)]
    pub agencies: Vec<Agency>,
    #[serde(default)]
    pub regions: Vec<Region>,
}

impl TransitDataset {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<TransitDataset, RegistryError> {
        let filename = path.as_ref().to_str().unwrap_or_default().to_string();
        let file = File::open(path.as_ref())
            .map_err(|e| RegistryError::DatasetReadError(filename.clone(), format!("{e}")))?;
        serde_json::from_reader(file)
            .map_err(|e| RegistryError::DatasetParseError(filename, format!("{e}")))
    }

    pub fn into_registry(self) -> Result<TransitRegistry, RegistryError> {
        TransitRegistry::new(self.feeds, self.agencies, self.regions)
    }
}
