mod dataset;
mod registry_error;
mod transit_registry;

pub use dataset::TransitDataset;
pub use registry_error::RegistryError;
pub use transit_registry::TransitRegistry;
