#[derive(thiserror::Error, Debug)]
pub enum RegistryError {
    #[error("failure reading transit dataset '{0}': {1}")]
    DatasetReadError(String, String),
    #[error("failure parsing transit dataset '{0}': {1}")]
    DatasetParseError(String, String),
    #[error("duplicate feed id '{0}' in dataset")]
    DuplicateFeed(String),
    #[error("duplicate agency id '{0}' in dataset")]
    DuplicateAgency(String),
    #[error("duplicate region id {0} in dataset")]
    DuplicateRegion(i64),
    #[error("feed '{0}' is superseded by unknown feed '{1}'")]
    UnknownSuccessor(String, String),
    #[error("agency '{0}' references unknown feed '{1}'")]
    UnknownFeedReference(String, String),
    #[error("region {0} references unknown agency '{1}'")]
    UnknownAgencyReference(i64, String),
    #[error("unknown feed id '{0}'")]
    UnknownFeed(String),
    #[error("unknown agency id '{0}'")]
    UnknownAgency(String),
    #[error("unknown region id {0}")]
    UnknownRegion(i64),
}
