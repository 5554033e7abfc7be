mod agency;
mod bike_rental;
mod feed_version;
mod region;

pub use agency::Agency;
pub use bike_rental::{BikeRentalSystem, BikeRentalSystemType};
pub use feed_version::{BikesAllowed, FeedParseStatus, FeedVersion};
pub use region::Region;
