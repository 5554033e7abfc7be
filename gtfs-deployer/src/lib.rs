//! curates versioned regional transit feeds and decides, per region, which
//! feed versions should be live over a forward-looking window. plans carry a
//! feed-local expiration date per version and leave behind a durable schedule
//! of future rebuild points so feeds becoming valid beyond the window are
//! picked up on time.

pub mod deployment;
pub mod model;
pub mod registry;
