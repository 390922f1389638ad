mod message;
mod socket;

pub use message::{FeedMessage, RewalkPhase, Transaction};
pub use socket::{FeedEvent, spawn_feed};
