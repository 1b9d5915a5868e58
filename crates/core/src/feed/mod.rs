//! Feed publishing: conditional cache codec, token port and publisher.

pub mod cache;
pub mod ports;
pub mod publisher;
