//! Domain data types
//!
//! These types represent the stored records and the parameter structs the
//! repository ports accept.

pub mod event;
pub mod feed_token;
pub mod subscription;

pub use event::{CalendarEvent, EventDraft, EventPatch};
pub use feed_token::{FeedToken, NewFeedToken};
pub use subscription::{NewSubscription, Subscription, SubscriptionEdit, SyncCounts};
