//! # Live views
//!
//! Clients never patch their local state from their own writes. Every committed write publishes a [`ChangeNotice`]
//! naming the [`Topic`]s it touched. A [`LiveSubscription`] watching one of those topics re-reads its whole scope
//! from the store and yields a complete [`Snapshot`]. On the client side a [`LiveView`] replaces its state wholesale
//! with each snapshot, and holds an optimistic value only as a pending overlay until the next snapshot lands.
mod feed;
mod subscription;
mod view;

pub use feed::{ChangeFeed, ChangeNotice, Topic};
pub use subscription::{LiveSubscription, Snapshot, SnapshotLoader};
pub use view::LiveView;
