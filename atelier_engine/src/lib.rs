//! Atelier marketplace engine
//!
//! The engine coordinates custom-tailoring commerce between customers and merchants. It is backend-agnostic: the
//! business rules live in the APIs of [`mod@market_api`] and run on top of any storage backend that implements the
//! traits in [`mod@traits`]. SQLite is the bundled backend.
//!
//! The library is organised as follows:
//! 1. Data types ([`mod@db_types`]) shared by every layer: orders, reviews, the transaction ledger, conversations,
//!    profiles and catalogues.
//! 2. Backend contracts ([`mod@traits`]). A backend guarantees that every multi-document write commits atomically,
//!    and reports lost races as `Conflict`.
//! 3. The public APIs ([`mod@market_api`]):
//!    * [`OrderFlowApi`] runs the order lifecycle state machine. All status changes go through
//!      [`OrderFlowApi::advance`].
//!    * [`ReviewApi`] is the rating aggregator. It folds each review into the merchant's running mean atomically.
//!    * [`ChatApi`] is the conversation channel between pairs of users.
//!    * [`ProfileApi`] and [`CheckoutApi`] cover profiles, catalogues and order placement.
//!    * [`LiveApi`] opens push subscriptions that deliver complete snapshots after every relevant write.
//! 4. Live views ([`mod@live`]): the change feed, subscriptions and the client-side reconciling view.
//!
//! The engine also emits events (an order was completed, a review was submitted, ...) that you can hook into with
//! [`events::EventHooks`] to run side effects such as notifications.
pub mod db_types;
pub mod events;
pub mod live;
pub mod market_api;
pub mod traits;

#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use market_api::{
    chat_api::{ChatApi, ConversationSummary},
    checkout::{CheckoutApi, CheckoutRequest},
    errors::MarketError,
    live_api::LiveApi,
    order_flow_api::OrderFlowApi,
    order_objects,
    profile_api::ProfileApi,
    retry::RetryPolicy,
    review_api::ReviewApi,
    transitions,
};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
