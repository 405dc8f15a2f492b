//! # Backend contracts
//!
//! The traits a storage backend implements so that the marketplace APIs can run on top of it. The APIs own every
//! business rule (who may move an order where, when a review is allowed); backends own atomicity. Each method that
//! touches more than one document commits all of its writes together or none of them.
//!
//! * [`OrderManagement`] stores orders, applies validated status changes, and keeps the transaction ledger.
//! * [`ReviewManagement`] records reviews and folds them into the merchant's rating aggregate.
//! * [`ConversationManagement`] appends chat messages and maintains conversation summaries.
//! * [`ProfileManagement`] stores user profiles and merchant catalogues.
//! * [`MarketplaceDatabase`] bundles the above for a concrete backend.
//!
//! The [`collaborators`] module holds the capabilities consumed from outside the marketplace (image hosting, style
//! advice, shipping quotes and identity).
pub mod collaborators;
mod conversation_management;
mod data_objects;
mod marketplace_database;
mod order_management;
mod profile_management;
mod review_management;

pub use conversation_management::ConversationManagement;
pub use data_objects::{OrderQueryFilter, ReviewReceipt, StatusUpdate, TransactionQueryFilter, TransitionOutcome};
pub use marketplace_database::{MarketplaceDatabase, StoreError};
pub use order_management::OrderManagement;
pub use profile_management::ProfileManagement;
pub use review_management::ReviewManagement;
