pub mod chat_api;
pub mod checkout;
pub mod errors;
pub mod live_api;
pub mod order_flow_api;
pub mod order_objects;
pub mod profile_api;
pub mod retry;
pub mod review_api;
pub mod transitions;

pub use errors::MarketError;
