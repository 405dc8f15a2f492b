use atelier_engine::{db_types::UserId, order_objects::OrderScope};
use serde::{Deserialize, Serialize};

/// Which side of their orders a caller is looking at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    #[default]
    Customer,
    Merchant,
}

/// Query parameters of the order and ledger listings, e.g. `/api/orders?as=merchant`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ScopeParams {
    #[serde(default, rename = "as")]
    pub side: Side,
}

impl ScopeParams {
    pub fn scope_for(&self, user: UserId) -> OrderScope {
        match self.side {
            Side::Customer => OrderScope::Customer(user),
            Side::Merchant => OrderScope::Merchant(user),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewParams {
    pub rating: u8,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub reviewer_name: String,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessageParams {
    #[serde(default)]
    pub text: String,
    pub attachment_url: Option<String>,
    #[serde(default)]
    pub sender_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdviceResponse {
    pub advice: String,
    /// False when the stylist was unreachable and `advice` is an apology.
    pub success: bool,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn scope_defaults_to_the_customer_side() {
        let params: ScopeParams = serde_json::from_str("{}").unwrap();
        assert_eq!(params.scope_for(UserId::from("sari")), OrderScope::Customer(UserId::from("sari")));
        let params: ScopeParams = serde_json::from_str(r#"{"as":"merchant"}"#).unwrap();
        assert_eq!(params.scope_for(UserId::from("rina")), OrderScope::Merchant(UserId::from("rina")));
    }
}
