use atelier_common::Rupiah;
use serde::{Deserialize, Serialize};

use crate::{
    db_types::UserId,
    live::Topic,
    traits::{OrderQueryFilter, TransactionQueryFilter},
};

/// Whose orders (or ledger entries) a read is about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderScope {
    Customer(UserId),
    Merchant(UserId),
}

impl OrderScope {
    pub fn user(&self) -> &UserId {
        match self {
            OrderScope::Customer(id) | OrderScope::Merchant(id) => id,
        }
    }

    pub fn order_filter(&self) -> OrderQueryFilter {
        match self {
            OrderScope::Customer(id) => OrderQueryFilter::default().with_customer_id(id.clone()),
            OrderScope::Merchant(id) => OrderQueryFilter::default().with_merchant_id(id.clone()),
        }
    }

    pub fn transaction_filter(&self) -> TransactionQueryFilter {
        match self {
            OrderScope::Customer(id) => TransactionQueryFilter::default().with_customer_id(id.clone()),
            OrderScope::Merchant(id) => TransactionQueryFilter::default().with_merchant_id(id.clone()),
        }
    }

    pub fn orders_topic(&self) -> Topic {
        match self {
            OrderScope::Customer(id) => Topic::CustomerOrders(id.clone()),
            OrderScope::Merchant(id) => Topic::MerchantOrders(id.clone()),
        }
    }

    pub fn transactions_topic(&self) -> Topic {
        match self {
            OrderScope::Customer(id) => Topic::CustomerTransactions(id.clone()),
            OrderScope::Merchant(id) => Topic::MerchantTransactions(id.clone()),
        }
    }
}

/// The numbers on a merchant's dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerchantStats {
    /// Every order that was not cancelled, completed ones included.
    pub active_orders: usize,
    pub completed_orders: usize,
    pub total_revenue: Rupiah,
}
