use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db_types::{
    Complaint,
    Order,
    OrderId,
    OrderStatusType,
    RatingAggregate,
    Review,
    Transaction,
    TransactionStatus,
    UserId,
};

//--------------------------------------   OrderQueryFilter    ---------------------------------------------------------
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderQueryFilter {
    pub order_id: Option<OrderId>,
    pub customer_id: Option<UserId>,
    pub merchant_id: Option<UserId>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    pub status: Option<Vec<OrderStatusType>>,
}

impl OrderQueryFilter {
    pub fn with_order_id(mut self, order_id: OrderId) -> Self {
        self.order_id = Some(order_id);
        self
    }

    pub fn with_customer_id(mut self, customer_id: UserId) -> Self {
        self.customer_id = Some(customer_id);
        self
    }

    pub fn with_merchant_id(mut self, merchant_id: UserId) -> Self {
        self.merchant_id = Some(merchant_id);
        self
    }

    pub fn with_status(mut self, status: OrderStatusType) -> Self {
        self.status.get_or_insert_with(Vec::new).push(status);
        self
    }

    pub fn since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    pub fn until(mut self, until: DateTime<Utc>) -> Self {
        self.until = Some(until);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.order_id.is_none() &&
            self.customer_id.is_none() &&
            self.merchant_id.is_none() &&
            self.status.is_none() &&
            self.since.is_none() &&
            self.until.is_none()
    }
}

impl Display for OrderQueryFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            return write!(f, "No filters.");
        }
        if let Some(order_id) = &self.order_id {
            write!(f, "order_id: {order_id}. ")?;
        }
        if let Some(customer_id) = &self.customer_id {
            write!(f, "customer_id: {customer_id}. ")?;
        }
        if let Some(merchant_id) = &self.merchant_id {
            write!(f, "merchant_id: {merchant_id}. ")?;
        }
        if let Some(since) = &self.since {
            write!(f, "since {since}. ")?;
        }
        if let Some(until) = &self.until {
            write!(f, "until {until}. ")?;
        }
        if let Some(statuses) = &self.status {
            let statuses = statuses.iter().map(|s| s.to_string()).collect::<Vec<String>>().join(",");
            write!(f, "statuses: [{statuses}]. ")?;
        }
        Ok(())
    }
}

//-------------------------------------- TransactionQueryFilter ---------------------------------------------------------
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransactionQueryFilter {
    pub merchant_id: Option<UserId>,
    pub customer_id: Option<UserId>,
    pub status: Option<TransactionStatus>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

impl TransactionQueryFilter {
    pub fn with_merchant_id(mut self, merchant_id: UserId) -> Self {
        self.merchant_id = Some(merchant_id);
        self
    }

    pub fn with_customer_id(mut self, customer_id: UserId) -> Self {
        self.customer_id = Some(customer_id);
        self
    }

    pub fn with_status(mut self, status: TransactionStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    pub fn until(mut self, until: DateTime<Utc>) -> Self {
        self.until = Some(until);
        self
    }
}

//--------------------------------------     StatusUpdate      ---------------------------------------------------------
/// A status change that has passed every business rule and only needs to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusUpdate {
    pub order_id: OrderId,
    /// The status the order had when the change was validated. The write is conditional on it.
    pub from: OrderStatusType,
    pub to: OrderStatusType,
    pub tracking_number: Option<String>,
    pub cancellation_reason: Option<String>,
    pub complaint: Option<Complaint>,
    pub resolve_complaint: bool,
    /// Written to the ledger in the same transaction as the status change.
    pub settlement: Option<Transaction>,
}

impl StatusUpdate {
    pub fn new(order_id: OrderId, from: OrderStatusType, to: OrderStatusType) -> Self {
        Self {
            order_id,
            from,
            to,
            tracking_number: None,
            cancellation_reason: None,
            complaint: None,
            resolve_complaint: false,
            settlement: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransitionOutcome {
    pub order: Order,
    pub transaction: Option<Transaction>,
}

//--------------------------------------     ReviewReceipt     ---------------------------------------------------------
/// Everything a successful review submission changed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewReceipt {
    pub review: Review,
    pub order: Order,
    pub merchant_aggregate: RatingAggregate,
}
