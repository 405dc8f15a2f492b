//! The order lifecycle as an explicit graph.
//!
//! ```text
//! Consultation -> Design -> Production -> Finishing -> Shipped -> Completed
//!      |                                                  |          ^
//!      v                                                  v          |
//!  Cancelled                                          Complaint -----+
//! ```
//!
//! Every legality question ("may this user move this order there, and with what?") is answered here and nowhere
//! else. [`plan_transition`] turns a request into a [`StatusUpdate`] that a backend can write without further checks.
use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    db_types::{Complaint, ComplaintStatus, Order, OrderStatusType, Transaction, UserId},
    market_api::errors::MarketError,
    traits::StatusUpdate,
};

use OrderStatusType::*;

/// Which side of an order a user is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Party {
    Customer,
    Merchant,
}

impl Party {
    pub fn of(order: &Order, user: &UserId) -> Option<Self> {
        if &order.merchant_id == user {
            Some(Party::Merchant)
        } else if &order.customer_id == user {
            Some(Party::Customer)
        } else {
            None
        }
    }
}

impl Display for Party {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Party::Customer => write!(f, "customer"),
            Party::Merchant => write!(f, "merchant"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SideField {
    TrackingNumber,
    CancellationReason,
    ComplaintReason,
}

impl SideField {
    fn name(&self) -> &'static str {
        match self {
            SideField::TrackingNumber => "tracking_number",
            SideField::CancellationReason => "cancellation_reason",
            SideField::ComplaintReason => "complaint.reason",
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Edge {
    from: OrderStatusType,
    to: OrderStatusType,
    actor: Party,
    requires: Option<SideField>,
    settles: bool,
    resolves_complaint: bool,
}

const fn edge(from: OrderStatusType, to: OrderStatusType, actor: Party) -> Edge {
    Edge { from, to, actor, requires: None, settles: false, resolves_complaint: false }
}

const EDGES: [Edge; 8] = [
    edge(Consultation, Design, Party::Merchant),
    edge(Design, Production, Party::Merchant),
    edge(Production, Finishing, Party::Merchant),
    Edge { requires: Some(SideField::TrackingNumber), ..edge(Finishing, Shipped, Party::Merchant) },
    // "Order received"
    Edge { settles: true, ..edge(Shipped, Completed, Party::Customer) },
    Edge { requires: Some(SideField::ComplaintReason), ..edge(Shipped, Complaint, Party::Customer) },
    // Manual resolution. Funds were settled or disputed out of band, so there is no ledger entry.
    Edge { resolves_complaint: true, ..edge(Complaint, Completed, Party::Merchant) },
    Edge { requires: Some(SideField::CancellationReason), ..edge(Consultation, Cancelled, Party::Customer) },
];

fn find_edge(from: OrderStatusType, to: OrderStatusType) -> Option<&'static Edge> {
    EDGES.iter().find(|e| e.from == from && e.to == to)
}

/// The statuses an order in `from` may move to, whoever asks.
pub fn successors(from: OrderStatusType) -> Vec<OrderStatusType> {
    EDGES.iter().filter(|e| e.from == from).map(|e| e.to).collect()
}

/// True if `from -> to` is an edge of the lifecycle graph.
pub fn is_reachable(from: OrderStatusType, to: OrderStatusType) -> bool {
    find_edge(from, to).is_some()
}

/// The statuses `party` may move an order in `from` to.
pub fn allowed_for(from: OrderStatusType, party: Party) -> Vec<OrderStatusType> {
    EDGES.iter().filter(|e| e.from == from && e.actor == party).map(|e| e.to).collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplaintRequest {
    pub reason: String,
    pub image_url: Option<String>,
}

/// What a participant asks for when advancing an order, with whatever side data the edge needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionRequest {
    pub status: OrderStatusType,
    pub tracking_number: Option<String>,
    pub cancellation_reason: Option<String>,
    pub complaint: Option<ComplaintRequest>,
}

impl TransitionRequest {
    pub fn to(status: OrderStatusType) -> Self {
        Self { status, tracking_number: None, cancellation_reason: None, complaint: None }
    }

    pub fn ship<S: Into<String>>(tracking_number: S) -> Self {
        Self { tracking_number: Some(tracking_number.into()), ..Self::to(Shipped) }
    }

    pub fn cancel<S: Into<String>>(reason: S) -> Self {
        Self { cancellation_reason: Some(reason.into()), ..Self::to(Cancelled) }
    }

    pub fn complain<S: Into<String>>(reason: S, image_url: Option<String>) -> Self {
        Self { complaint: Some(ComplaintRequest { reason: reason.into(), image_url }), ..Self::to(Complaint) }
    }

    fn side_field(&self, field: SideField) -> Option<String> {
        let value = match field {
            SideField::TrackingNumber => self.tracking_number.as_ref(),
            SideField::CancellationReason => self.cancellation_reason.as_ref(),
            SideField::ComplaintReason => self.complaint.as_ref().map(|c| &c.reason),
        };
        value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
    }
}

/// Validates `request` against the current state of `order` on behalf of `actor`.
///
/// Checks, in order: the actor takes part in the order (`Forbidden`), the edge exists (`InvalidTransition`), the
/// actor is the party that owns the edge (`Forbidden`), the edge's side data is present (`MissingField`).
/// Side data that does not belong to the edge is ignored, so an order only ever carries a tracking number once it
/// ships, a cancellation reason once it is cancelled and a complaint once one is raised.
pub fn plan_transition(
    order: &Order,
    actor: &UserId,
    request: &TransitionRequest,
    now: DateTime<Utc>,
) -> Result<StatusUpdate, MarketError> {
    let party = Party::of(order, actor)
        .ok_or_else(|| MarketError::Forbidden(format!("{actor} is not a participant in order {}", order.id)))?;
    let edge = find_edge(order.status, request.status)
        .ok_or(MarketError::InvalidTransition { from: order.status, to: request.status })?;
    if edge.actor != party {
        return Err(MarketError::Forbidden(format!(
            "Only the {} may move an order from {} to {}",
            edge.actor, edge.from, edge.to
        )));
    }
    let side_value = match edge.requires {
        Some(field) => Some(request.side_field(field).ok_or(MarketError::MissingField(field.name()))?),
        None => None,
    };
    let mut update = StatusUpdate::new(order.id.clone(), edge.from, edge.to);
    match edge.requires {
        Some(SideField::TrackingNumber) => update.tracking_number = side_value,
        Some(SideField::CancellationReason) => update.cancellation_reason = side_value,
        Some(SideField::ComplaintReason) => {
            update.complaint = side_value.map(|reason| Complaint {
                reason,
                image_url: request.complaint.as_ref().and_then(|c| c.image_url.clone()),
                date: now,
                status: ComplaintStatus::Pending,
            })
        },
        None => {},
    }
    update.resolve_complaint = edge.resolves_complaint;
    if edge.settles {
        update.settlement = Some(Transaction::payment_for(order, now));
    }
    Ok(update)
}
