use std::{fmt::Display, str::FromStr};

pub use atelier_common::Rupiah;
use chrono::{DateTime, SubsecRound, Utc};
use log::error;
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteRow, FromRow, Row, Type};
use thiserror::Error;

/// The store-assigned clock. Timestamps are truncated to milliseconds so that their text encoding sorts
/// chronologically.
pub fn store_timestamp() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

pub(crate) fn new_document_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

#[derive(Debug, Clone, Error)]
#[error("Conversion error: {0}")]
pub struct ConversionError(String);

//--------------------------------------        UserId         ---------------------------------------------------------
/// The identity of a customer, merchant or admin as issued by the identity provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for UserId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

//--------------------------------------        OrderId        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct OrderId(pub String);

impl OrderId {
    pub fn random() -> Self {
        Self(new_document_id())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for OrderId {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Err(ConversionError("Order id cannot be empty".into()));
        }
        Ok(Self(s.to_string()))
    }
}

impl From<String> for OrderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

//--------------------------------------    ConversationId     ---------------------------------------------------------
/// The key of the conversation between two users.
///
/// It is a pure function of the unordered pair of participants: both parties compute the same id without a lookup,
/// so a pair can never end up with two conversation documents.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct ConversationId(String);

const PAIR_SEPARATOR: char = '_';
const ESCAPE: char = '~';

// Neither escaped half contains the separator, so the pair can always be split back apart.
fn escape_user_id(id: &UserId) -> String {
    let mut escaped = String::with_capacity(id.as_str().len());
    for c in id.as_str().chars() {
        match c {
            ESCAPE => escaped.push_str("~t"),
            PAIR_SEPARATOR => escaped.push_str("~u"),
            c => escaped.push(c),
        }
    }
    escaped
}

fn unescape_user_id(s: &str) -> Option<UserId> {
    let mut id = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        match c {
            ESCAPE => match chars.next()? {
                't' => id.push(ESCAPE),
                'u' => id.push(PAIR_SEPARATOR),
                _ => return None,
            },
            PAIR_SEPARATOR => return None,
            c => id.push(c),
        }
    }
    (!id.is_empty()).then(|| UserId(id))
}

impl ConversationId {
    /// `sari` and `rina` talk in `rina_sari`. A `_` or `~` inside a user id is escaped as `~u` or `~t`, so distinct
    /// pairs never share a key.
    pub fn for_pair(a: &UserId, b: &UserId) -> Self {
        let (first, second) = if a <= b { (a, b) } else { (b, a) };
        Self(format!("{}{PAIR_SEPARATOR}{}", escape_user_id(first), escape_user_id(second)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Splits the id back into its ordered participant pair. `None` if this is not the key of any pair.
    pub fn participants(&self) -> Option<(UserId, UserId)> {
        let (a, b) = self.0.split_once(PAIR_SEPARATOR)?;
        let (a, b) = (unescape_user_id(a)?, unescape_user_id(b)?);
        (a <= b).then_some((a, b))
    }

    /// True if `user` is one of the two ids this conversation key was derived from.
    pub fn involves(&self, user: &UserId) -> bool {
        self.participants().map(|(a, b)| &a == user || &b == user).unwrap_or(false)
    }
}

impl FromStr for ConversationId {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id = Self(s.to_string());
        match id.participants() {
            Some(_) => Ok(id),
            None => Err(ConversionError(format!("{s} is not a conversation id"))),
        }
    }
}

impl Display for ConversationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

//--------------------------------------         Role          ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize, Default)]
pub enum Role {
    #[default]
    Customer,
    Merchant,
    Admin,
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Customer => write!(f, "Customer"),
            Role::Merchant => write!(f, "Merchant"),
            Role::Admin => write!(f, "Admin"),
        }
    }
}

impl FromStr for Role {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Customer" => Ok(Self::Customer),
            "Merchant" => Ok(Self::Merchant),
            "Admin" => Ok(Self::Admin),
            s => Err(ConversionError(format!("Invalid role: {s}"))),
        }
    }
}

//--------------------------------------   OrderStatusType     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
pub enum OrderStatusType {
    /// The customer and merchant are agreeing on the garment. The only state from which the order can be cancelled.
    Consultation,
    Design,
    Production,
    Finishing,
    /// Handed to the courier. A tracking number is always present from here on.
    Shipped,
    /// Received by the customer, or a complaint was resolved by the merchant. Terminal.
    Completed,
    /// Cancelled by the customer during consultation. Terminal.
    Cancelled,
    /// The customer raised a complaint about a shipped order.
    Complaint,
}

impl OrderStatusType {
    pub const ALL: [OrderStatusType; 8] = [
        OrderStatusType::Consultation,
        OrderStatusType::Design,
        OrderStatusType::Production,
        OrderStatusType::Finishing,
        OrderStatusType::Shipped,
        OrderStatusType::Completed,
        OrderStatusType::Cancelled,
        OrderStatusType::Complaint,
    ];

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatusType::Completed | OrderStatusType::Cancelled)
    }
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OrderStatusType::Consultation => "Consultation",
            OrderStatusType::Design => "Design",
            OrderStatusType::Production => "Production",
            OrderStatusType::Finishing => "Finishing",
            OrderStatusType::Shipped => "Shipped",
            OrderStatusType::Completed => "Completed",
            OrderStatusType::Cancelled => "Cancelled",
            OrderStatusType::Complaint => "Complaint",
        };
        f.write_str(s)
    }
}

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.to_string() == s)
            .ok_or_else(|| ConversionError(format!("Invalid order status: {s}")))
    }
}

impl From<String> for OrderStatusType {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid order status: {value}. But this conversion cannot fail. Defaulting to Consultation");
            OrderStatusType::Consultation
        })
    }
}

//--------------------------------------   BodyMeasurements    ---------------------------------------------------------
/// Seven body measurements in centimetres (weight in kilograms).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BodyMeasurements {
    pub height: f64,
    pub weight: f64,
    pub bust: f64,
    pub waist: f64,
    pub hips: f64,
    pub shoulder: f64,
    pub sleeve_length: f64,
}

impl BodyMeasurements {
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            height: row.try_get("height")?,
            weight: row.try_get("weight")?,
            bust: row.try_get("bust")?,
            waist: row.try_get("waist")?,
            hips: row.try_get("hips")?,
            shoulder: row.try_get("shoulder")?,
            sleeve_length: row.try_get("sleeve_length")?,
        })
    }

    /// For nullable profile columns: measurements are present only once the user has saved them.
    fn from_optional_row(row: &SqliteRow) -> Result<Option<Self>, sqlx::Error> {
        let height: Option<f64> = row.try_get("height")?;
        match height {
            Some(_) => Ok(Some(Self {
                height: row.try_get::<Option<f64>, _>("height")?.unwrap_or_default(),
                weight: row.try_get::<Option<f64>, _>("weight")?.unwrap_or_default(),
                bust: row.try_get::<Option<f64>, _>("bust")?.unwrap_or_default(),
                waist: row.try_get::<Option<f64>, _>("waist")?.unwrap_or_default(),
                hips: row.try_get::<Option<f64>, _>("hips")?.unwrap_or_default(),
                shoulder: row.try_get::<Option<f64>, _>("shoulder")?.unwrap_or_default(),
                sleeve_length: row.try_get::<Option<f64>, _>("sleeve_length")?.unwrap_or_default(),
            })),
            None => Ok(None),
        }
    }
}

//--------------------------------------       Complaint       ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum ComplaintStatus {
    Pending,
    Resolved,
}

impl Display for ComplaintStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ComplaintStatus::Pending => write!(f, "Pending"),
            ComplaintStatus::Resolved => write!(f, "Resolved"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Complaint {
    pub reason: String,
    pub image_url: Option<String>,
    pub date: DateTime<Utc>,
    pub status: ComplaintStatus,
}

//--------------------------------------         Order         ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub customer_id: UserId,
    pub merchant_id: UserId,
    pub customer_name: String,
    pub merchant_name: String,
    pub design_name: String,
    pub image_url: String,
    pub status: OrderStatusType,
    pub price: Rupiah,
    pub payment_method: String,
    pub payment_proof_url: Option<String>,
    pub shipping_method: String,
    pub shipping_address: String,
    pub tracking_number: Option<String>,
    pub measurements: BodyMeasurements,
    pub customer_notes: String,
    pub cancellation_reason: Option<String>,
    pub complaint: Option<Complaint>,
    pub is_reviewed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn involves(&self, user: &UserId) -> bool {
        &self.customer_id == user || &self.merchant_id == user
    }
}

impl<'r> FromRow<'r, SqliteRow> for Order {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let complaint = match row.try_get::<Option<String>, _>("complaint_reason")? {
            Some(reason) => Some(Complaint {
                reason,
                image_url: row.try_get("complaint_image_url")?,
                date: row.try_get::<Option<DateTime<Utc>>, _>("complaint_date")?.unwrap_or_default(),
                status: row.try_get::<Option<ComplaintStatus>, _>("complaint_status")?.unwrap_or(ComplaintStatus::Pending),
            }),
            None => None,
        };
        Ok(Self {
            id: row.try_get("id")?,
            customer_id: row.try_get("customer_id")?,
            merchant_id: row.try_get("merchant_id")?,
            customer_name: row.try_get("customer_name")?,
            merchant_name: row.try_get("merchant_name")?,
            design_name: row.try_get("design_name")?,
            image_url: row.try_get("image_url")?,
            status: row.try_get("status")?,
            price: row.try_get("price")?,
            payment_method: row.try_get("payment_method")?,
            payment_proof_url: row.try_get("payment_proof_url")?,
            shipping_method: row.try_get("shipping_method")?,
            shipping_address: row.try_get("shipping_address")?,
            tracking_number: row.try_get("tracking_number")?,
            measurements: BodyMeasurements::from_row(row)?,
            customer_notes: row.try_get("customer_notes")?,
            cancellation_reason: row.try_get("cancellation_reason")?,
            complaint,
            is_reviewed: row.try_get("is_reviewed")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

//--------------------------------------       NewOrder        ---------------------------------------------------------
/// An order as placed at checkout. Status, review flag and timestamps are assigned by the store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewOrder {
    pub customer_id: UserId,
    pub merchant_id: UserId,
    pub customer_name: String,
    pub merchant_name: String,
    pub design_name: String,
    pub image_url: String,
    pub price: Rupiah,
    pub payment_method: String,
    pub payment_proof_url: Option<String>,
    pub shipping_method: String,
    pub shipping_address: String,
    pub measurements: BodyMeasurements,
    pub customer_notes: String,
}

impl NewOrder {
    pub fn new<C: Into<UserId>, M: Into<UserId>, S: Into<String>>(
        customer_id: C,
        merchant_id: M,
        design_name: S,
        price: Rupiah,
    ) -> Self {
        Self {
            customer_id: customer_id.into(),
            merchant_id: merchant_id.into(),
            design_name: design_name.into(),
            price,
            ..Default::default()
        }
    }

    pub fn with_names<S: Into<String>>(mut self, customer_name: S, merchant_name: S) -> Self {
        self.customer_name = customer_name.into();
        self.merchant_name = merchant_name.into();
        self
    }

    pub fn with_measurements(mut self, measurements: BodyMeasurements) -> Self {
        self.measurements = measurements;
        self
    }

    pub fn with_payment<S: Into<String>>(mut self, method: S, proof_url: Option<String>) -> Self {
        self.payment_method = method.into();
        self.payment_proof_url = proof_url;
        self
    }

    pub fn with_shipping<S: Into<String>>(mut self, method: S, address: S) -> Self {
        self.shipping_method = method.into();
        self.shipping_address = address.into();
        self
    }

    pub fn with_notes<S: Into<String>>(mut self, notes: S) -> Self {
        self.customer_notes = notes.into();
        self
    }

    pub fn with_image_url<S: Into<String>>(mut self, url: S) -> Self {
        self.image_url = url.into();
        self
    }
}

//--------------------------------------        Review         ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Review {
    pub id: String,
    pub merchant_id: UserId,
    pub order_id: OrderId,
    pub customer_id: UserId,
    pub rating: u8,
    pub comment: String,
    pub reviewer_name: String,
    pub image_url: Option<String>,
    #[sqlx(rename = "created_at")]
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewReview {
    pub merchant_id: UserId,
    pub order_id: OrderId,
    pub customer_id: UserId,
    pub rating: u8,
    pub comment: String,
    pub reviewer_name: String,
    pub image_url: Option<String>,
}

impl NewReview {
    pub const MIN_RATING: u8 = 1;
    pub const MAX_RATING: u8 = 5;

    pub fn new<M: Into<UserId>, C: Into<UserId>>(merchant_id: M, order_id: OrderId, customer_id: C, rating: u8) -> Self {
        Self {
            merchant_id: merchant_id.into(),
            order_id,
            customer_id: customer_id.into(),
            rating,
            comment: String::default(),
            reviewer_name: String::default(),
            image_url: None,
        }
    }

    pub fn with_comment<S: Into<String>>(mut self, reviewer_name: S, comment: S) -> Self {
        self.reviewer_name = reviewer_name.into();
        self.comment = comment.into();
        self
    }

    pub fn with_image_url<S: Into<String>>(mut self, url: S) -> Self {
        self.image_url = Some(url.into());
        self
    }
}

//--------------------------------------    RatingAggregate    ---------------------------------------------------------
/// A merchant's public reputation: the running mean of exactly `review_count` ratings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RatingAggregate {
    pub rating: f64,
    pub review_count: i64,
}

impl RatingAggregate {
    pub fn new(rating: f64, review_count: i64) -> Self {
        Self { rating, review_count }
    }

    /// Folds one more rating into the running mean.
    pub fn fold(self, incoming: u8) -> Self {
        let review_count = self.review_count + 1;
        #[allow(clippy::cast_precision_loss)]
        let rating = (self.rating * self.review_count as f64 + f64::from(incoming)) / review_count as f64;
        Self { rating, review_count }
    }
}

//--------------------------------------      Transaction      ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum TransactionStatus {
    Success,
    Pending,
    Failed,
}

impl Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionStatus::Success => write!(f, "Success"),
            TransactionStatus::Pending => write!(f, "Pending"),
            TransactionStatus::Failed => write!(f, "Failed"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum TransactionType {
    Payment,
    Payout,
}

impl Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionType::Payment => write!(f, "Payment"),
            TransactionType::Payout => write!(f, "Payout"),
        }
    }
}

/// An append-only ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub order_id: OrderId,
    pub merchant_id: UserId,
    pub customer_id: UserId,
    pub amount: Rupiah,
    pub description: String,
    pub status: TransactionStatus,
    pub tx_type: TransactionType,
    #[sqlx(rename = "created_at")]
    pub date: DateTime<Utc>,
}

impl Transaction {
    /// The ledger entry written when the customer confirms receipt of an order.
    pub fn payment_for(order: &Order, date: DateTime<Utc>) -> Self {
        Self {
            id: new_document_id(),
            order_id: order.id.clone(),
            merchant_id: order.merchant_id.clone(),
            customer_id: order.customer_id.clone(),
            amount: order.price,
            description: format!("Payment for order {}", order.design_name),
            status: TransactionStatus::Success,
            tx_type: TransactionType::Payment,
            date,
        }
    }
}

//--------------------------------------     Conversation      ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: ConversationId,
    pub participants: [UserId; 2],
    pub participant_names: [String; 2],
    pub last_message: String,
    pub last_message_at: Option<DateTime<Utc>>,
    pub last_sender_id: Option<UserId>,
    pub created_at: DateTime<Utc>,
}

impl Conversation {
    pub fn has_participant(&self, user: &UserId) -> bool {
        self.participants.contains(user)
    }

    /// The participant that is not `me`, with their cached display name.
    pub fn counterpart(&self, me: &UserId) -> (&UserId, &str) {
        if &self.participants[0] == me {
            (&self.participants[1], self.participant_names[1].as_str())
        } else {
            (&self.participants[0], self.participant_names[0].as_str())
        }
    }
}

impl<'r> FromRow<'r, SqliteRow> for Conversation {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            participants: [row.try_get("participant_a")?, row.try_get("participant_b")?],
            participant_names: [row.try_get("name_a")?, row.try_get("name_b")?],
            last_message: row.try_get("last_message")?,
            last_message_at: row.try_get("last_message_at")?,
            last_sender_id: row.try_get("last_sender_id")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

//--------------------------------------      ChatMessage      ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub conversation_id: ConversationId,
    /// Position in the conversation. Agrees with `timestamp` order, and breaks no ties because timestamps within a
    /// conversation are strictly increasing.
    pub seq: i64,
    pub sender_id: UserId,
    pub sender_name: String,
    pub text: String,
    pub attachment_url: Option<String>,
    #[sqlx(rename = "created_at")]
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMessage {
    pub sender_id: UserId,
    pub sender_name: String,
    pub text: String,
    pub attachment_url: Option<String>,
}

impl NewMessage {
    pub fn text<U: Into<UserId>, S: Into<String>>(sender_id: U, sender_name: S, text: S) -> Self {
        Self { sender_id: sender_id.into(), sender_name: sender_name.into(), text: text.into(), attachment_url: None }
    }

    pub fn with_attachment<S: Into<String>>(mut self, url: S) -> Self {
        self.attachment_url = Some(url.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty() && self.attachment_url.as_ref().map(|u| u.trim().is_empty()).unwrap_or(true)
    }

    /// The text shown in the conversation list for this message.
    pub fn summary_text(&self) -> String {
        if !self.text.trim().is_empty() {
            self.text.clone()
        } else if self.attachment_url.is_some() {
            "Image".to_string()
        } else {
            "New Message".to_string()
        }
    }
}

//--------------------------------------      CatalogItem      ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: String,
    pub title: String,
    pub image_url: String,
    pub description: String,
    pub price: Option<Rupiah>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCatalogItem {
    pub title: String,
    pub image_url: String,
    pub description: String,
    pub price: Option<Rupiah>,
}

//--------------------------------------      UserProfile      ---------------------------------------------------------
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankDetails {
    pub bank_name: String,
    pub account_number: String,
    pub account_holder: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EWalletDetails {
    pub wallet_name: String,
    pub phone_number: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub brand_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub bio: Option<String>,
    pub photo_url: Option<String>,
    pub body_fit_photo_url: Option<String>,
    pub measurements: Option<BodyMeasurements>,
    pub bank: Option<BankDetails>,
    pub e_wallet: Option<EWalletDetails>,
    /// Maintained exclusively by the rating aggregator.
    pub rating: f64,
    /// Maintained exclusively by the rating aggregator.
    pub review_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserProfile {
    pub fn aggregate(&self) -> RatingAggregate {
        RatingAggregate::new(self.rating, self.review_count)
    }

    /// The name customers see for a merchant: the brand if one is set.
    pub fn display_name(&self) -> &str {
        self.brand_name.as_deref().filter(|b| !b.trim().is_empty()).unwrap_or(&self.name)
    }
}

impl<'r> FromRow<'r, SqliteRow> for UserProfile {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let bank = match row.try_get::<Option<String>, _>("bank_name")? {
            Some(bank_name) => Some(BankDetails {
                bank_name,
                account_number: row.try_get::<Option<String>, _>("account_number")?.unwrap_or_default(),
                account_holder: row.try_get::<Option<String>, _>("account_holder")?.unwrap_or_default(),
            }),
            None => None,
        };
        let e_wallet = match row.try_get::<Option<String>, _>("wallet_name")? {
            Some(wallet_name) => Some(EWalletDetails {
                wallet_name,
                phone_number: row.try_get::<Option<String>, _>("wallet_phone")?.unwrap_or_default(),
            }),
            None => None,
        };
        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            role: row.try_get("role")?,
            brand_name: row.try_get("brand_name")?,
            phone: row.try_get("phone")?,
            address: row.try_get("address")?,
            bio: row.try_get("bio")?,
            photo_url: row.try_get("photo_url")?,
            body_fit_photo_url: row.try_get("body_fit_photo_url")?,
            measurements: BodyMeasurements::from_optional_row(row)?,
            bank,
            e_wallet,
            rating: row.try_get("rating")?,
            review_count: row.try_get("review_count")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

/// The profile fields a user may write about themselves. The rating aggregate is deliberately absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: Role,
    pub brand_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub bio: Option<String>,
    pub photo_url: Option<String>,
    pub body_fit_photo_url: Option<String>,
    pub measurements: Option<BodyMeasurements>,
    pub bank: Option<BankDetails>,
    pub e_wallet: Option<EWalletDetails>,
}

/// A merchant as shown in the catalogue browser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MerchantListing {
    pub profile: UserProfile,
    pub catalog: Vec<CatalogItem>,
}
