use log::*;
use serde::{Deserialize, Serialize};

use crate::{
    db_types::{BodyMeasurements, NewOrder, Rupiah, UserId},
    market_api::errors::MarketError,
    traits::{collaborators::ShippingQuoter, ProfileManagement},
};

pub const PICK_UP: &str = "Pick Up";
/// Cash on delivery. The only payment method that needs no proof up front.
pub const CASH_ON_DELIVERY: &str = "COD";

/// What a customer fills in at checkout for one catalogue item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckoutRequest {
    pub merchant_id: UserId,
    pub item_id: String,
    /// Courier code, e.g. `jne`. `None` means the customer collects the garment.
    pub courier: Option<String>,
    /// The courier service picked from the quotes, e.g. `REG`.
    pub service: Option<String>,
    pub address: String,
    pub city: String,
    pub payment_method: String,
    pub payment_proof_url: Option<String>,
    #[serde(default)]
    pub measurements: BodyMeasurements,
    #[serde(default)]
    pub notes: String,
}

/// Turns a checkout form into a [`NewOrder`], pricing the item plus shipping.
#[derive(Debug)]
pub struct CheckoutApi<B, Q> {
    db: B,
    quoter: Q,
}

impl<B, Q> CheckoutApi<B, Q>
where
    B: ProfileManagement,
    Q: ShippingQuoter,
{
    pub fn new(db: B, quoter: Q) -> Self {
        Self { db, quoter }
    }

    pub async fn prepare_order(&self, actor: &UserId, request: CheckoutRequest) -> Result<NewOrder, MarketError> {
        let customer = self
            .db
            .fetch_profile(actor)
            .await?
            .ok_or_else(|| MarketError::NotFound(format!("Profile of {actor}")))?;
        let merchant_id = &request.merchant_id;
        let merchant = self
            .db
            .fetch_profile(merchant_id)
            .await?
            .ok_or_else(|| MarketError::NotFound(format!("Merchant {merchant_id}")))?;
        let item = self
            .db
            .fetch_catalog(merchant_id)
            .await?
            .into_iter()
            .find(|i| i.id == request.item_id)
            .ok_or_else(|| MarketError::NotFound(format!("Catalogue item {}", request.item_id)))?;
        let item_price =
            item.price.ok_or_else(|| MarketError::InvalidInput(format!("{} has no price yet", item.title)))?;
        if request.address.trim().is_empty() {
            return Err(MarketError::MissingField("address"));
        }
        if request.payment_method.trim().is_empty() {
            return Err(MarketError::MissingField("payment_method"));
        }
        let has_proof = request.payment_proof_url.as_deref().map(|u| !u.trim().is_empty()).unwrap_or(false);
        if request.payment_method != CASH_ON_DELIVERY && !has_proof {
            return Err(MarketError::MissingField("payment_proof_url"));
        }
        let (shipping_method, shipping_cost) = match (&request.courier, &request.service) {
            (Some(courier), Some(service)) => {
                let origin = merchant.address.clone().unwrap_or_default();
                let quotes = self.quoter.quote(&origin, &request.city, courier).await?;
                let quote = quotes
                    .into_iter()
                    .find(|q| &q.service == service)
                    .ok_or_else(|| MarketError::InvalidInput(format!("{courier} does not offer {service}")))?;
                (format!("{} - {}", courier.to_uppercase(), quote.service), quote.cost)
            },
            (None, None) => (PICK_UP.to_string(), Rupiah::default()),
            (Some(_), None) => return Err(MarketError::MissingField("service")),
            (None, Some(_)) => return Err(MarketError::MissingField("courier")),
        };
        let price = item_price + shipping_cost;
        let address = format!("{}, {}", request.address.trim(), request.city.trim());
        debug!("🔄️📦️ Checkout of {} for {actor}: {item_price} + {shipping_cost} shipping", item.title);
        let order = NewOrder::new(actor.clone(), merchant_id.clone(), item.title.clone(), price)
            .with_names(customer.name.clone(), merchant.display_name().to_string())
            .with_image_url(item.image_url)
            .with_measurements(request.measurements)
            .with_payment(request.payment_method, request.payment_proof_url)
            .with_shipping(shipping_method, address)
            .with_notes(request.notes);
        Ok(order)
    }
}
