//! Capabilities the marketplace consumes but does not implement.
//!
//! Production deployments plug real providers in behind these traits. The engine ships the offline fallbacks used
//! when no provider is configured: [`OfflineStylist`] and [`FlatRateQuoter`].
use std::fmt::Display;

use atelier_common::Rupiah;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db_types::UserId;

#[derive(Debug, Clone, Error)]
pub enum CollaboratorError {
    #[error("The {0} provider is unavailable: {1}")]
    Unavailable(&'static str, String),
    #[error("The {0} provider rejected the request: {1}")]
    Rejected(&'static str, String),
}

//--------------------------------------       Identity        ---------------------------------------------------------
/// The caller, as asserted by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: UserId,
    /// Whether the user completed email verification. Unverified users may not use the marketplace.
    pub verified: bool,
}

#[allow(async_fn_in_trait)]
pub trait IdentityProvider {
    async fn current_identity(&self) -> Result<Identity, CollaboratorError>;
}

//--------------------------------------      ImageStore       ---------------------------------------------------------
#[allow(async_fn_in_trait)]
pub trait ImageStore {
    /// Stores the bytes and returns an opaque URL for them.
    async fn upload(&self, bytes: Vec<u8>, filename: &str) -> Result<String, CollaboratorError>;
}

//--------------------------------------     Style advice      ---------------------------------------------------------
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdviceLanguage {
    #[default]
    En,
    Id,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleAdviceRequest {
    pub occasion: String,
    pub preferences: String,
    pub body_type: String,
    #[serde(default)]
    pub language: AdviceLanguage,
}

impl StyleAdviceRequest {
    /// The instruction handed to a text-generation provider.
    pub fn prompt(&self) -> String {
        let answer_in = match self.language {
            AdviceLanguage::En => "Answer in English.",
            AdviceLanguage::Id => "Answer in Indonesian.",
        };
        format!(
            "You are an expert fashion stylist for a custom-tailoring marketplace.\n\nUser Profile:\n- Occasion: {}\n- \
             Style Preferences: {}\n- Self-described Body Type: {}\n\nPlease provide a concise, friendly, and \
             professional fashion recommendation. Focus on fabric choice, cut/silhouette, and color palette. \
             {answer_in} Keep it under 100 words.",
            self.occasion, self.preferences, self.body_type
        )
    }

    /// What to tell the user when the provider fails.
    pub fn apology(&self) -> &'static str {
        match self.language {
            AdviceLanguage::En => "Sorry, our AI stylist is currently offline. Please try again later.",
            AdviceLanguage::Id => "Maaf, stylist AI kami sedang offline. Silakan coba lagi nanti.",
        }
    }
}

#[allow(async_fn_in_trait)]
pub trait StyleAdvisor {
    async fn advise(&self, request: &StyleAdviceRequest) -> Result<String, CollaboratorError>;
}

/// Canned recommendations for deployments without a text-generation provider.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineStylist;

impl StyleAdvisor for OfflineStylist {
    async fn advise(&self, request: &StyleAdviceRequest) -> Result<String, CollaboratorError> {
        let StyleAdviceRequest { occasion, preferences, body_type, language } = request;
        let advice = match language {
            AdviceLanguage::En => format!(
                "Based on your {body_type} body type and the occasion ({occasion}), we recommend an A-line silhouette \
                 with {preferences} fabrics. This will accentuate your best features while providing comfort."
            ),
            AdviceLanguage::Id => format!(
                "Berdasarkan tipe tubuh {body_type} dan acara ({occasion}), kami merekomendasikan siluet A-line dengan \
                 kain {preferences}. Ini akan menonjolkan fitur terbaik Anda sekaligus memberikan kenyamanan."
            ),
        };
        Ok(advice)
    }
}

//--------------------------------------    Shipping quotes    ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingQuote {
    pub service: String,
    pub description: String,
    pub cost: Rupiah,
    pub eta_days: String,
}

impl Display for ShippingQuote {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}) {} / {} days", self.service, self.description, self.cost, self.eta_days)
    }
}

#[allow(async_fn_in_trait)]
pub trait ShippingQuoter {
    async fn quote(
        &self,
        origin: &str,
        destination: &str,
        carrier: &str,
    ) -> Result<Vec<ShippingQuote>, CollaboratorError>;
}

/// Fixed domestic rates, independent of route and carrier.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlatRateQuoter;

impl ShippingQuoter for FlatRateQuoter {
    async fn quote(
        &self,
        _origin: &str,
        destination: &str,
        carrier: &str,
    ) -> Result<Vec<ShippingQuote>, CollaboratorError> {
        if destination.trim().is_empty() || carrier.trim().is_empty() {
            return Err(CollaboratorError::Rejected("shipping", "A destination and carrier are required".into()));
        }
        let quote = |service: &str, description: &str, cost: i64, eta: &str| ShippingQuote {
            service: service.to_string(),
            description: description.to_string(),
            cost: Rupiah::from(cost),
            eta_days: eta.to_string(),
        };
        Ok(vec![
            quote("OKE", "Ongkos Kirim Ekonomis", 18_000, "3-4"),
            quote("REG", "Layanan Reguler", 22_000, "1-2"),
            quote("YES", "Yakin Esok Sampai", 35_000, "1"),
        ])
    }
}
