use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{CatalogItem, MerchantListing, NewCatalogItem, ProfileUpdate, Role, UserId, UserProfile},
    live::{ChangeFeed, Topic},
    market_api::errors::MarketError,
    traits::ProfileManagement,
};

/// User profiles and merchant catalogues.
pub struct ProfileApi<B> {
    db: B,
    feed: ChangeFeed,
}

impl<B> Debug for ProfileApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ProfileApi")
    }
}

impl<B> ProfileApi<B> {
    pub fn new(db: B, feed: ChangeFeed) -> Self {
        Self { db, feed }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> ProfileApi<B>
where B: ProfileManagement
{
    pub async fn profile(&self, user_id: &UserId) -> Result<UserProfile, MarketError> {
        self.db.fetch_profile(user_id).await?.ok_or_else(|| MarketError::NotFound(format!("Profile of {user_id}")))
    }

    /// Saves the profile of `user_id`. Users may only write their own profile.
    pub async fn save_profile(
        &self,
        actor: &UserId,
        user_id: &UserId,
        update: ProfileUpdate,
    ) -> Result<UserProfile, MarketError> {
        if actor != user_id {
            return Err(MarketError::Forbidden(format!("{actor} cannot edit the profile of {user_id}")));
        }
        if update.name.trim().is_empty() {
            return Err(MarketError::MissingField("name"));
        }
        if let Some(existing) = self.db.fetch_profile(user_id).await? {
            if existing.role != update.role && existing.role != Role::Customer {
                return Err(MarketError::Forbidden(format!("{user_id} cannot change role from {}", existing.role)));
            }
        }
        let profile = self.db.upsert_profile(user_id, update).await?;
        info!("🔐️ Profile of {user_id} saved ({})", profile.role);
        if profile.role == Role::Merchant {
            self.feed.publish(vec![Topic::MerchantProfile(user_id.clone())]);
        }
        Ok(profile)
    }

    /// Every merchant with their catalogue, best rated first.
    pub async fn merchants(&self) -> Result<Vec<MerchantListing>, MarketError> {
        let merchants = self.db.fetch_merchants().await?;
        Ok(merchants)
    }

    pub async fn catalog(&self, merchant_id: &UserId) -> Result<Vec<CatalogItem>, MarketError> {
        let items = self.db.fetch_catalog(merchant_id).await?;
        Ok(items)
    }

    pub async fn replace_catalog(
        &self,
        actor: &UserId,
        items: Vec<NewCatalogItem>,
    ) -> Result<Vec<CatalogItem>, MarketError> {
        let profile = self.profile(actor).await?;
        if profile.role != Role::Merchant {
            return Err(MarketError::Forbidden(format!("{actor} is not a merchant")));
        }
        if let Some(item) = items.iter().find(|i| i.price.map(|p| p.is_negative()).unwrap_or(false)) {
            return Err(MarketError::InvalidInput(format!("{} has a negative price", item.title)));
        }
        if items.iter().any(|i| i.title.trim().is_empty()) {
            return Err(MarketError::MissingField("title"));
        }
        let catalog = self.db.replace_catalog(actor, items).await?;
        debug!("🔐️ {actor} now lists {} catalogue items", catalog.len());
        self.feed.publish(vec![Topic::MerchantProfile(actor.clone())]);
        Ok(catalog)
    }
}
