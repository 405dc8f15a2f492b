use crate::{
    db_types::{CatalogItem, MerchantListing, NewCatalogItem, ProfileUpdate, UserId, UserProfile},
    traits::StoreError,
};

#[allow(async_fn_in_trait)]
pub trait ProfileManagement {
    async fn fetch_profile(&self, user_id: &UserId) -> Result<Option<UserProfile>, StoreError>;

    /// Creates or updates the profile. A merchant's rating aggregate is never touched.
    async fn upsert_profile(&self, user_id: &UserId, update: ProfileUpdate) -> Result<UserProfile, StoreError>;

    /// Every merchant together with their catalogue.
    async fn fetch_merchants(&self) -> Result<Vec<MerchantListing>, StoreError>;

    async fn fetch_catalog(&self, merchant_id: &UserId) -> Result<Vec<CatalogItem>, StoreError>;

    /// Replaces the merchant's catalogue wholesale, preserving the given order of items.
    async fn replace_catalog(
        &self,
        merchant_id: &UserId,
        items: Vec<NewCatalogItem>,
    ) -> Result<Vec<CatalogItem>, StoreError>;
}
