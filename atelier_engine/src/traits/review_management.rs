use crate::{
    db_types::{NewReview, Review, UserId},
    traits::{ReviewReceipt, StoreError},
};

#[allow(async_fn_in_trait)]
pub trait ReviewManagement {
    /// Records a review and folds its rating into the merchant's aggregate.
    ///
    /// In one atomic transaction:
    /// * the order is marked as reviewed, provided it is `Completed` and not yet reviewed
    ///   ([`StoreError::NotReviewable`] otherwise),
    /// * the merchant's `(rating, review_count)` is read and the new running mean computed,
    /// * the review is inserted,
    /// * the merchant aggregate is written back.
    ///
    /// Concurrent submissions against the same merchant are serialized by the backend; a submission that loses a
    /// race returns [`StoreError::Conflict`] having written nothing.
    async fn record_review(&self, review: NewReview) -> Result<ReviewReceipt, StoreError>;

    /// Reviews for the merchant, newest first.
    async fn fetch_reviews_for_merchant(&self, merchant_id: &UserId) -> Result<Vec<Review>, StoreError>;
}
