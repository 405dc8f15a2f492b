use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{NewReview, OrderStatusType, Review, UserId},
    events::{EventProducers, ReviewSubmittedEvent},
    live::{ChangeFeed, Topic},
    market_api::{errors::MarketError, retry::RetryPolicy},
    traits::{OrderManagement, ReviewManagement, ReviewReceipt, StoreError},
};

/// The Rating Aggregator.
///
/// A submission marks the order as reviewed, stores the review and folds the rating into the merchant's running
/// mean in one atomic write. Submissions that lose a race against another review of the same merchant are re-checked
/// and retried with backoff until the [`RetryPolicy`] is exhausted.
pub struct ReviewApi<B> {
    db: B,
    producers: EventProducers,
    feed: ChangeFeed,
    retry: RetryPolicy,
}

impl<B> Debug for ReviewApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ReviewApi ({} attempts)", self.retry.max_attempts)
    }
}

impl<B> ReviewApi<B> {
    pub fn new(db: B, producers: EventProducers, feed: ChangeFeed) -> Self {
        Self { db, producers, feed, retry: RetryPolicy::default() }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> ReviewApi<B>
where B: OrderManagement + ReviewManagement
{
    pub async fn submit_review(&self, actor: &UserId, review: NewReview) -> Result<ReviewReceipt, MarketError> {
        if !(NewReview::MIN_RATING..=NewReview::MAX_RATING).contains(&review.rating) {
            return Err(MarketError::InvalidInput(format!("A rating must be between 1 and 5, not {}", review.rating)));
        }
        if &review.customer_id != actor {
            return Err(MarketError::Forbidden(format!("{actor} cannot review on behalf of {}", review.customer_id)));
        }
        let mut attempt = 0;
        let receipt = loop {
            attempt += 1;
            // Re-checked on every attempt: a retry must never double count a review that already landed
            self.check_reviewable(&review).await?;
            match self.db.record_review(review.clone()).await {
                Ok(receipt) => break receipt,
                Err(StoreError::Conflict(reason)) => {
                    if attempt >= self.retry.max_attempts {
                        warn!("⭐️ Giving up on review of {} after {attempt} attempts: {reason}", review.order_id);
                        return Err(MarketError::AggregationFailed { attempts: attempt });
                    }
                    debug!("⭐️ Review of {} lost a race (attempt {attempt}): {reason}", review.order_id);
                    tokio::time::sleep(self.retry.backoff(attempt)).await;
                },
                Err(e) => return Err(e.into()),
            }
        };
        info!(
            "⭐️ {} rated {} {}/5. New aggregate {:.3} over {} reviews",
            receipt.review.customer_id,
            receipt.review.merchant_id,
            receipt.review.rating,
            receipt.merchant_aggregate.rating,
            receipt.merchant_aggregate.review_count
        );
        self.notify(&receipt).await;
        Ok(receipt)
    }

    /// Reviews of `merchant_id`, newest first.
    pub async fn reviews_for(&self, merchant_id: &UserId) -> Result<Vec<Review>, MarketError> {
        let reviews = self.db.fetch_reviews_for_merchant(merchant_id).await?;
        Ok(reviews)
    }

    async fn check_reviewable(&self, review: &NewReview) -> Result<(), MarketError> {
        let order_id = &review.order_id;
        let order = self
            .db
            .fetch_order(order_id)
            .await?
            .ok_or_else(|| MarketError::NotReviewable(format!("Order {order_id} does not exist")))?;
        if order.merchant_id != review.merchant_id {
            return Err(MarketError::NotReviewable(format!("Order {order_id} is not an order of {}", review.merchant_id)));
        }
        if order.customer_id != review.customer_id {
            return Err(MarketError::Forbidden(format!("{} did not place order {order_id}", review.customer_id)));
        }
        if order.status != OrderStatusType::Completed {
            return Err(MarketError::NotReviewable(format!("Order {order_id} is {}, not Completed", order.status)));
        }
        if order.is_reviewed {
            return Err(MarketError::NotReviewable(format!("Order {order_id} has already been reviewed")));
        }
        Ok(())
    }

    async fn notify(&self, receipt: &ReviewReceipt) {
        let merchant = receipt.review.merchant_id.clone();
        let mut topics = Topic::for_order(&receipt.order);
        topics.push(Topic::MerchantReviews(merchant.clone()));
        topics.push(Topic::MerchantProfile(merchant));
        self.feed.publish(topics);
        for emitter in &self.producers.review_submitted_producer {
            let event =
                ReviewSubmittedEvent { review: receipt.review.clone(), merchant_aggregate: receipt.merchant_aggregate };
            emitter.publish_event(event).await;
        }
    }
}
