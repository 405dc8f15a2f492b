//! Request handler definitions
//!
//! Define each route and its handler here. Handlers stay thin: they extract the caller and the request, hand over to
//! the matching engine API, and serialise the result. Business rules live in `atelier_engine`.
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests. Every store access is async, and live streams only wake up when
//! the change feed publishes a notice, so a worker can hold many open streams at once.
use std::str::FromStr;

use actix_web::{get, web, HttpResponse, Responder};
use atelier_engine::{
    db_types::{ConversationId, NewCatalogItem, NewMessage, NewReview, OrderId, ProfileUpdate, UserId},
    live::{LiveSubscription, Snapshot},
    traits::{
        collaborators::{FlatRateQuoter, StyleAdviceRequest, StyleAdvisor},
        ConversationManagement,
        MarketplaceDatabase,
        OrderManagement,
        ProfileManagement,
        ReviewManagement,
    },
    transitions::TransitionRequest,
    ChatApi,
    CheckoutApi,
    CheckoutRequest,
    LiveApi,
    OrderFlowApi,
    ProfileApi,
    ReviewApi,
};
use futures::StreamExt;
use log::*;
use serde::Serialize;
use serde_json::json;

use crate::{
    data_objects::{AdviceResponse, MessageParams, ReviewParams, ScopeParams},
    errors::ServerError,
    helpers::{sse_event, sse_snapshot},
    middleware::Caller,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro.
// Every handler is generic over a single backend type `B` that must satisfy all of the listed bounds.
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:path),+) => {
        paste::paste! { pub struct [<$name:camel Route>]<B>(core::marker::PhantomData<fn() -> B>); }
        paste::paste! { impl<B> [<$name:camel Route>]<B> {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self(core::marker::PhantomData)
            }
        }}
        paste::paste! { impl<B> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<B>
        where B: $($bounds +)+ 'static
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::<B>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

fn order_id(raw: String) -> Result<OrderId, ServerError> {
    OrderId::from_str(&raw).map_err(|e| ServerError::InvalidRequestPath(e.to_string()))
}

fn conversation_id(raw: &str) -> Result<ConversationId, ServerError> {
    ConversationId::from_str(raw).map_err(|e| ServerError::InvalidRequestPath(e.to_string()))
}

#[get("/health")]
pub async fn health() -> impl Responder {
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Profiles  ----------------------------------------------------

route!(my_profile => Get "/me" impl ProfileManagement);
pub async fn my_profile<B: ProfileManagement>(
    caller: Caller,
    api: web::Data<ProfileApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET profile of {}", caller.0);
    let profile = api.profile(&caller.0).await?;
    Ok(HttpResponse::Ok().json(profile))
}

route!(save_my_profile => Put "/me" impl ProfileManagement);
/// Creates or updates the caller's profile. Rating aggregates in the body are ignored; they are owned by the review
/// flow.
pub async fn save_my_profile<B: ProfileManagement>(
    caller: Caller,
    body: web::Json<ProfileUpdate>,
    api: web::Data<ProfileApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ PUT profile of {}", caller.0);
    let profile = api.save_profile(&caller.0, &caller.0, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(profile))
}

route!(merchants => Get "/merchants" impl ProfileManagement);
pub async fn merchants<B: ProfileManagement>(api: web::Data<ProfileApi<B>>) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET merchants");
    let merchants = api.merchants().await?;
    Ok(HttpResponse::Ok().json(merchants))
}

route!(merchant_catalog => Get "/merchants/{id}/catalog" impl ProfileManagement);
pub async fn merchant_catalog<B: ProfileManagement>(
    path: web::Path<String>,
    api: web::Data<ProfileApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let merchant_id = UserId::from(path.into_inner());
    debug!("💻️ GET catalog of {merchant_id}");
    let catalog = api.catalog(&merchant_id).await?;
    Ok(HttpResponse::Ok().json(catalog))
}

route!(replace_catalog => Put "/catalog" impl ProfileManagement);
/// Replaces the caller's whole catalogue with the items in the body.
pub async fn replace_catalog<B: ProfileManagement>(
    caller: Caller,
    body: web::Json<Vec<NewCatalogItem>>,
    api: web::Data<ProfileApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let items = body.into_inner();
    debug!("💻️ PUT catalog of {} ({} items)", caller.0, items.len());
    let catalog = api.replace_catalog(&caller.0, items).await?;
    Ok(HttpResponse::Ok().json(catalog))
}

//----------------------------------------------   Orders  ----------------------------------------------------

route!(place_order => Post "/orders" impl OrderManagement, ProfileManagement);
/// Checkout. Prices the catalogue item plus shipping and places the order on behalf of the caller.
pub async fn place_order<B: OrderManagement + ProfileManagement>(
    caller: Caller,
    body: web::Json<CheckoutRequest>,
    checkout: web::Data<CheckoutApi<B, FlatRateQuoter>>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let request = body.into_inner();
    debug!("💻️ POST order by {} with {} for item {}", caller.0, request.merchant_id, request.item_id);
    let order = checkout.prepare_order(&caller.0, request).await?;
    let order = api.create_order(&caller.0, order).await?;
    Ok(HttpResponse::Created().json(order))
}

route!(my_orders => Get "/orders" impl OrderManagement);
/// The caller's orders, newest first. `?as=merchant` lists the orders the caller received as a merchant.
pub async fn my_orders<B: OrderManagement>(
    caller: Caller,
    query: web::Query<ScopeParams>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let scope = query.scope_for(caller.0);
    debug!("💻️ GET orders for {scope:?}");
    let orders = api.orders(&scope).await?;
    Ok(HttpResponse::Ok().json(orders))
}

route!(order_by_id => Get "/orders/{id}" impl OrderManagement);
/// Only the customer and the merchant of an order may read it.
pub async fn order_by_id<B: OrderManagement>(
    caller: Caller,
    path: web::Path<String>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = order_id(path.into_inner())?;
    debug!("💻️ GET order {id} for {}", caller.0);
    let order = api.fetch_order(&caller.0, &id).await?;
    Ok(HttpResponse::Ok().json(order))
}

route!(advance_order => Post "/orders/{id}/advance" impl OrderManagement);
/// Route handler for order status changes.
///
/// The body names the target status plus whatever that transition requires:
/// * `Shipped` needs a non-empty `tracking_number`.
/// * `Cancelled` needs a non-empty `cancellation_reason`.
/// * `Complaint` needs a `complaint` with a non-empty `reason`.
///
/// Illegal moves are refused with 409 (not reachable from the current status), 403 (the caller's side may not make
/// the move) or 400 (missing field). Nothing is written in those cases.
pub async fn advance_order<B: OrderManagement>(
    caller: Caller,
    path: web::Path<String>,
    body: web::Json<TransitionRequest>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = order_id(path.into_inner())?;
    let request = body.into_inner();
    info!("💻️ {} asks to move order {id} to {}", caller.0, request.status);
    let order = api.advance(&id, &caller.0, request).await.map_err(|e| {
        debug!("💻️ Order {id} was not moved. {e}");
        ServerError::from(e)
    })?;
    Ok(HttpResponse::Ok().json(order))
}

route!(my_transactions => Get "/transactions" impl OrderManagement);
pub async fn my_transactions<B: OrderManagement>(
    caller: Caller,
    query: web::Query<ScopeParams>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let scope = query.scope_for(caller.0);
    debug!("💻️ GET transactions for {scope:?}");
    let transactions = api.transactions(&scope).await?;
    Ok(HttpResponse::Ok().json(transactions))
}

route!(my_stats => Get "/stats" impl OrderManagement);
/// Dashboard figures for the caller as a merchant.
pub async fn my_stats<B: OrderManagement>(
    caller: Caller,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET stats for {}", caller.0);
    let stats = api.merchant_stats(&caller.0).await?;
    Ok(HttpResponse::Ok().json(stats))
}

//----------------------------------------------   Reviews  ----------------------------------------------------

route!(review_order => Post "/orders/{id}/review" impl OrderManagement, ReviewManagement);
/// Reviews a completed order. Returns the stored review, the order and the merchant's new rating aggregate.
pub async fn review_order<B: OrderManagement + ReviewManagement>(
    caller: Caller,
    path: web::Path<String>,
    body: web::Json<ReviewParams>,
    orders: web::Data<OrderFlowApi<B>>,
    reviews: web::Data<ReviewApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = order_id(path.into_inner())?;
    let params = body.into_inner();
    debug!("💻️ POST review of order {id} by {}", caller.0);
    let order = orders.fetch_order(&caller.0, &id).await?;
    let mut review = NewReview::new(order.merchant_id, order.id, caller.0.clone(), params.rating)
        .with_comment(params.reviewer_name, params.comment);
    if let Some(url) = params.image_url {
        review = review.with_image_url(url);
    }
    let receipt = reviews.submit_review(&caller.0, review).await?;
    Ok(HttpResponse::Created().json(receipt))
}

route!(merchant_reviews => Get "/merchants/{id}/reviews" impl OrderManagement, ReviewManagement);
pub async fn merchant_reviews<B: OrderManagement + ReviewManagement>(
    path: web::Path<String>,
    api: web::Data<ReviewApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let merchant_id = UserId::from(path.into_inner());
    debug!("💻️ GET reviews of {merchant_id}");
    let reviews = api.reviews_for(&merchant_id).await?;
    Ok(HttpResponse::Ok().json(reviews))
}

//----------------------------------------------   Conversations  ----------------------------------------------------

route!(my_conversations => Get "/conversations" impl ConversationManagement, ProfileManagement);
pub async fn my_conversations<B: ConversationManagement + ProfileManagement>(
    caller: Caller,
    api: web::Data<ChatApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET conversations of {}", caller.0);
    let conversations = api.list_conversations(&caller.0).await?;
    Ok(HttpResponse::Ok().json(conversations))
}

route!(conversation_messages => Get "/conversations/{id}/messages" impl ConversationManagement, ProfileManagement);
pub async fn conversation_messages<B: ConversationManagement + ProfileManagement>(
    caller: Caller,
    path: web::Path<String>,
    api: web::Data<ChatApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = conversation_id(&path.into_inner())?;
    debug!("💻️ GET messages of {id} for {}", caller.0);
    let messages = api.messages(&caller.0, &id).await?;
    Ok(HttpResponse::Ok().json(messages))
}

route!(send_message => Post "/conversations/{peer}/messages" impl ConversationManagement, ProfileManagement);
/// Sends a message to the user `{peer}`, opening the conversation on first contact.
pub async fn send_message<B: ConversationManagement + ProfileManagement>(
    caller: Caller,
    path: web::Path<String>,
    body: web::Json<MessageParams>,
    api: web::Data<ChatApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let peer = UserId::from(path.into_inner());
    let params = body.into_inner();
    debug!("💻️ POST message from {} to {peer}", caller.0);
    let mut message = NewMessage::text(caller.0.clone(), params.sender_name, params.text);
    if let Some(url) = params.attachment_url {
        message = message.with_attachment(url);
    }
    let (conversation, message) = api.send_message(&caller.0, &peer, message).await?;
    Ok(HttpResponse::Created().json(json!({ "conversation": conversation, "message": message })))
}

//----------------------------------------------   Style advice  ----------------------------------------------------

route!(style_advice => Post "/advice" impl StyleAdvisor);
/// Asks the configured stylist for a recommendation. A stylist outage is not an error for the client: the response
/// carries an apology in the requested language and `success: false`.
pub async fn style_advice<S: StyleAdvisor>(
    caller: Caller,
    body: web::Json<StyleAdviceRequest>,
    stylist: web::Data<S>,
) -> Result<HttpResponse, ServerError> {
    let request = body.into_inner();
    debug!("💻️ POST advice for {} ({})", caller.0, request.occasion);
    let response = match stylist.advise(&request).await {
        Ok(advice) => AdviceResponse { advice, success: true },
        Err(e) => {
            warn!("💻️ Stylist failed. {e}");
            AdviceResponse { advice: request.apology().to_string(), success: false }
        },
    };
    Ok(HttpResponse::Ok().json(response))
}

//----------------------------------------------   Live streams  ----------------------------------------------------

/// Streams a subscription as Server-Sent Events. Each event is a complete snapshot; a failed reload is reported as an
/// `error` event and the stream carries on with the next change.
fn sse_response<T: Serialize + 'static>(subscription: LiveSubscription<T>) -> HttpResponse {
    let topic = subscription.topic().to_string();
    debug!("💻️📡️ Streaming {topic}");
    let events = subscription.into_stream().map(move |item: Result<Snapshot<T>, _>| {
        let frame = match item {
            Ok(snapshot) => sse_snapshot(&snapshot),
            Err(e) => {
                warn!("💻️📡️ Could not reload {topic}. {e}");
                sse_event("error", None, &json!({ "error": e.to_string() }))
            },
        };
        Ok::<_, ServerError>(frame)
    });
    HttpResponse::Ok()
        .content_type("text/event-stream")
        .insert_header(("Cache-Control", "no-cache"))
        .streaming(events)
}

route!(live_orders => Get "/live/orders" impl MarketplaceDatabase);
pub async fn live_orders<B: MarketplaceDatabase + 'static>(
    caller: Caller,
    query: web::Query<ScopeParams>,
    api: web::Data<LiveApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let scope = query.scope_for(caller.0.clone());
    let subscription = api.watch_orders(&caller.0, scope)?;
    Ok(sse_response(subscription))
}

route!(live_order => Get "/live/orders/{id}" impl MarketplaceDatabase);
pub async fn live_order<B: MarketplaceDatabase + 'static>(
    caller: Caller,
    path: web::Path<String>,
    api: web::Data<LiveApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = order_id(path.into_inner())?;
    let subscription = api.watch_order(&caller.0, &id).await?;
    Ok(sse_response(subscription))
}

route!(live_inbox => Get "/live/conversations" impl MarketplaceDatabase);
pub async fn live_inbox<B: MarketplaceDatabase + 'static>(
    caller: Caller,
    api: web::Data<LiveApi<B>>,
) -> Result<HttpResponse, ServerError> {
    Ok(sse_response(api.watch_inbox(&caller.0)))
}

route!(live_conversation => Get "/live/conversations/{id}" impl MarketplaceDatabase);
pub async fn live_conversation<B: MarketplaceDatabase + 'static>(
    caller: Caller,
    path: web::Path<String>,
    api: web::Data<LiveApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = conversation_id(&path.into_inner())?;
    let subscription = api.watch_conversation(&caller.0, &id).await?;
    Ok(sse_response(subscription))
}

route!(live_reviews => Get "/live/merchants/{id}/reviews" impl MarketplaceDatabase);
pub async fn live_reviews<B: MarketplaceDatabase + 'static>(
    path: web::Path<String>,
    api: web::Data<LiveApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let merchant_id = UserId::from(path.into_inner());
    Ok(sse_response(api.watch_reviews(&merchant_id)))
}

route!(live_merchant => Get "/live/merchants/{id}" impl MarketplaceDatabase);
/// The merchant's public profile, including the rating aggregate.
pub async fn live_merchant<B: MarketplaceDatabase + 'static>(
    path: web::Path<String>,
    api: web::Data<LiveApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let merchant_id = UserId::from(path.into_inner());
    Ok(sse_response(api.watch_merchant(&merchant_id)))
}

route!(live_transactions => Get "/live/transactions" impl MarketplaceDatabase);
pub async fn live_transactions<B: MarketplaceDatabase + 'static>(
    caller: Caller,
    query: web::Query<ScopeParams>,
    api: web::Data<LiveApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let scope = query.scope_for(caller.0.clone());
    let subscription = api.watch_transactions(&caller.0, scope)?;
    Ok(sse_response(subscription))
}
