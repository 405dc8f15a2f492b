use actix_web::{body::to_bytes, http::StatusCode, test, test::TestRequest, web::ServiceConfig, App};
use anyhow::anyhow;
use atelier_common::Secret;
use atelier_engine::db_types::{BodyMeasurements, Order, OrderId, OrderStatusType, Rupiah, UserId};
use chrono::{TimeZone, Utc};
use log::debug;
use serde::Serialize;

use crate::{
    config::{IdentityConfig, ServerOptions},
    helpers::{calculate_hmac, identity_message},
    middleware::{IdentityMiddlewareFactory, SIGNATURE_HEADER, USER_HEADER, VERIFIED_HEADER},
};

// The key the test "gateway" signs identities with. DO NOT re-use it anywhere.
const GATEWAY_SECRET: &str = "c0ffee-test-gateway-secret";

pub fn identity_config() -> IdentityConfig {
    IdentityConfig { secret: Secret::new(GATEWAY_SECRET.to_string()), checks: true }
}

/// Who is making a test request, and how the gateway vouches for them.
#[derive(Debug, Clone)]
pub enum As {
    Nobody,
    Verified(&'static str),
    Unverified(&'static str),
    Forged(&'static str),
}

impl As {
    fn sign(self, mut req: TestRequest) -> TestRequest {
        let (user, verified, signature) = match self {
            As::Nobody => return req,
            As::Verified(user) => (user, true, sign(user, true)),
            As::Unverified(user) => (user, false, sign(user, false)),
            // A signature the gateway issued for someone else
            As::Forged(user) => (user, true, sign("rina", true)),
        };
        req = req
            .insert_header((USER_HEADER, user))
            .insert_header((VERIFIED_HEADER, verified.to_string()))
            .insert_header((SIGNATURE_HEADER, signature));
        req
    }
}

fn sign(user: &str, verified: bool) -> String {
    let message = identity_message(user, verified);
    calculate_hmac(GATEWAY_SECRET, message.as_bytes()).expect("Could not sign identity")
}

pub async fn get_request(
    caller: As,
    path: &str,
    configure: fn(&mut ServiceConfig),
) -> anyhow::Result<(StatusCode, String)> {
    send(caller.sign(TestRequest::get().uri(path)), configure).await
}

pub async fn post_request<T: Serialize>(
    caller: As,
    path: &str,
    body: &T,
    configure: fn(&mut ServiceConfig),
) -> anyhow::Result<(StatusCode, String)> {
    send(caller.sign(TestRequest::post().uri(path).set_json(body)), configure).await
}

async fn send(req: TestRequest, configure: fn(&mut ServiceConfig)) -> anyhow::Result<(StatusCode, String)> {
    let options = ServerOptions { use_x_forwarded_for: false, use_forwarded: false };
    let app = App::new().wrap(IdentityMiddlewareFactory::new(identity_config(), options)).configure(configure);
    let service = test::init_service(app).await;
    debug!("🚀️ Making request");
    match test::try_call_service(&service, req.to_request()).await {
        Ok(res) => {
            let status = res.status();
            let body = test::read_body(res).await;
            Ok((status, String::from_utf8_lossy(&body).into_owned()))
        },
        // Errors raised by middleware never reach a handler, so render them the way the server would
        Err(e) => {
            let res = e.error_response();
            let status = res.status();
            let body = to_bytes(res.into_body()).await.map_err(|e| anyhow!("Could not read body. {e}"))?;
            Ok((status, String::from_utf8_lossy(&body).into_owned()))
        },
    }
}

/// An order from sari to rina, in `status`.
pub fn sample_order(status: OrderStatusType) -> Order {
    let date = Utc.with_ymd_and_hms(2024, 8, 17, 9, 30, 0).unwrap();
    Order {
        id: OrderId("a1b2c3".into()),
        customer_id: UserId::from("sari"),
        merchant_id: UserId::from("rina"),
        customer_name: "Sari".into(),
        merchant_name: "Rina Atelier".into(),
        design_name: "Kebaya Modern".into(),
        image_url: String::new(),
        status,
        price: Rupiah::from(450_000),
        payment_method: "Transfer".into(),
        payment_proof_url: None,
        shipping_method: "JNE - REG".into(),
        shipping_address: "Jl. Mawar 12, Bandung".into(),
        tracking_number: None,
        measurements: BodyMeasurements::default(),
        customer_notes: String::new(),
        cancellation_reason: None,
        complaint: None,
        is_reviewed: false,
        created_at: date,
        updated_at: date,
    }
}
