//! Identity middleware for Actix Web.
//!
//! Callers are authenticated by an identity gateway in front of this server. The gateway forwards who the caller is
//! in two headers, and signs them:
//!
//! * `x-atelier-user`: the user id.
//! * `x-atelier-verified`: `true` once the user has verified their email address.
//! * `x-atelier-signature`: base64 HMAC-SHA256 over `"<user>:<verified>"`, keyed with `ATELIER_IDENTITY_SECRET`.
//!
//! Requests with a missing or bad signature are refused with 401. Unverified users are refused with 403. Otherwise
//! the [`Identity`] is stored in the request extensions, where handlers pick it up through the [`Caller`] extractor.
use std::{
    future::{ready, Ready},
    rc::Rc,
};

use actix_web::{
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::HeaderMap,
    Error,
    FromRequest,
    HttpMessage,
    HttpRequest,
};
use atelier_engine::{
    db_types::UserId,
    traits::collaborators::{CollaboratorError, Identity, IdentityProvider},
};
use futures::future::LocalBoxFuture;
use log::{debug, trace, warn};

use crate::{
    config::{IdentityConfig, ServerOptions},
    errors::{AuthError, ServerError},
    helpers::{get_remote_ip, identity_message, verify_hmac},
};

pub const USER_HEADER: &str = "x-atelier-user";
pub const VERIFIED_HEADER: &str = "x-atelier-verified";
pub const SIGNATURE_HEADER: &str = "x-atelier-signature";

/// The identity asserted by the gateway for one request.
#[derive(Debug, Clone)]
pub struct GatewayIdentity {
    user: Option<String>,
    verified: bool,
    signature: Option<String>,
    config: IdentityConfig,
}

impl GatewayIdentity {
    pub fn from_headers(headers: &HeaderMap, config: &IdentityConfig) -> Self {
        let header = |name: &str| {
            headers.get(name).and_then(|v| v.to_str().ok()).map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
        };
        let verified = header(VERIFIED_HEADER).map(|v| v.eq_ignore_ascii_case("true")).unwrap_or(false);
        Self { user: header(USER_HEADER), verified, signature: header(SIGNATURE_HEADER), config: config.clone() }
    }

    pub fn has_user(&self) -> bool {
        self.user.is_some()
    }
}

impl IdentityProvider for GatewayIdentity {
    async fn current_identity(&self) -> Result<Identity, CollaboratorError> {
        let user = self
            .user
            .as_ref()
            .ok_or_else(|| CollaboratorError::Rejected("identity", "No user header was supplied".into()))?;
        if self.config.checks {
            let signature = self.signature.as_deref().unwrap_or_default();
            let message = identity_message(user, self.verified);
            if !verify_hmac(self.config.secret.reveal(), message.as_bytes(), signature) {
                return Err(CollaboratorError::Rejected("identity", format!("Bad signature for {user}")));
            }
        }
        Ok(Identity { user_id: UserId::from(user.as_str()), verified: self.verified })
    }
}

pub struct IdentityMiddlewareFactory {
    config: IdentityConfig,
    options: ServerOptions,
}

impl IdentityMiddlewareFactory {
    pub fn new(config: IdentityConfig, options: ServerOptions) -> Self {
        IdentityMiddlewareFactory { config, options }
    }
}

impl<S, B> Transform<S, ServiceRequest> for IdentityMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<B>;
    type Transform = IdentityMiddlewareService<S>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(IdentityMiddlewareService {
            config: self.config.clone(),
            options: self.options,
            service: Rc::new(service),
        }))
    }
}

pub struct IdentityMiddlewareService<S> {
    config: IdentityConfig,
    options: ServerOptions,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for IdentityMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;
    type Response = ServiceResponse<B>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let gateway = GatewayIdentity::from_headers(req.headers(), &self.config);
        let options = self.options;
        Box::pin(async move {
            trace!("🔐️ Checking identity for request");
            if !gateway.has_user() {
                debug!("🔐️ No identity in request to {}. Denying access.", req.path());
                return Err(ServerError::from(AuthError::MissingIdentity).into());
            }
            let identity = match gateway.current_identity().await {
                Ok(identity) => identity,
                Err(e) => {
                    let ip = get_remote_ip(req.request(), options.use_x_forwarded_for, options.use_forwarded);
                    let ip = ip.map(|ip| ip.to_string()).unwrap_or_else(|| "an unknown address".into());
                    warn!("🔐️ Identity rejected for request from {ip}. {e}");
                    return Err(ServerError::from(AuthError::InvalidSignature).into());
                },
            };
            if !identity.verified {
                debug!("🔐️ {} is not verified. Denying access.", identity.user_id);
                return Err(ServerError::from(AuthError::Unverified(identity.user_id.to_string())).into());
            }
            trace!("🔐️ Identity check for {} ✅️", identity.user_id);
            req.extensions_mut().insert(identity);
            service.call(req).await
        })
    }
}

/// The verified user making the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller(pub UserId);

impl FromRequest for Caller {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let caller = req.extensions().get::<Identity>().map(|identity| Caller(identity.user_id.clone()));
        ready(caller.ok_or(ServerError::AuthenticationError(AuthError::MissingIdentity)))
    }
}
