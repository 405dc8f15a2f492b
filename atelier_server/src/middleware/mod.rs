mod identity;

pub use identity::{
    Caller,
    GatewayIdentity,
    IdentityMiddlewareFactory,
    IdentityMiddlewareService,
    USER_HEADER,
    SIGNATURE_HEADER,
    VERIFIED_HEADER,
};
