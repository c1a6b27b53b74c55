pub mod identity;
pub mod security_headers;
pub mod tracing;

pub use identity::{
    identity_middleware, AccessVerifier, AuthIdentity, CredentialSource, RejectionHook,
};
pub use security_headers::security_headers_middleware;
pub use tracing::{http_request_span, request_id_middleware, REQUEST_ID_HEADER};
