//! Access/refresh token primitives shared by every service.
mod claims;
mod codec;
mod error;
mod header;

pub use claims::{Claims, Identity, Role, TokenPair};
pub use codec::TokenCodec;
pub use error::{AuthError, TokenError};
pub use header::extract_bearer;
