pub mod registration;
pub mod session;

pub use registration::signup;
pub use session::{login, update_token};

use axum_extra::extract::cookie::{Cookie, CookieJar};
use service_core::auth::TokenPair;
use service_core::middleware::identity::{ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE};
use std::time::Duration;

/// Sets both tokens as `HttpOnly` cookies living as long as the tokens do.
pub(crate) fn with_token_cookies(
    jar: CookieJar,
    pair: &TokenPair,
    access_ttl: Duration,
    refresh_ttl: Duration,
) -> CookieJar {
    jar.add(token_cookie(
        REFRESH_TOKEN_COOKIE,
        pair.refresh_token.clone(),
        refresh_ttl,
    ))
    .add(token_cookie(
        ACCESS_TOKEN_COOKIE,
        pair.access_token.clone(),
        access_ttl,
    ))
}

fn token_cookie(name: &'static str, value: String, ttl: Duration) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .max_age(time::Duration::seconds(ttl.as_secs() as i64))
        .build()
}
