use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;

use crate::auth::{extract_bearer, AuthError, Identity, TokenCodec};
use crate::error::AppError;

pub const ACCESS_TOKEN_COOKIE: &str = "access_token";
pub const REFRESH_TOKEN_COOKIE: &str = "refresh_token";

/// Where the access token is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    /// `access_token` cookie
    Cookie,
    /// `Authorization: Bearer <token>`
    BearerHeader,
}

/// Called for every credential rejected as invalid. Expiry is not a rejection.
pub type RejectionHook = Arc<dyn Fn(&AuthError) + Send + Sync>;

/// Verifies access tokens on incoming requests and decides where a rejected
/// caller is sent.
#[derive(Clone)]
pub struct AccessVerifier {
    codec: TokenCodec,
    source: CredentialSource,
    login_path: String,
    refresh_path: String,
    on_rejection: Option<RejectionHook>,
}

impl AccessVerifier {
    pub fn new(codec: TokenCodec, source: CredentialSource) -> Self {
        Self {
            codec,
            source,
            login_path: "/login".to_string(),
            refresh_path: "/update-token".to_string(),
            on_rejection: None,
        }
    }

    pub fn with_rejection_hook(mut self, hook: RejectionHook) -> Self {
        self.on_rejection = Some(hook);
        self
    }

    pub fn with_redirects(mut self, login_path: &str, refresh_path: &str) -> Self {
        self.login_path = login_path.to_string();
        self.refresh_path = refresh_path.to_string();
        self
    }

    pub fn verify(&self, headers: &HeaderMap) -> Result<Identity, AuthError> {
        let token = match self.source {
            CredentialSource::Cookie => CookieJar::from_headers(headers)
                .get(ACCESS_TOKEN_COOKIE)
                .map(|cookie| cookie.value().to_string())
                .filter(|value| !value.is_empty())
                .ok_or(AuthError::MissingCredential)?,
            CredentialSource::BearerHeader => {
                let value = match headers.get(header::AUTHORIZATION) {
                    Some(value) => value.to_str().map_err(|_| AuthError::MalformedHeader)?,
                    None => "",
                };
                extract_bearer(value)?.to_string()
            }
        };

        let claims = self.codec.decode(&token)?;
        Ok(claims.identity())
    }
}

/// Attaches the verified [`Identity`] to the request, or redirects:
/// expired credentials go to the refresh path, anything else to login.
pub async fn identity_middleware(
    State(verifier): State<Arc<AccessVerifier>>,
    mut req: Request,
    next: Next,
) -> Response {
    match verifier.verify(req.headers()) {
        Ok(identity) => {
            tracing::debug!(user_id = identity.id, "Access token verified");
            req.extensions_mut().insert(identity);
            next.run(req).await
        }
        Err(AuthError::Expired) => {
            tracing::debug!(path = %req.uri().path(), "Access token expired");
            Redirect::to(&verifier.refresh_path).into_response()
        }
        Err(err) => {
            tracing::warn!(path = %req.uri().path(), error = %err, "Access token rejected");
            if let Some(hook) = &verifier.on_rejection {
                hook(&err);
            }
            Redirect::to(&verifier.login_path).into_response()
        }
    }
}

/// Extractor for the identity placed by [`identity_middleware`].
#[derive(Debug, Clone)]
pub struct AuthIdentity(pub Identity);

#[async_trait]
impl<S> FromRequestParts<S> for AuthIdentity
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .cloned()
            .map(AuthIdentity)
            .ok_or_else(|| {
                AppError::Unauthorized(anyhow::anyhow!("request carries no verified identity"))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Claims, Role};
    use axum::{
        body::Body,
        http::{Request as HttpRequest, StatusCode},
        middleware,
        routing::get,
        Router,
    };
    use chrono::Utc;
    use http_body_util::BodyExt;
    use secrecy::SecretString;
    use std::time::Duration;
    use tower::ServiceExt;

    fn codec() -> TokenCodec {
        TokenCodec::new(&SecretString::new("access-secret".to_string()))
    }

    fn identity() -> Identity {
        Identity {
            id: 5,
            role: Role::User,
            national_id: Some("030303123456".to_string()),
        }
    }

    fn app(source: CredentialSource) -> Router {
        let verifier = Arc::new(AccessVerifier::new(codec(), source));
        Router::new()
            .route(
                "/whoami",
                get(|AuthIdentity(who): AuthIdentity| async move { who.id.to_string() }),
            )
            .layer(middleware::from_fn_with_state(verifier, identity_middleware))
    }

    fn expired_token() -> String {
        let mut claims = Claims::for_identity(&identity(), Duration::from_secs(600));
        claims.iat = Utc::now().timestamp() - 1200;
        claims.exp = Utc::now().timestamp() - 600;
        codec().encode(&claims).unwrap()
    }

    fn valid_token() -> String {
        codec()
            .encode(&Claims::for_identity(&identity(), Duration::from_secs(600)))
            .unwrap()
    }

    #[test]
    fn test_verify_bearer() {
        let verifier = AccessVerifier::new(codec(), CredentialSource::BearerHeader);
        let mut headers = HeaderMap::new();
        assert_eq!(verifier.verify(&headers), Err(AuthError::MissingCredential));

        headers.insert(header::AUTHORIZATION, "Token abc".parse().unwrap());
        assert_eq!(verifier.verify(&headers), Err(AuthError::MalformedHeader));

        headers.insert(
            header::AUTHORIZATION,
            format!("Bearer {}", valid_token()).parse().unwrap(),
        );
        assert_eq!(verifier.verify(&headers), Ok(identity()));
    }

    #[test]
    fn test_verify_cookie() {
        let verifier = AccessVerifier::new(codec(), CredentialSource::Cookie);
        let mut headers = HeaderMap::new();
        assert_eq!(verifier.verify(&headers), Err(AuthError::MissingCredential));

        headers.insert(
            header::COOKIE,
            format!("{}={}", ACCESS_TOKEN_COOKIE, expired_token())
                .parse()
                .unwrap(),
        );
        assert_eq!(verifier.verify(&headers), Err(AuthError::Expired));

        headers.insert(
            header::COOKIE,
            format!("{}=garbage", ACCESS_TOKEN_COOKIE).parse().unwrap(),
        );
        assert_eq!(verifier.verify(&headers), Err(AuthError::Invalid));
    }

    #[tokio::test]
    async fn test_valid_cookie_reaches_handler() {
        let response = app(CredentialSource::Cookie)
            .oneshot(
                HttpRequest::builder()
                    .uri("/whoami")
                    .header(
                        header::COOKIE,
                        format!("{}={}", ACCESS_TOKEN_COOKIE, valid_token()),
                    )
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"5");
    }

    #[tokio::test]
    async fn test_expired_token_redirects_to_refresh() {
        let response = app(CredentialSource::BearerHeader)
            .oneshot(
                HttpRequest::builder()
                    .uri("/whoami")
                    .header(header::AUTHORIZATION, format!("Bearer {}", expired_token()))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/update-token");
    }

    #[tokio::test]
    async fn test_invalid_token_redirects_to_login() {
        let response = app(CredentialSource::BearerHeader)
            .oneshot(
                HttpRequest::builder()
                    .uri("/whoami")
                    .header(header::AUTHORIZATION, "Bearer not.a.token")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/login");
    }

    #[tokio::test]
    async fn test_rejection_hook_skips_expiry() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let rejected = Arc::new(AtomicUsize::new(0));
        let counter = rejected.clone();
        let verifier = Arc::new(
            AccessVerifier::new(codec(), CredentialSource::BearerHeader).with_rejection_hook(
                Arc::new(move |_: &AuthError| {
                    counter.fetch_add(1, Ordering::SeqCst);
                }),
            ),
        );
        let app = Router::new()
            .route(
                "/whoami",
                get(|AuthIdentity(who): AuthIdentity| async move { who.id.to_string() }),
            )
            .layer(middleware::from_fn_with_state(verifier, identity_middleware));

        for token in [expired_token(), valid_token(), "not.a.token".to_string()] {
            app.clone()
                .oneshot(
                    HttpRequest::builder()
                        .uri("/whoami")
                        .header(header::AUTHORIZATION, format!("Bearer {}", token))
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();
        }

        assert_eq!(rejected.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_missing_identity_is_unauthorized() {
        let app = Router::new().route(
            "/whoami",
            get(|AuthIdentity(who): AuthIdentity| async move { who.id.to_string() }),
        );

        let response = app
            .oneshot(HttpRequest::builder().uri("/whoami").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
