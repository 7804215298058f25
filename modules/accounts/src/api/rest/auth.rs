//! Bearer-token guard for protected routes.
//!
//! `require_identity` is applied with `route_layer` by modules owning
//! protected routes; handlers then take an [`Authenticated`] argument.

use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, OriginalUri, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use modkit::api::problem::{from_parts, ProblemResponse};

use crate::api::rest::error::map_accounts_error;
use crate::contract::{client::AccountsApi, model::Identity};

/// Extract the token from `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    value.strip_prefix("Bearer ")?.split_whitespace().next()
}

/// Middleware: verify the bearer token and attach the resolved [`Identity`].
pub async fn require_identity(
    State(accounts): State<Arc<dyn AccountsApi>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ProblemResponse> {
    let instance = original_path(req.extensions(), req.uri().path());
    // Absent header and an empty token both end up as "Missing token".
    let token = bearer_token(req.headers()).unwrap_or_default();

    let identity = accounts.authenticate(token).await.map_err(|e| {
        tracing::debug!(error = %e, path = %instance, "authentication failed");
        map_accounts_error(&e, &instance)
    })?;

    req.extensions_mut().insert(identity);
    Ok(next.run(req).await)
}

/// Identity of the caller, available behind [`require_identity`].
#[derive(Debug, Clone)]
pub struct Authenticated(pub Identity);

impl<S> FromRequestParts<S> for Authenticated
where
    S: Send + Sync,
{
    type Rejection = ProblemResponse;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<Identity>() {
            Some(identity) => Ok(Self(identity.clone())),
            None => Err(from_parts(
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Unauthorized",
                "Missing token",
                &original_path(&parts.extensions, parts.uri.path()),
            )),
        }
    }
}

fn original_path(ext: &axum::http::Extensions, fallback: &str) -> String {
    ext.get::<OriginalUri>()
        .map(|o| o.0.path().to_owned())
        .unwrap_or_else(|| fallback.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut h = HeaderMap::new();
        h.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        h
    }

    #[test]
    fn parses_bearer_scheme() {
        assert_eq!(bearer_token(&headers("Bearer abc.def")), Some("abc.def"));
        assert_eq!(bearer_token(&headers("Bearer abc extra")), Some("abc"));
    }

    #[test]
    fn rejects_other_schemes_and_empty_tokens() {
        assert_eq!(bearer_token(&HeaderMap::new()), None);
        assert_eq!(bearer_token(&headers("Basic dXNlcjpwdw==")), None);
        assert_eq!(bearer_token(&headers("Bearer ")), None);
        assert_eq!(bearer_token(&headers("bearer abc")), None);
    }
}
