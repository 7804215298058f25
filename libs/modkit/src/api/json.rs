use axum::{
    extract::{FromRequest, OriginalUri, Request},
    http::StatusCode,
};
use serde::de::DeserializeOwned;

use crate::api::problem::{from_parts, ProblemResponse};

/// `Json<T>` whose rejections (bad content type, malformed or mistyped body)
/// are rendered as 400 Problem Details instead of axum's plain-text bodies.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ProblemResponse;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        // Nested routers see a stripped path; report the one the client sent.
        let instance = req
            .extensions()
            .get::<OriginalUri>()
            .map(|o| o.0.path().to_owned())
            .unwrap_or_else(|| req.uri().path().to_owned());
        match axum::Json::<T>::from_request(req, state).await {
            Ok(axum::Json(value)) => Ok(Self(value)),
            Err(rejection) => {
                tracing::debug!(error = %rejection, "rejected request body");
                Err(from_parts(
                    StatusCode::BAD_REQUEST,
                    "VALIDATION",
                    "Bad Request",
                    rejection.body_text(),
                    &instance,
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, routing::post, Router};
    use serde::Deserialize;
    use tower::ServiceExt;

    #[derive(Deserialize)]
    struct Payload {
        #[allow(dead_code)]
        name: String,
    }

    fn app() -> Router {
        Router::new().route(
            "/echo",
            post(|ApiJson(_p): ApiJson<Payload>| async { "ok" }),
        )
    }

    #[tokio::test]
    async fn malformed_body_is_a_problem() {
        let resp = app()
            .oneshot(
                axum::http::Request::post("/echo")
                    .header("content-type", "application/json")
                    .body(Body::from("{not json"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], 400);
        assert_eq!(json["code"], "VALIDATION");
        assert_eq!(json["instance"], "/echo");
    }

    #[tokio::test]
    async fn well_formed_body_passes() {
        let resp = app()
            .oneshot(
                axum::http::Request::post("/echo")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"name":"x"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
