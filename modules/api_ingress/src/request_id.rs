use axum::http::{
    header::{CONTENT_LENGTH, CONTENT_TYPE},
    HeaderName, Request,
};
use axum::{body::Body, middleware::Next, response::Response};
use modkit::{Problem, APPLICATION_PROBLEM_JSON};
use tower_http::request_id::{MakeRequestId, RequestId};
use tracing::field::Empty;

/// Upper bound for re-reading a problem body; problems are tiny.
const PROBLEM_BODY_LIMIT: usize = 64 * 1024;

#[derive(Clone, Debug)]
pub struct XRequestId(pub String);

pub fn header() -> HeaderName {
    HeaderName::from_static("x-request-id")
}

#[derive(Clone, Default)]
pub struct MakeReqId;

impl MakeRequestId for MakeReqId {
    fn make_request_id<B>(&mut self, _req: &Request<B>) -> Option<RequestId> {
        let id = nanoid::nanoid!();
        Some(RequestId::new(id.parse().ok()?))
    }
}

/// Middleware that stores request_id in Request.extensions and records it in the current span
pub async fn push_req_id_to_extensions(mut req: Request<Body>, next: Next) -> Response {
    let rid = req
        .headers()
        .get(header())
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
        .unwrap_or_else(|| "n/a".to_string());

    req.extensions_mut().insert(XRequestId(rid.clone()));
    tracing::Span::current().record("request_id", tracing::field::display(&rid));

    next.run(req).await
}

/// Middleware that copies the request id into `application/problem+json` bodies.
pub async fn stamp_problem_request_id(req: Request<Body>, next: Next) -> Response {
    let rid = req.extensions().get::<XRequestId>().map(|r| r.0.clone());
    let resp = next.run(req).await;

    let Some(rid) = rid else {
        return resp;
    };
    let is_problem = resp
        .headers()
        .get(CONTENT_TYPE)
        .is_some_and(|v| v.as_bytes() == APPLICATION_PROBLEM_JSON.as_bytes());
    if !is_problem {
        return resp;
    }

    let (mut parts, body) = resp.into_parts();
    let bytes = match axum::body::to_bytes(body, PROBLEM_BODY_LIMIT).await {
        Ok(b) => b,
        Err(e) => {
            tracing::warn!(error = %e, "failed to buffer problem body");
            return Response::from_parts(parts, Body::empty());
        }
    };
    let stamped = serde_json::from_slice::<Problem>(&bytes)
        .map(|p| p.with_request_id(rid))
        .and_then(|p| serde_json::to_vec(&p));
    match stamped {
        Ok(v) => {
            parts.headers.remove(CONTENT_LENGTH);
            Response::from_parts(parts, Body::from(v))
        }
        Err(_) => Response::from_parts(parts, Body::from(bytes)),
    }
}

/// Create trace layer with proper typing
#[allow(clippy::type_complexity)]
pub fn create_trace_layer() -> tower_http::trace::TraceLayer<
    tower_http::classify::SharedClassifier<tower_http::classify::ServerErrorsAsFailures>,
    impl Fn(&Request<Body>) -> tracing::Span + Clone,
> {
    use tower_http::trace::TraceLayer;

    TraceLayer::new_for_http().make_span_with(|req: &Request<Body>| {
        let rid = req
            .headers()
            .get(header())
            .and_then(|v| v.to_str().ok())
            .unwrap_or("n/a");
        tracing::info_span!(
            "http_request",
            method = %req.method(),
            path = %req.uri().path(),
            version = ?req.version(),
            module = "api_ingress",
            request_id = %rid,
            status = Empty,
            latency_ms = Empty
        )
    })
}
