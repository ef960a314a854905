//! Admission control middleware.
//!
//! Runs [`AdmissionController::check`] before the wrapped service and answers
//! 429 with a `Retry-After` header when a tier is exhausted.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{header, HeaderValue, Request, StatusCode},
    response::Response,
};
use tower::{Layer, Service};
use tracing::error;

use crate::limiter::{AdmissionController, Decision};

/// Admission layer
#[derive(Clone)]
pub struct AdmissionLayer {
    controller: Arc<AdmissionController>,
}

impl AdmissionLayer {
    pub fn new(controller: Arc<AdmissionController>) -> Self {
        Self { controller }
    }

    pub fn controller(&self) -> Arc<AdmissionController> {
        Arc::clone(&self.controller)
    }
}

impl<S> Layer<S> for AdmissionLayer {
    type Service = AdmissionService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AdmissionService {
            inner,
            controller: Arc::clone(&self.controller),
        }
    }
}

/// Admission service
#[derive(Clone)]
pub struct AdmissionService<S> {
    inner: S,
    controller: Arc<AdmissionController>,
}

impl<S> Service<Request<Body>> for AdmissionService<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let controller = Arc::clone(&self.controller);
        let mut inner = self.inner.clone();

        Box::pin(async move {
            let ip = extract_client_ip(&req, &controller.config().trusted_proxies);
            let path = req.uri().path().to_string();

            match controller.check(ip, &path).await {
                Ok(Decision::Admitted { .. }) => inner.call(req).await,
                Ok(Decision::Rejected { retry_after, .. }) => Ok(rejection_response(retry_after)),
                Err(e) => {
                    error!(ip = %ip, path = %path, error = %e, "Rate limit error");
                    Ok(json_response(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        &serde_json::json!({
                            "message": "Internal server error",
                            "success": false,
                        }),
                    ))
                }
            }
        })
    }
}

/// Extract client IP from request
///
/// The socket peer is the client unless it is one of `trusted_proxies`. Only
/// then are `X-Forwarded-For` (rightmost hop not added by a trusted proxy)
/// and `X-Real-IP` consulted. Requests without connection info are keyed as
/// localhost.
pub fn extract_client_ip<B>(req: &Request<B>, trusted_proxies: &[IpAddr]) -> IpAddr {
    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map_or(IpAddr::from([127, 0, 0, 1]), |connect_info| connect_info.0.ip());
    if !trusted_proxies.contains(&peer) {
        return peer;
    }

    if let Some(forwarded) = req
        .headers()
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
    {
        for hop in forwarded.rsplit(',') {
            match hop.trim().parse::<IpAddr>() {
                Ok(ip) if trusted_proxies.contains(&ip) => continue,
                Ok(ip) => return ip,
                Err(_) => break,
            }
        }
    }

    req.headers()
        .get("x-real-ip")
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.trim().parse::<IpAddr>().ok())
        .unwrap_or(peer)
}

fn json_response(status: StatusCode, body: &serde_json::Value) -> Response {
    let mut response = Response::new(Body::from(serde_json::to_vec(body).unwrap_or_default()));
    *response.status_mut() = status;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    response
}

/// Create rate limit exceeded response
fn rejection_response(retry_after: Duration) -> Response {
    let mut response = json_response(
        StatusCode::TOO_MANY_REQUESTS,
        &serde_json::json!({
            "message": "Too many requests",
            "success": false,
        }),
    );
    let retry_secs = retry_after.as_millis().div_ceil(1000).max(1);
    response
        .headers_mut()
        .insert(header::RETRY_AFTER, HeaderValue::from(retry_secs as u64));
    response
}
