//! Rate-limit middleware, run ahead of every route.

use crate::error::ApiError;
use crate::AppState;
use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use ispgate_ratelimit::RateDecision;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;

const FORWARDED_FOR: &str = "x-forwarded-for";

pub(crate) async fn enforce(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    // Without connection info every client shares one counter.
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));
    let forwarded = request
        .headers()
        .get(FORWARDED_FOR)
        .and_then(|v| v.to_str().ok());

    let settings = state.settings();
    let client = settings.trusted_proxies.client_identity(peer, forwarded);
    match state
        .limiter
        .check(&client, settings.rate_limit, settings.rate_window)
        .await
    {
        RateDecision::Allowed => next.run(request).await,
        RateDecision::Rejected { retry_after_secs } => {
            ApiError::RateLimited { retry_after_secs }.into_response()
        }
    }
}
