//! Inbound exchange logging middleware.

use std::time::Instant;

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use futures_util::{stream, StreamExt};

use crate::http::exchange::{ExchangeRequest, ExchangeResponse, HttpExchange, Origin};
use crate::observability::{metrics, ExchangeLogger};

/// Records the exchange without changing it.
///
/// Excluded paths pass straight through without buffering. Bodies larger
/// than the logging limit, or that fail to read, are still delivered in
/// full and are left out of the record.
pub async fn exchange_log_middleware(
    State(logger): State<ExchangeLogger>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if logger.is_excluded(request.uri().path()) {
        metrics::record_excluded(Origin::Local);
        return next.run(request).await;
    }

    let started = Instant::now();
    let (parts, body) = request.into_parts();
    let (body, observed) = capture(body, logger.max_body_bytes()).await;
    let mut captured = ExchangeRequest::from_parts(&parts, observed.clone().unwrap_or_default());
    captured.body_truncated = observed.is_none();

    let response = next.run(Request::from_parts(parts, body)).await;

    let (parts, body) = response.into_parts();
    let (body, observed) = capture(body, logger.max_body_bytes()).await;

    logger.log(&HttpExchange {
        origin: Origin::Local,
        request: captured,
        response: Some(ExchangeResponse {
            status: parts.status,
            headers: parts.headers.clone(),
            body_truncated: observed.is_none(),
            body: observed.unwrap_or_default(),
            duration: started.elapsed(),
        }),
    });

    Response::from_parts(parts, body)
}

/// Read up to `limit` bytes of `body` for logging.
///
/// Returns a body that yields exactly what the original would have, and the
/// complete content only when it fit within `limit` and read cleanly.
async fn capture(body: Body, limit: usize) -> (Body, Option<Bytes>) {
    let mut frames = body.into_data_stream();
    let mut chunks: Vec<Bytes> = Vec::new();
    let mut seen = 0usize;

    loop {
        match frames.next().await {
            None => {
                let bytes = Bytes::from(chunks.concat());
                return (Body::from(bytes.clone()), Some(bytes));
            }
            Some(Ok(chunk)) => {
                seen += chunk.len();
                chunks.push(chunk);
                if seen > limit {
                    tracing::debug!(limit, "Body exceeds logging limit, not captured");
                    let replay = stream::iter(chunks.into_iter().map(Ok)).chain(frames);
                    return (Body::from_stream(replay), None);
                }
            }
            Some(Err(e)) => {
                tracing::warn!(error = %e, "Failed to read body for logging");
                let replay = chunks
                    .into_iter()
                    .map(Ok)
                    .chain(std::iter::once(Err(e)));
                return (Body::from_stream(stream::iter(replay)), None);
            }
        }
    }
}
