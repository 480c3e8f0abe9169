//! Inbound correlation middleware.
//! Populates the request context and echoes the correlation id.

use axum::{
    body::Body,
    http::{HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use tracing::Instrument;

use crate::context::{ContextPropagator, HeaderSet, RequestContext, CORRELATION_ID_KEY, PLATFORM_KEY};
use crate::http::request::{resolve_correlation_id, resolve_platform, CORRELATION_HEADER};

/// Outermost request-scoped layer.
///
/// Everything downstream (exchange logging, handlers, outbound calls) runs
/// inside the request scope opened here. The scope is emptied when this
/// future finishes, unwinds or is dropped.
pub async fn correlation_middleware(mut request: Request<Body>, next: Next) -> Response {
    let inbound = HeaderSet::from_headers(request.headers());
    let context = RequestContext {
        correlation_id: resolve_correlation_id(&inbound),
        platform: resolve_platform(&inbound),
    };

    ContextPropagator::scope(Some(inbound), async move {
        let _guard = ContextPropagator::clear_on_drop();
        ContextPropagator::set(CORRELATION_ID_KEY, context.correlation_id.as_str());
        ContextPropagator::set(PLATFORM_KEY, context.platform.as_str());

        let span = tracing::info_span!(
            "request",
            correlation_id = %context.correlation_id,
            platform = %context.platform,
        );
        let header = HeaderValue::from_str(&context.correlation_id);
        request.extensions_mut().insert(context);

        let mut response = next.run(request).instrument(span).await;
        match header {
            Ok(value) => {
                response.headers_mut().insert(CORRELATION_HEADER, value);
            }
            Err(e) => tracing::warn!(error = %e, "Correlation id is not a valid header value"),
        }
        response
    })
    .await
}
