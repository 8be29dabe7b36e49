//! Response cache middleware.
//!
//! Serves `GET` requests from the store when a fresh entry exists and stores
//! `200 OK` responses on a miss. Any other status is passed through untouched.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderValue, Method, Request, StatusCode, Uri},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{debug, instrument};

use super::{CacheConfig, ResponseStore, store::CachedResponse};

/// Shared cache state for middleware.
#[derive(Clone)]
pub struct CacheState {
    pub config: CacheConfig,
    pub store: Arc<ResponseStore>,
}

impl CacheState {
    pub fn new(config: CacheConfig) -> Self {
        let store = Arc::new(ResponseStore::new(&config));
        Self { config, store }
    }
}

/// Cache key for a request: the path plus the raw, undecoded query string.
pub fn cache_key(uri: &Uri) -> String {
    uri.path_and_query()
        .map(|path_and_query| path_and_query.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string())
}

#[instrument(skip_all, fields(path = %request.uri().path()))]
pub async fn response_cache_layer(
    State(cache): State<CacheState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if !cache.config.enabled || request.method() != Method::GET {
        return next.run(request).await;
    }

    let key = cache_key(request.uri());

    if let Some(cached) = cache.store.get(&key) {
        debug!(cache = "response", outcome = "hit", key = %key, "serving cached response");
        return build_response(cached);
    }

    debug!(
        cache = "response",
        outcome = "miss",
        key = %key,
        "cache miss, executing handler"
    );

    let response = next.run(request).await;
    if response.status() != StatusCode::OK {
        return response;
    }

    let (parts, body) = response.into_parts();
    let bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(_) => return StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    };

    if bytes.len() > cache.config.body_limit_bytes {
        debug!(
            cache = "response",
            size = bytes.len(),
            limit = cache.config.body_limit_bytes,
            "response body over limit, not caching"
        );
    } else {
        let cached = CachedResponse {
            status: parts.status.as_u16(),
            headers: parts
                .headers
                .iter()
                .filter_map(|(k, v)| v.to_str().ok().map(|s| (k.to_string(), s.to_string())))
                .collect(),
            body: bytes.clone(),
        };
        if let Some(evicted) = cache.store.put(key, cached) {
            debug!(cache = "response", evicted = %evicted, "evicted least recently used entry");
        }
    }

    Response::from_parts(parts, Body::from(bytes))
}

fn build_response(cached: CachedResponse) -> Response {
    let mut builder = Response::builder().status(cached.status);

    for (name, value) in cached.headers {
        if let Ok(header_value) = HeaderValue::from_str(&value) {
            builder = builder.header(name, header_value);
        }
    }

    builder
        .body(Body::from(cached.body))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use axum::{Router, middleware, routing::get};
    use tower::ServiceExt;

    use super::*;

    fn counting_router(config: CacheConfig, status: StatusCode) -> (Router, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let handler_calls = Arc::clone(&calls);
        let router = Router::new()
            .route(
                "/api/posts",
                get(move || {
                    let calls = Arc::clone(&handler_calls);
                    async move {
                        let n = calls.fetch_add(1, Ordering::SeqCst);
                        (status, format!("call {n}"))
                    }
                }),
            )
            .layer(middleware::from_fn_with_state(
                CacheState::new(config),
                response_cache_layer,
            ));
        (router, calls)
    }

    async fn body_of(router: &Router, method: Method, uri: &str) -> String {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .expect("request should build");
        let response = router.clone().oneshot(request).await.expect("router responds");
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        String::from_utf8(bytes.to_vec()).expect("utf8 body")
    }

    #[test]
    fn key_keeps_raw_query() {
        let uri: Uri = "/api/posts?tags=tech,health&sortBy=likes".parse().expect("uri");
        assert_eq!(cache_key(&uri), "/api/posts?tags=tech,health&sortBy=likes");

        let bare: Uri = "/api/ping".parse().expect("uri");
        assert_eq!(cache_key(&bare), "/api/ping");
    }

    #[tokio::test]
    async fn repeated_get_is_served_from_cache() {
        let (router, calls) = counting_router(CacheConfig::default(), StatusCode::OK);

        let first = body_of(&router, Method::GET, "/api/posts?tag=tech").await;
        let second = body_of(&router, Method::GET, "/api/posts?tag=tech").await;
        let other = body_of(&router, Method::GET, "/api/posts?tag=health").await;

        assert_eq!(first, "call 0");
        assert_eq!(second, "call 0");
        assert_eq!(other, "call 1");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn non_ok_responses_are_not_cached() {
        let (router, calls) = counting_router(CacheConfig::default(), StatusCode::BAD_REQUEST);

        body_of(&router, Method::GET, "/api/posts").await;
        body_of(&router, Method::GET, "/api/posts").await;

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn disabled_cache_always_runs_handler() {
        let config = CacheConfig {
            enabled: false,
            ..Default::default()
        };
        let (router, calls) = counting_router(config, StatusCode::OK);

        body_of(&router, Method::GET, "/api/posts?tag=tech").await;
        body_of(&router, Method::GET, "/api/posts?tag=tech").await;

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn oversized_bodies_are_served_but_not_stored() {
        let config = CacheConfig {
            body_limit_bytes: 3,
            ..Default::default()
        };
        let (router, calls) = counting_router(config, StatusCode::OK);

        assert_eq!(body_of(&router, Method::GET, "/api/posts").await, "call 0");
        assert_eq!(body_of(&router, Method::GET, "/api/posts").await, "call 1");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
