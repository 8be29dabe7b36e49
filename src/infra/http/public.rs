use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{RawQuery, State},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
};
use tagfeed_api_types::{PingResponse, PostsResponse};

use crate::{
    application::{
        error::AppError, ping::PingService, posts::PostsService, upstream::PostsSource,
    },
    cache::{CacheState, response_cache_layer},
    domain::query::{AggregationRequest, RawPostsQuery},
};

use super::middleware::{log_responses, set_request_context};

pub const BANNER: &str = "tagfeed aggregation API, endpoints: /api/ping /api/posts";

#[derive(Clone)]
pub struct HttpState {
    pub posts: Arc<PostsService>,
    pub ping: Arc<PingService>,
    pub cache: Option<CacheState>,
}

impl HttpState {
    /// Wire both services to one upstream source.
    pub fn new(source: Arc<dyn PostsSource>, cache: Option<CacheState>) -> Self {
        Self {
            posts: Arc::new(PostsService::new(source.clone())),
            ping: Arc::new(PingService::new(source)),
            cache,
        }
    }
}

pub fn build_router(state: HttpState) -> Router {
    let cached_routes = Router::new()
        .route("/", get(index))
        .route("/api/ping", get(ping))
        .route("/api/posts", get(posts));

    let cached_routes = if let Some(cache_state) = state.cache.clone() {
        cached_routes.layer(middleware::from_fn_with_state(
            cache_state,
            response_cache_layer,
        ))
    } else {
        cached_routes
    };

    cached_routes
        .fallback(not_found)
        .with_state(state)
        .layer(middleware::from_fn(log_responses))
        .layer(middleware::from_fn(set_request_context))
}

async fn index() -> &'static str {
    BANNER
}

async fn ping(State(state): State<HttpState>) -> Json<PingResponse> {
    Json(state.ping.check().await)
}

async fn posts(
    State(state): State<HttpState>,
    RawQuery(query): RawQuery,
) -> Result<Json<PostsResponse>, AppError> {
    let raw = RawPostsQuery::from_query_string(query.as_deref());
    let request = AggregationRequest::parse(&raw)?;
    let response = state.posts.aggregate(&request).await?;
    Ok(Json(response))
}

async fn not_found() -> Response {
    AppError::NotFound.into_response()
}
