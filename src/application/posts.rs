use std::sync::Arc;

use futures::future::try_join_all;
use tagfeed_api_types::PostsResponse;
use tracing::{debug, instrument};

use crate::application::upstream::{PostsSource, UpstreamError};
use crate::domain::{merge::merge_posts, query::AggregationRequest};

/// Fans an aggregation request out to the upstream source, one call per tag.
pub struct PostsService {
    source: Arc<dyn PostsSource>,
}

impl PostsService {
    pub fn new(source: Arc<dyn PostsSource>) -> Self {
        Self { source }
    }

    /// All tag fetches run concurrently; the first failure aborts the whole request.
    #[instrument(
        skip_all,
        fields(
            tags = request.tags().len(),
            sort_by = request.sort_by().as_str(),
            direction = request.direction().as_str(),
        )
    )]
    pub async fn aggregate(
        &self,
        request: &AggregationRequest,
    ) -> Result<PostsResponse, UpstreamError> {
        let fetches = request.tags().iter().map(|tag| {
            self.source
                .fetch_posts(tag, request.sort_by(), request.direction())
        });
        let collections = try_join_all(fetches).await?;

        let fetched: usize = collections.iter().map(Vec::len).sum();
        let posts = merge_posts(collections, request.sort_by(), request.direction());
        debug!(fetched, merged = posts.len(), "aggregated upstream posts");

        Ok(PostsResponse { posts })
    }
}
