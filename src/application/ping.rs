use std::sync::Arc;

use tagfeed_api_types::PingResponse;
use tracing::warn;

use crate::application::upstream::PostsSource;

const OK: u16 = 200;

/// Reports whether the upstream posts API answers the fixed probe with `200 OK`.
pub struct PingService {
    source: Arc<dyn PostsSource>,
}

impl PingService {
    pub fn new(source: Arc<dyn PostsSource>) -> Self {
        Self { source }
    }

    /// Transport failures and timeouts count as "down"; they never surface as errors.
    pub async fn check(&self) -> PingResponse {
        let success = match self.source.probe().await {
            Ok(status) => status == OK,
            Err(err) => {
                warn!(
                    target = "tagfeed::ping",
                    error = %err,
                    "upstream liveness probe failed"
                );
                false
            }
        };

        PingResponse { success }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use tagfeed_api_types::Post;

    use super::*;
    use crate::application::upstream::UpstreamError;
    use crate::domain::types::{Direction, SortField};

    struct FixedProbe(Result<u16, ()>);

    #[async_trait]
    impl PostsSource for FixedProbe {
        async fn fetch_posts(
            &self,
            _tag: &str,
            _sort_by: SortField,
            _direction: Direction,
        ) -> Result<Vec<Post>, UpstreamError> {
            Ok(Vec::new())
        }

        async fn probe(&self) -> Result<u16, UpstreamError> {
            self.0
                .map_err(|()| UpstreamError::transport("tech", "connection refused"))
        }
    }

    async fn check(probe: Result<u16, ()>) -> bool {
        PingService::new(Arc::new(FixedProbe(probe)))
            .check()
            .await
            .success
    }

    #[tokio::test]
    async fn only_exact_ok_counts_as_alive() {
        assert!(check(Ok(200)).await);
        assert!(!check(Ok(204)).await);
        assert!(!check(Ok(503)).await);
    }

    #[tokio::test]
    async fn transport_errors_report_down() {
        assert!(!check(Err(())).await);
    }
}
