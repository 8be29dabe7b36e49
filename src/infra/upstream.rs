//! `reqwest` adapter for the hatchways blog-posts search API.

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use tagfeed_api_types::{Post, PostsResponse};
use tracing::{debug, instrument};

use crate::{
    application::upstream::{PostsSource, UpstreamError},
    config::UpstreamSettings,
    domain::types::{Direction, SortField},
    infra::error::InfraError,
};

#[derive(Clone, Debug)]
pub struct HatchwaysClient {
    client: Client,
    base: Url,
    probe_tag: String,
}

impl HatchwaysClient {
    pub fn new(settings: &UpstreamSettings) -> Result<Self, InfraError> {
        let client = Client::builder()
            .user_agent(Self::user_agent())
            .timeout(settings.timeout)
            .build()
            .map_err(|err| InfraError::http_client(err.to_string()))?;

        Ok(Self {
            client,
            base: settings.base_url.clone(),
            probe_tag: settings.probe_tag.clone(),
        })
    }

    pub fn user_agent() -> &'static str {
        concat!("tagfeed/", env!("CARGO_PKG_VERSION"))
    }

    fn url(&self, query: &[(&str, &str)]) -> Url {
        let mut url = self.base.clone();
        url.set_query(None);
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        url
    }

    async fn get(&self, tag: &str, url: Url) -> Result<reqwest::Response, UpstreamError> {
        self.client
            .get(url)
            .send()
            .await
            .map_err(|err| classify(tag, err))
    }
}

fn classify(tag: &str, err: reqwest::Error) -> UpstreamError {
    if err.is_timeout() {
        UpstreamError::timeout(tag)
    } else if err.is_decode() {
        UpstreamError::decode(tag, err.to_string())
    } else {
        UpstreamError::transport(tag, err.to_string())
    }
}

#[async_trait]
impl PostsSource for HatchwaysClient {
    #[instrument(
        skip(self, sort_by, direction),
        fields(sort_by = sort_by.as_str(), direction = direction.as_str())
    )]
    async fn fetch_posts(
        &self,
        tag: &str,
        sort_by: SortField,
        direction: Direction,
    ) -> Result<Vec<Post>, UpstreamError> {
        let url = self.url(&[
            ("tag", tag),
            ("sortBy", sort_by.as_str()),
            ("direction", direction.as_str()),
        ]);
        let response = self.get(tag, url).await?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::status(tag, status.as_u16()));
        }

        let body: PostsResponse = response.json().await.map_err(|err| classify(tag, err))?;
        debug!(
            target = "tagfeed::upstream",
            posts = body.posts.len(),
            "fetched tag"
        );
        Ok(body.posts)
    }

    async fn probe(&self) -> Result<u16, UpstreamError> {
        let url = self.url(&[("tag", self.probe_tag.as_str())]);
        let response = self.get(&self.probe_tag, url).await?;
        let status = response.status();
        debug!(
            target = "tagfeed::upstream",
            status = status.as_u16(),
            ok = status == StatusCode::OK,
            "probe answered"
        );
        Ok(status.as_u16())
    }
}
