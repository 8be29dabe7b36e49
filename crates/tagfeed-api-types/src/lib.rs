//! Wire types shared by the tagfeed server and its upstream client.
//!
//! The upstream posts API and the aggregation endpoint speak the same
//! `{"posts": [...]}` envelope, so both sides deserialize into [`PostsResponse`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single blog post as returned by the upstream search API.
///
/// Only the fields the aggregator sorts or deduplicates on are typed. Every
/// other field the upstream sends (`author`, `authorId`, ...) is kept in
/// `extra` and serialized back unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: u64,
    pub tags: Vec<String>,
    pub reads: u64,
    pub likes: u64,
    pub popularity: f64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Post {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|candidate| candidate == tag)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostsResponse {
    pub posts: Vec<Post>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PingResponse {
    pub success: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
