//! Validation of the `/api/posts` query string into an [`AggregationRequest`].

use thiserror::Error;

use super::types::{Direction, SortField};

/// Rejection reasons, checked in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("Tags parameter is required")]
    MissingTags,
    #[error("sortBy parameter is invalid")]
    InvalidSortBy,
    #[error("direction parameter is invalid")]
    InvalidDirection,
}

/// Query parameters exactly as received, before any validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawPostsQuery {
    pub tag: Option<String>,
    pub tags: Option<String>,
    pub sort_by: Option<String>,
    pub direction: Option<String>,
}

impl RawPostsQuery {
    /// Decode a raw query string. When a parameter repeats, the first value is kept.
    pub fn from_query_string(query: Option<&str>) -> Self {
        let mut raw = Self::default();
        let Some(query) = query else {
            return raw;
        };

        for (name, value) in url::form_urlencoded::parse(query.as_bytes()) {
            let slot = match name.as_ref() {
                "tag" => &mut raw.tag,
                "tags" => &mut raw.tags,
                "sortBy" => &mut raw.sort_by,
                "direction" => &mut raw.direction,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.into_owned());
            }
        }

        raw
    }
}

/// A validated aggregation query. `tags` is never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregationRequest {
    tags: Vec<String>,
    sort_by: SortField,
    direction: Direction,
}

impl AggregationRequest {
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn sort_by(&self) -> SortField {
        self.sort_by
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Validate raw parameters.
    ///
    /// `tags` is split on `,` with no trimming and no deduplication; empty
    /// segments are kept. `tag` is taken verbatim even when it contains a comma.
    pub fn parse(raw: &RawPostsQuery) -> Result<Self, QueryError> {
        let tags = match (non_empty(&raw.tags), non_empty(&raw.tag)) {
            (Some(list), _) => list.split(',').map(str::to_owned).collect(),
            (None, Some(single)) => vec![single.to_owned()],
            (None, None) => return Err(QueryError::MissingTags),
        };

        let sort_by = match raw.sort_by.as_deref() {
            Some(value) => SortField::parse(value).ok_or(QueryError::InvalidSortBy)?,
            None => SortField::default(),
        };

        let direction = match raw.direction.as_deref() {
            Some(value) => Direction::parse(value).ok_or(QueryError::InvalidDirection)?,
            None => Direction::default(),
        };

        Ok(Self {
            tags,
            sort_by,
            direction,
        })
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|value| !value.is_empty())
}
