//! Merge, deduplicate and sort per-tag upstream results.

use std::cmp::Ordering;
use std::collections::HashSet;

use tagfeed_api_types::Post;

use super::types::{Direction, SortField};

type Comparator = fn(&Post, &Post) -> Ordering;

/// Ascending comparator for a sort field.
pub fn comparator(field: SortField) -> Comparator {
    match field {
        SortField::Id => by_id,
        SortField::Reads => by_reads,
        SortField::Likes => by_likes,
        SortField::Popularity => by_popularity,
    }
}

fn by_id(a: &Post, b: &Post) -> Ordering {
    a.id.cmp(&b.id)
}

fn by_reads(a: &Post, b: &Post) -> Ordering {
    a.reads.cmp(&b.reads)
}

fn by_likes(a: &Post, b: &Post) -> Ordering {
    a.likes.cmp(&b.likes)
}

fn by_popularity(a: &Post, b: &Post) -> Ordering {
    a.popularity.total_cmp(&b.popularity)
}

/// Flatten `collections` in order, keep the first post seen for each `id`,
/// then stable-sort by `field` in `direction`.
///
/// Descending order reverses the comparator rather than the output, so posts
/// with equal keys keep their first-occurrence order either way.
pub fn merge_posts<I>(collections: I, field: SortField, direction: Direction) -> Vec<Post>
where
    I: IntoIterator<Item = Vec<Post>>,
{
    let mut merged: Vec<Post> = collections.into_iter().flatten().collect();

    let mut seen = HashSet::with_capacity(merged.len());
    merged.retain(|post| seen.insert(post.id));

    let compare = comparator(field);
    match direction {
        Direction::Asc => merged.sort_by(compare),
        Direction::Desc => merged.sort_by(|a, b| compare(b, a)),
    }

    merged
}

#[cfg(test)]
mod tests {
    use serde_json::{Map, Value};

    use super::*;

    fn post(id: u64, reads: u64, likes: u64, popularity: f64, tags: &[&str]) -> Post {
        Post {
            id,
            tags: tags.iter().map(|tag| tag.to_string()).collect(),
            reads,
            likes,
            popularity,
            extra: Map::new(),
        }
    }

    fn authored(id: u64, likes: u64, author: &str) -> Post {
        let mut post = post(id, 0, likes, 0.0, &["tech"]);
        post.extra
            .insert("author".to_string(), Value::from(author.to_string()));
        post
    }

    fn ids(posts: &[Post]) -> Vec<u64> {
        posts.iter().map(|post| post.id).collect()
    }

    #[test]
    fn empty_input_yields_empty_output() {
        let merged = merge_posts(Vec::<Vec<Post>>::new(), SortField::Id, Direction::Asc);
        assert!(merged.is_empty());

        let merged = merge_posts(vec![Vec::new(), Vec::new()], SortField::Likes, Direction::Desc);
        assert!(merged.is_empty());
    }

    #[test]
    fn duplicate_ids_keep_first_occurrence() {
        let tech = vec![authored(2, 10, "first"), authored(1, 5, "a")];
        let health = vec![authored(3, 1, "b"), authored(2, 10, "second")];

        let merged = merge_posts(vec![tech, health], SortField::Id, Direction::Asc);

        assert_eq!(ids(&merged), [1, 2, 3]);
        assert_eq!(merged[1].extra["author"], "first");
    }

    #[test]
    fn sorts_each_field_in_both_directions() {
        let posts = vec![
            post(1, 300, 20, 0.5, &["a"]),
            post(2, 100, 30, 0.9, &["a"]),
            post(3, 200, 10, 0.1, &["a"]),
        ];

        let cases = [
            (SortField::Id, Direction::Asc, [1, 2, 3]),
            (SortField::Id, Direction::Desc, [3, 2, 1]),
            (SortField::Reads, Direction::Asc, [2, 3, 1]),
            (SortField::Reads, Direction::Desc, [1, 3, 2]),
            (SortField::Likes, Direction::Asc, [3, 1, 2]),
            (SortField::Likes, Direction::Desc, [2, 1, 3]),
            (SortField::Popularity, Direction::Asc, [3, 1, 2]),
            (SortField::Popularity, Direction::Desc, [2, 1, 3]),
        ];

        for (field, direction, expected) in cases {
            let merged = merge_posts(vec![posts.clone()], field, direction);
            assert_eq!(ids(&merged), expected, "{field:?} {direction:?}");
        }
    }

    #[test]
    fn equal_keys_keep_first_occurrence_order() {
        let first = vec![post(9, 0, 7, 0.0, &["a"]), post(4, 0, 1, 0.0, &["a"])];
        let second = vec![post(2, 0, 7, 0.0, &["b"]), post(5, 0, 7, 0.0, &["b"])];

        let asc = merge_posts(vec![first.clone(), second.clone()], SortField::Likes, Direction::Asc);
        assert_eq!(ids(&asc), [4, 9, 2, 5]);

        let desc = merge_posts(vec![first, second], SortField::Likes, Direction::Desc);
        assert_eq!(ids(&desc), [9, 2, 5, 4]);
    }

    #[test]
    fn adjacent_pairs_respect_direction() {
        let collections = vec![
            (0..20).map(|i| post(i, (i * 37) % 11, i % 4, 0.0, &["x"])).collect::<Vec<_>>(),
            (10..30).map(|i| post(i, (i * 37) % 11, i % 4, 0.0, &["y"])).collect(),
        ];

        let desc = merge_posts(collections.clone(), SortField::Reads, Direction::Desc);
        assert_eq!(desc.len(), 30);
        assert!(desc.windows(2).all(|pair| pair[0].reads >= pair[1].reads));

        let asc = merge_posts(collections, SortField::Reads, Direction::Asc);
        assert!(asc.windows(2).all(|pair| pair[0].reads <= pair[1].reads));
    }
}
