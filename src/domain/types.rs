//! Enumerations accepted on the wire as `sortBy` and `direction`.

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SortField {
    #[default]
    Id,
    Reads,
    Likes,
    Popularity,
}

impl SortField {
    pub fn as_str(self) -> &'static str {
        match self {
            SortField::Id => "id",
            SortField::Reads => "reads",
            SortField::Likes => "likes",
            SortField::Popularity => "popularity",
        }
    }

    /// Exact, case-sensitive match against the wire spelling.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "id" => Some(SortField::Id),
            "reads" => Some(SortField::Reads),
            "likes" => Some(SortField::Likes),
            "popularity" => Some(SortField::Popularity),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Asc => "asc",
            Direction::Desc => "desc",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "asc" => Some(Direction::Asc),
            "desc" => Some(Direction::Desc),
            _ => None,
        }
    }
}
