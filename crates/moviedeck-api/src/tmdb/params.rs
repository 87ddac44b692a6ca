//! Request parameter types.

use std::fmt;

/// Language and region preferences merged into every read request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locale {
    /// Response language (BCP 47, e.g. "en-US").
    pub language: String,
    /// Region (ISO 3166-1, e.g. "US"). Empty disables regional filtering.
    pub region: String,
}

impl Default for Locale {
    fn default() -> Self {
        Self {
            language: String::from("en-US"),
            region: String::from("US"),
        }
    }
}

impl Locale {
    /// Creates a locale from a language and region.
    pub fn new(language: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            region: region.into(),
        }
    }

    /// Image language preference: preferred language, then English, then untagged.
    #[must_use]
    pub fn image_languages(&self) -> String {
        format!("{},en,null", self.language)
    }
}

/// Field a discovery listing can be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    /// Popularity score.
    #[default]
    Popularity,
    /// Primary release date.
    ReleaseDate,
    /// Box office revenue.
    Revenue,
    /// Original title.
    OriginalTitle,
    /// Vote average.
    VoteAverage,
    /// Vote count.
    VoteCount,
}

impl SortField {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Popularity => "popularity",
            Self::ReleaseDate => "release_date",
            Self::Revenue => "revenue",
            Self::OriginalTitle => "original_title",
            Self::VoteAverage => "vote_average",
            Self::VoteCount => "vote_count",
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Ascending.
    Asc,
    /// Descending.
    #[default]
    Desc,
}

/// Sort key for discovery (`<field>.<asc|desc>`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SortBy {
    /// Field to sort on.
    pub field: SortField,
    /// Direction.
    pub order: SortOrder,
}

impl SortBy {
    /// Creates a sort key.
    #[must_use]
    pub const fn new(field: SortField, order: SortOrder) -> Self {
        Self { field, order }
    }
}

impl fmt::Display for SortBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let order = match self.order {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        };
        write!(f, "{}.{order}", self.field.as_str())
    }
}

/// Filters for `discover/movie`.
///
/// Every dimension is always sent; an empty list or an unset year disables
/// that filter upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoverFilters {
    /// Genre IDs that must all match.
    pub genres: Vec<u64>,
    /// Genre IDs to exclude.
    pub exclude_genres: Vec<u64>,
    /// Person IDs (cast or crew).
    pub people: Vec<u64>,
    /// Production company IDs.
    pub companies: Vec<u64>,
    /// Minimum vote average.
    pub vote_average_min: u8,
    /// Maximum vote average.
    pub vote_average_max: u8,
    /// Minimum vote count.
    pub min_vote_count: u32,
    /// First release year (inclusive, from January 1st).
    pub release_year_from: Option<i32>,
    /// Last release year (inclusive, through December 31st).
    pub release_year_to: Option<i32>,
    /// Minimum runtime in minutes.
    pub runtime_min: u32,
    /// Maximum runtime in minutes.
    pub runtime_max: u32,
    /// Sort key.
    pub sort_by: SortBy,
}

impl Default for DiscoverFilters {
    fn default() -> Self {
        Self {
            genres: Vec::new(),
            exclude_genres: Vec::new(),
            people: Vec::new(),
            companies: Vec::new(),
            vote_average_min: 0,
            vote_average_max: 10,
            min_vote_count: 0,
            release_year_from: None,
            release_year_to: None,
            runtime_min: 0,
            runtime_max: 9999,
            sort_by: SortBy::default(),
        }
    }
}

impl DiscoverFilters {
    /// Flattens the filters into `discover/movie` query parameters.
    pub(crate) fn to_query(&self) -> Vec<(&'static str, String)> {
        vec![
            ("with_genres", join_ids(&self.genres)),
            ("without_genres", join_ids(&self.exclude_genres)),
            ("with_people", join_ids(&self.people)),
            ("with_companies", join_ids(&self.companies)),
            ("vote_average.gte", self.vote_average_min.to_string()),
            ("vote_average.lte", self.vote_average_max.to_string()),
            ("vote_count.gte", self.min_vote_count.to_string()),
            (
                "primary_release_date.gte",
                self.release_year_from
                    .map_or_else(String::new, |year| format!("{year}-01-01")),
            ),
            (
                "primary_release_date.lte",
                self.release_year_to
                    .map_or_else(String::new, |year| format!("{year}-12-31")),
            ),
            ("with_runtime.gte", self.runtime_min.to_string()),
            ("with_runtime.lte", self.runtime_max.to_string()),
            ("sort_by", self.sort_by.to_string()),
        ]
    }
}

/// Joins IDs with `,` (upstream AND semantics).
fn join_ids(ids: &[u64]) -> String {
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}
