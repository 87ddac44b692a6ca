//! Response normalizer: raw TMDB payloads into display-ready values.

use serde::de::DeserializeOwned;

use super::types::{
    TmdbAccount, TmdbAccountStates, TmdbCompanyResult, TmdbCredits, TmdbGenre, TmdbMovieDetails,
    TmdbMovieResult, TmdbPage, TmdbPersonResult, TmdbRated,
};
use crate::error::ApiError;
use crate::model::{
    AccountState, CastMember, CompanyListItem, Credits, CrewMember, GenreListItem, Image, Movie,
    MovieListItem, Paginated, PersonListItem, UserAccount, Video, round_rating,
};

/// Only videos hosted here are kept.
const VIDEO_SITE: &str = "YouTube";

/// Playback URL prefix for [`VIDEO_SITE`].
const VIDEO_URL_PREFIX: &str = "https://www.youtube.com/watch?v=";

/// Image class, each served at its own size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    /// Movie poster.
    Poster,
    /// Movie backdrop.
    Backdrop,
    /// Person profile photo.
    Profile,
    /// Company logo.
    Logo,
}

impl ImageKind {
    /// CDN size token.
    #[must_use]
    pub const fn size(self) -> &'static str {
        match self {
            Self::Poster | Self::Logo => "w500",
            Self::Backdrop => "w780",
            Self::Profile => "w185",
        }
    }
}

/// Builds `<base>/<size>/<path>`, or an empty string when there is no path.
#[must_use]
pub fn image_url(base: &str, kind: ImageKind, path: Option<&str>) -> String {
    match path.map(|p| p.trim_start_matches('/')) {
        Some(p) if !p.is_empty() => {
            format!("{}/{}/{p}", base.trim_end_matches('/'), kind.size())
        }
        _ => String::new(),
    }
}

/// First `-`-delimited segment of a release date.
#[must_use]
pub fn release_year(date: Option<&str>) -> String {
    date.and_then(|d| d.split('-').next())
        .map(String::from)
        .unwrap_or_default()
}

/// Localized title, falling back to the original title when blank.
fn display_title(title: Option<String>, original_title: Option<&str>) -> String {
    match title {
        Some(t) if !t.trim().is_empty() => t,
        _ => original_title.map(String::from).unwrap_or_default(),
    }
}

/// Decodes a JSON body, logging and collapsing failures into `Unknown`.
///
/// # Errors
///
/// Returns `ApiError::Unknown` when the body does not match `T`.
pub fn decode<T: DeserializeOwned>(path: &str, body: &str) -> Result<T, ApiError> {
    serde_json::from_str(body).map_err(|e| {
        tracing::warn!(path, error = %e, "failed to decode TMDB response");
        ApiError::Unknown
    })
}

/// Converts raw payloads into model values using a fixed image CDN base.
#[derive(Debug, Clone)]
pub struct Normalizer {
    image_base: String,
}

impl Normalizer {
    /// Creates a normalizer for the given image CDN base.
    pub fn new(image_base: impl Into<String>) -> Self {
        Self {
            image_base: image_base.into(),
        }
    }

    fn image(&self, kind: ImageKind, path: Option<&str>) -> String {
        image_url(&self.image_base, kind, path)
    }

    /// Maps a raw page, clamping page numbers to at least 1.
    pub fn page<T, U>(
        &self,
        raw: TmdbPage<T>,
        mut item: impl FnMut(&Self, T) -> U,
    ) -> Paginated<U> {
        Paginated {
            items: raw.results.into_iter().map(|r| item(self, r)).collect(),
            page: raw.page.max(1),
            total_pages: raw.total_pages.max(1),
            total_results: raw.total_results,
        }
    }

    /// Movie list item.
    #[must_use]
    pub fn movie_item(&self, raw: TmdbMovieResult) -> MovieListItem {
        MovieListItem {
            id: raw.id,
            release_year: release_year(raw.release_date.as_deref()),
            rating: round_rating(raw.vote_average),
            poster_url: self.image(ImageKind::Poster, raw.poster_path.as_deref()),
            backdrop_url: self.image(ImageKind::Backdrop, raw.backdrop_path.as_deref()),
            title: display_title(raw.title, raw.original_title.as_deref()),
        }
    }

    /// Person list item.
    #[must_use]
    pub fn person_item(&self, raw: TmdbPersonResult) -> PersonListItem {
        PersonListItem {
            id: raw.id,
            profile_url: self.image(ImageKind::Profile, raw.profile_path.as_deref()),
            name: raw.name,
            known_for_department: raw.known_for_department.unwrap_or_default(),
        }
    }

    /// Company list item.
    #[must_use]
    pub fn company_item(&self, raw: TmdbCompanyResult) -> CompanyListItem {
        CompanyListItem {
            id: raw.id,
            logo_url: self.image(ImageKind::Logo, raw.logo_path.as_deref()),
            name: raw.name,
        }
    }

    /// Full movie aggregate.
    #[must_use]
    pub fn movie(&self, raw: TmdbMovieDetails) -> Movie {
        let videos = raw
            .videos
            .map(|list| list.results)
            .unwrap_or_default()
            .into_iter()
            .filter(|v| v.site == VIDEO_SITE)
            .map(|v| Video {
                url: format!("{VIDEO_URL_PREFIX}{}", v.key),
                name: v.name,
                site: v.site,
                key: v.key,
            })
            .collect();

        let images = raw
            .images
            .map(|set| {
                let posters = set
                    .posters
                    .iter()
                    .map(|i| self.image(ImageKind::Poster, Some(i.file_path.as_str())));
                let backdrops = set
                    .backdrops
                    .iter()
                    .map(|i| self.image(ImageKind::Backdrop, Some(i.file_path.as_str())));
                posters
                    .chain(backdrops)
                    .filter(|url| !url.is_empty())
                    .map(|url| Image { url })
                    .collect()
            })
            .unwrap_or_default();

        let original_title = raw.original_title.clone().unwrap_or_default();
        let release_date = raw.release_date.clone().unwrap_or_default();

        Movie {
            id: raw.id,
            title: display_title(raw.title, raw.original_title.as_deref()),
            original_title,
            release_year: release_year(raw.release_date.as_deref()),
            release_date,
            runtime: raw.runtime,
            vote_average: round_rating(raw.vote_average),
            vote_count: raw.vote_count,
            overview: raw.overview,
            poster_url: self.image(ImageKind::Poster, raw.poster_path.as_deref()),
            backdrop_url: self.image(ImageKind::Backdrop, raw.backdrop_path.as_deref()),
            genres: raw.genres.into_iter().map(genre).collect(),
            videos,
            images,
        }
    }

    /// Cast and crew.
    #[must_use]
    pub fn credits(&self, raw: TmdbCredits) -> Credits {
        Credits {
            cast: raw
                .cast
                .into_iter()
                .map(|c| CastMember {
                    id: c.id,
                    profile_url: self.image(ImageKind::Profile, c.profile_path.as_deref()),
                    name: c.name,
                    character: c.character.unwrap_or_default(),
                })
                .collect(),
            crew: raw
                .crew
                .into_iter()
                .map(|c| CrewMember {
                    id: c.id,
                    profile_url: self.image(ImageKind::Profile, c.profile_path.as_deref()),
                    name: c.name,
                    job: c.job.unwrap_or_default(),
                })
                .collect(),
        }
    }
}

/// Genre entry.
#[must_use]
pub fn genre(raw: TmdbGenre) -> GenreListItem {
    GenreListItem {
        id: raw.id,
        name: raw.name,
    }
}

/// Account details.
#[must_use]
pub fn account(raw: TmdbAccount) -> UserAccount {
    UserAccount {
        id: raw.id,
        username: raw.username,
    }
}

/// Account state, resolving the two `rated` shapes.
///
/// # Errors
///
/// Returns `ApiError::Unknown` for `"rated": true`, which carries no value.
pub fn account_state(raw: TmdbAccountStates) -> Result<AccountState, ApiError> {
    let rating = match raw.rated {
        Some(TmdbRated::Rated { value }) => Some(rating_value(value)),
        Some(TmdbRated::Flag(false)) | None => None,
        Some(TmdbRated::Flag(true)) => {
            tracing::warn!("account state reports rated without a value");
            return Err(ApiError::Unknown);
        }
    };
    Ok(AccountState {
        favorite: raw.favorite,
        watchlist: raw.watchlist,
        rating,
    })
}

/// Rounds a rating value onto the 0-10 integer scale.
fn rating_value(value: f64) -> u8 {
    let rounded = value.round();
    (0..=10u8)
        .rev()
        .find(|n| f64::from(*n) <= rounded)
        .unwrap_or(0)
}
