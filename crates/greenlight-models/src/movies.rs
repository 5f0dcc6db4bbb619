//! Movie domain models, DTOs and list filters.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use sqlx::FromRow;
use validator::{Validate, ValidationError};

/// Columns a movie list may be sorted by; a leading `-` sorts descending.
pub const SORT_SAFELIST: &[&str] = &[
    "id", "title", "year", "runtime", "-id", "-title", "-year", "-runtime",
];

/// Running time in minutes, written as `"102 mins"` in JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, sqlx::Type)]
#[sqlx(transparent)]
pub struct Runtime(pub i32);

impl fmt::Display for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} mins", self.0)
    }
}

impl FromStr for Runtime {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let minutes = s
            .strip_suffix(" mins")
            .ok_or_else(|| "invalid runtime format".to_string())?;
        minutes
            .parse()
            .map(Runtime)
            .map_err(|_| "invalid runtime format".to_string())
    }
}

impl Serialize for Runtime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Runtime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

#[derive(Serialize, FromRow, Debug, Clone, PartialEq, Eq)]
pub struct Movie {
    pub id: i64,
    #[serde(skip)]
    pub created_at: DateTime<Utc>,
    pub title: String,
    #[serde(skip_serializing_if = "is_zero")]
    pub year: i32,
    pub runtime: Runtime,
    pub genres: Vec<String>,
    pub version: i32,
}

fn is_zero(value: &i32) -> bool {
    *value == 0
}

fn validation_error(code: &'static str, message: &'static str) -> ValidationError {
    ValidationError::new(code).with_message(Cow::Borrowed(message))
}

fn validate_year(year: i32) -> Result<(), ValidationError> {
    if year < 1888 {
        return Err(validation_error("year", "must be greater than 1888"));
    }
    if year > Utc::now().year() {
        return Err(validation_error("year", "must not be in the future"));
    }
    Ok(())
}

fn validate_runtime(runtime: &Runtime) -> Result<(), ValidationError> {
    if runtime.0 <= 0 {
        return Err(validation_error("runtime", "must be a positive integer"));
    }
    Ok(())
}

fn validate_genres(genres: &[String]) -> Result<(), ValidationError> {
    if genres.is_empty() {
        return Err(validation_error("genres", "must contain at least 1 genre"));
    }
    if genres.len() > 5 {
        return Err(validation_error("genres", "must not contain more than 5 genres"));
    }
    let mut seen = std::collections::HashSet::new();
    if !genres.iter().all(|genre| seen.insert(genre)) {
        return Err(validation_error("genres", "must not contain duplicate values"));
    }
    Ok(())
}

fn validate_year_field(year: i32) -> Result<(), ValidationError> {
    validate_year(year)
}

#[allow(clippy::ptr_arg)]
fn validate_genres_field(genres: &Vec<String>) -> Result<(), ValidationError> {
    validate_genres(genres)
}

/// `POST /v1/movies`
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct CreateMovieDto {
    #[validate(length(min = 1, max = 500, message = "must be between 1 and 500 bytes long"))]
    pub title: String,
    #[validate(custom(function = "validate_year_field"))]
    pub year: i32,
    #[validate(custom(function = "validate_runtime"))]
    pub runtime: Runtime,
    #[validate(custom(function = "validate_genres_field"))]
    pub genres: Vec<String>,
}

/// `PATCH /v1/movies/{id}`; absent fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct UpdateMovieDto {
    #[validate(length(min = 1, max = 500, message = "must be between 1 and 500 bytes long"))]
    pub title: Option<String>,
    #[validate(custom(function = "validate_year_field"))]
    pub year: Option<i32>,
    #[validate(custom(function = "validate_runtime"))]
    pub runtime: Option<Runtime>,
    #[validate(custom(function = "validate_genres_field"))]
    pub genres: Option<Vec<String>>,
}

impl UpdateMovieDto {
    pub fn apply(self, movie: &mut Movie) {
        if let Some(title) = self.title {
            movie.title = title;
        }
        if let Some(year) = self.year {
            movie.year = year;
        }
        if let Some(runtime) = self.runtime {
            movie.runtime = runtime;
        }
        if let Some(genres) = self.genres {
            movie.genres = genres;
        }
    }
}

fn default_page() -> u32 {
    1
}

fn default_page_size() -> u32 {
    20
}

fn default_sort() -> String {
    "id".to_string()
}

fn validate_sort(sort: &str) -> Result<(), ValidationError> {
    if SORT_SAFELIST.contains(&sort) {
        Ok(())
    } else {
        Err(validation_error("sort", "invalid sort value"))
    }
}

#[allow(clippy::ptr_arg)]
fn validate_sort_field(sort: &String) -> Result<(), ValidationError> {
    validate_sort(sort)
}

/// Query string of `GET /v1/movies`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct MovieFilters {
    pub title: Option<String>,
    /// Comma-separated genres that must all be present.
    pub genres: Option<String>,
    #[serde(default = "default_page")]
    #[validate(range(min = 1, max = 10_000_000, message = "must be between 1 and 10000000"))]
    pub page: u32,
    #[serde(default = "default_page_size")]
    #[validate(range(min = 1, max = 100, message = "must be between 1 and 100"))]
    pub page_size: u32,
    #[serde(default = "default_sort")]
    #[validate(custom(function = "validate_sort_field"))]
    pub sort: String,
}

impl Default for MovieFilters {
    fn default() -> Self {
        Self {
            title: None,
            genres: None,
            page: default_page(),
            page_size: default_page_size(),
            sort: default_sort(),
        }
    }
}

impl MovieFilters {
    pub fn genre_list(&self) -> Vec<String> {
        self.genres
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|genre| !genre.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Column name with the direction prefix stripped. Only safelisted
    /// values ever reach this point.
    pub fn sort_column(&self) -> &str {
        self.sort.trim_start_matches('-')
    }

    pub fn sort_descending(&self) -> bool {
        self.sort.starts_with('-')
    }

    pub fn limit(&self) -> u32 {
        self.page_size
    }

    pub fn offset(&self) -> u32 {
        (self.page - 1) * self.page_size
    }
}

/// Pagination details returned alongside a movie list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Metadata {
    #[serde(skip_serializing_if = "is_zero_u32")]
    pub current_page: u32,
    #[serde(skip_serializing_if = "is_zero_u32")]
    pub page_size: u32,
    #[serde(skip_serializing_if = "is_zero_u32")]
    pub first_page: u32,
    #[serde(skip_serializing_if = "is_zero_u32")]
    pub last_page: u32,
    #[serde(skip_serializing_if = "is_zero_u64")]
    pub total_records: u64,
}

fn is_zero_u32(value: &u32) -> bool {
    *value == 0
}

fn is_zero_u64(value: &u64) -> bool {
    *value == 0
}

impl Metadata {
    pub fn calculate(total_records: u64, page: u32, page_size: u32) -> Self {
        if total_records == 0 || page_size == 0 {
            return Self::default();
        }
        let last_page = total_records.div_ceil(u64::from(page_size));
        Self {
            current_page: page,
            page_size,
            first_page: 1,
            last_page: u32::try_from(last_page).unwrap_or(u32::MAX),
            total_records,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runtime_json_format() {
        let json = serde_json::to_string(&Runtime(102)).unwrap();
        assert_eq!(json, "\"102 mins\"");

        let parsed: Runtime = serde_json::from_str("\"95 mins\"").unwrap();
        assert_eq!(parsed, Runtime(95));

        assert!(serde_json::from_str::<Runtime>("\"95\"").is_err());
        assert!(serde_json::from_str::<Runtime>("95").is_err());
    }

    #[test]
    fn test_create_movie_validation() {
        let dto = CreateMovieDto {
            title: "Moana".to_string(),
            year: 2016,
            runtime: Runtime(107),
            genres: vec!["animation".to_string(), "adventure".to_string()],
        };
        assert!(dto.validate().is_ok());

        let bad = CreateMovieDto {
            title: String::new(),
            year: 1700,
            runtime: Runtime(-1),
            genres: vec!["drama".to_string(), "drama".to_string()],
        };
        let errors = bad.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("title"));
        assert!(fields.contains_key("year"));
        assert!(fields.contains_key("runtime"));
        assert!(fields.contains_key("genres"));
    }

    #[test]
    fn test_update_movie_validates_present_year() {
        let future = UpdateMovieDto {
            year: Some(Utc::now().year() + 1),
            ..UpdateMovieDto::default()
        };
        let errors = future.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("year"));

        let absent = UpdateMovieDto::default();
        assert!(absent.validate().is_ok());
    }

    #[test]
    fn test_update_applies_present_fields_only() {
        let mut movie = Movie {
            id: 1,
            created_at: Utc::now(),
            title: "Black Panther".to_string(),
            year: 2018,
            runtime: Runtime(134),
            genres: vec!["action".to_string()],
            version: 1,
        };

        UpdateMovieDto {
            year: Some(2019),
            ..UpdateMovieDto::default()
        }
        .apply(&mut movie);

        assert_eq!(movie.year, 2019);
        assert_eq!(movie.title, "Black Panther");
    }

    #[test]
    fn test_filters_sorting_and_paging() {
        let filters = MovieFilters {
            page: 3,
            page_size: 10,
            sort: "-year".to_string(),
            genres: Some("drama, comedy,".to_string()),
            ..MovieFilters::default()
        };
        assert!(filters.validate().is_ok());
        assert_eq!(filters.sort_column(), "year");
        assert!(filters.sort_descending());
        assert_eq!(filters.offset(), 20);
        assert_eq!(filters.genre_list(), vec!["drama", "comedy"]);

        let bad = MovieFilters {
            sort: "password_hash".to_string(),
            ..MovieFilters::default()
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_metadata() {
        let metadata = Metadata::calculate(45, 2, 20);
        assert_eq!(metadata.last_page, 3);
        assert_eq!(metadata.first_page, 1);
        assert_eq!(Metadata::calculate(0, 1, 20), Metadata::default());
    }
}
