//! Resource records returned by the movie API
//!
//! Records are plain immutable values. Every record decoded by the resource
//! client passes through [`Validate`] before it is handed to a caller, so a
//! malformed shape fails at the boundary instead of deep inside a view.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

use crate::constants::reviews;
use crate::errors::{ClientError, ClientResult, ValidationError};

/// Schema check applied after JSON decoding
pub trait Validate {
    fn validate(&self) -> ClientResult<()>;
}

impl<T: Validate> Validate for Vec<T> {
    fn validate(&self) -> ClientResult<()> {
        self.iter().try_for_each(Validate::validate)
    }
}

impl<T: Validate> Validate for Option<T> {
    fn validate(&self) -> ClientResult<()> {
        match self {
            Some(value) => value.validate(),
            None => Ok(()),
        }
    }
}

fn schema(reason: impl Into<String>) -> ClientError {
    ClientError::Schema {
        reason: reason.into(),
    }
}

/// Movie genre
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genre {
    pub id: i64,
    pub name: String,
}

/// A video attached to a movie (trailers, clips, featurettes)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Video {
    pub id: String,
    pub name: String,
    pub key: String,
    pub site: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub size: u32,
    #[serde(default = "default_official")]
    pub official: bool,
    #[serde(default)]
    pub published_at: String,
    #[serde(default)]
    pub iso_639_1: String,
    #[serde(default)]
    pub iso_3166_1: String,
}

fn default_official() -> bool {
    true
}

impl Video {
    /// A video without a key cannot be played on any site
    pub fn is_playable(&self) -> bool {
        !self.key.is_empty()
    }

    /// Watch URL for the hosting site, when the site is known
    pub fn watch_url(&self) -> Option<String> {
        if !self.is_playable() {
            return None;
        }
        match self.site.as_str() {
            "YouTube" => Some(format!("https://www.youtube.com/watch?v={}", self.key)),
            "Vimeo" => Some(format!("https://vimeo.com/{}", self.key)),
            _ => None,
        }
    }
}

impl Validate for Video {
    fn validate(&self) -> ClientResult<()> {
        if self.id.is_empty() {
            return Err(schema("video has an empty id"));
        }
        Ok(())
    }
}

/// Drops unplayable entries; one bad video never fails the whole list
pub fn retain_playable(videos: &mut Vec<Video>) {
    let before = videos.len();
    videos.retain(Video::is_playable);
    if videos.len() < before {
        debug!("Skipped {} video(s) without a key", before - videos.len());
    }
}

/// Movie detail or list entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub original_title: String,
    #[serde(default)]
    pub original_language: String,
    #[serde(default)]
    pub overview: String,
    #[serde(default)]
    pub tagline: String,
    #[serde(default)]
    pub release_date: String,
    #[serde(default)]
    pub runtime: u32,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub vote_count: u64,
    #[serde(default)]
    pub popularity: f64,
    #[serde(default)]
    pub poster_path: String,
    #[serde(default)]
    pub backdrop_path: String,
    #[serde(default)]
    pub homepage: String,
    #[serde(default)]
    pub imdb_id: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub adult: bool,
    #[serde(default)]
    pub budget: u64,
    #[serde(default)]
    pub revenue: u64,
    #[serde(default)]
    pub genres: Vec<Genre>,
    #[serde(default)]
    pub videos: Option<Vec<Video>>,
}

impl Movie {
    /// Localised title, falling back to the original title
    pub fn display_title(&self) -> &str {
        if self.title.is_empty() {
            &self.original_title
        } else {
            &self.title
        }
    }

    /// Year component of the release date
    pub fn release_year(&self) -> Option<&str> {
        self.release_date
            .split('-')
            .next()
            .filter(|year| !year.is_empty())
    }

    /// Runtime as `"2h 5m"`
    pub fn formatted_runtime(&self) -> String {
        format_runtime(self.runtime)
    }
}

impl Validate for Movie {
    fn validate(&self) -> ClientResult<()> {
        if self.id <= 0 {
            return Err(schema(format!("movie id must be positive, got {}", self.id)));
        }
        if self.title.is_empty() && self.original_title.is_empty() {
            return Err(schema(format!("movie {} has no title", self.id)));
        }
        self.videos.validate()
    }
}

/// Formats a runtime in minutes, omitting zero components
pub fn format_runtime(minutes: u32) -> String {
    let hours = minutes / 60;
    let mins = minutes % 60;

    let hours_part = if hours > 0 {
        format!("{hours}h ")
    } else {
        String::new()
    };
    let mins_part = if mins > 0 {
        format!("{mins}m")
    } else {
        String::new()
    };

    format!("{hours_part}{mins_part}")
}

/// Public profile of a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub avatar_url: String,
}

impl Validate for User {
    fn validate(&self) -> ClientResult<()> {
        if self.username.is_empty() {
            return Err(schema(format!("user {} has an empty username", self.id)));
        }
        Ok(())
    }
}

/// A user review, with its author embedded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: i64,
    pub movie_id: i64,
    pub user_id: i64,
    pub title: String,
    pub rating: i32,
    pub review: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    pub user: User,
}

impl Review {
    /// Whether `viewer` wrote this review
    pub fn is_owned_by(&self, viewer: Option<&User>) -> bool {
        viewer.is_some_and(|user| user.id == self.user.id)
    }

    pub fn rating_band(&self) -> RatingBand {
        RatingBand::from_rating(self.rating)
    }
}

impl Validate for Review {
    fn validate(&self) -> ClientResult<()> {
        if !(reviews::MIN_RATING..=reviews::MAX_RATING).contains(&self.rating) {
            return Err(schema(format!(
                "review {} rating {} outside {}..={}",
                self.id,
                self.rating,
                reviews::MIN_RATING,
                reviews::MAX_RATING
            )));
        }
        self.user.validate()
    }
}

/// Rating buckets used when presenting a score
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatingBand {
    Poor,
    Mixed,
    Good,
    Perfect,
}

impl RatingBand {
    pub fn from_rating(rating: i32) -> Self {
        match rating {
            i32::MIN..=3 => RatingBand::Poor,
            4..=6 => RatingBand::Mixed,
            7..=9 => RatingBand::Good,
            _ => RatingBand::Perfect,
        }
    }
}

/// A page of reviews; a non-array body decodes to an empty page
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
#[serde(transparent)]
pub struct ReviewPage(pub Vec<Review>);

impl<'de> Deserialize<'de> for ReviewPage {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        match value {
            serde_json::Value::Array(_) => serde_json::from_value(value)
                .map(ReviewPage)
                .map_err(serde::de::Error::custom),
            _ => Ok(ReviewPage::default()),
        }
    }
}

impl ReviewPage {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// A full page is the only signal that another page may exist
    pub fn is_full(&self, page_size: usize) -> bool {
        self.0.len() == page_size
    }

    pub fn iter(&self) -> impl Iterator<Item = &Review> {
        self.0.iter()
    }
}

impl Validate for ReviewPage {
    fn validate(&self) -> ClientResult<()> {
        self.0.validate()
    }
}

/// Editable fields of a review, as submitted to the API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewDraft {
    pub title: String,
    pub rating: i32,
    pub review: String,
}

impl Default for ReviewDraft {
    fn default() -> Self {
        Self {
            title: String::new(),
            rating: reviews::DEFAULT_RATING,
            review: String::new(),
        }
    }
}

impl From<&Review> for ReviewDraft {
    fn from(review: &Review) -> Self {
        Self {
            title: review.title.clone(),
            rating: review.rating,
            review: review.review.clone(),
        }
    }
}

impl ReviewDraft {
    pub fn new(title: impl Into<String>, rating: i32, review: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            rating,
            review: review.into(),
        }
    }

    /// Checks the draft against the form rules before it is submitted
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::TitleRequired);
        }
        if self.title.chars().count() > reviews::MAX_TITLE_LENGTH {
            return Err(ValidationError::TitleTooLong {
                max: reviews::MAX_TITLE_LENGTH,
            });
        }
        if self.review.chars().count() > reviews::MAX_REVIEW_LENGTH {
            return Err(ValidationError::ReviewTooLong {
                max: reviews::MAX_REVIEW_LENGTH,
            });
        }
        if !(reviews::MIN_RATING..=reviews::MAX_RATING).contains(&self.rating) {
            return Err(ValidationError::RatingOutOfRange {
                value: self.rating,
                min: reviews::MIN_RATING,
                max: reviews::MAX_RATING,
            });
        }
        Ok(())
    }
}
