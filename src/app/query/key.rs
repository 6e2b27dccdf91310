//! Query keys: ordered identifiers for cacheable requests

use std::fmt;

use crate::constants::keys as seg;

/// One segment of a [`QueryKey`]
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum KeySegment {
    Text(String),
    Number(i64),
}

impl From<&str> for KeySegment {
    fn from(value: &str) -> Self {
        KeySegment::Text(value.to_string())
    }
}

impl From<String> for KeySegment {
    fn from(value: String) -> Self {
        KeySegment::Text(value)
    }
}

impl From<i64> for KeySegment {
    fn from(value: i64) -> Self {
        KeySegment::Number(value)
    }
}

impl From<i32> for KeySegment {
    fn from(value: i32) -> Self {
        KeySegment::Number(i64::from(value))
    }
}

impl From<u32> for KeySegment {
    fn from(value: u32) -> Self {
        KeySegment::Number(i64::from(value))
    }
}

impl fmt::Display for KeySegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeySegment::Text(text) => write!(f, "{text:?}"),
            KeySegment::Number(n) => write!(f, "{n}"),
        }
    }
}

/// Ordered tuple of segments; the sole index of the query cache
///
/// Two keys are equal iff all segments are equal in order and value, so
/// `["movies", 5]` and `["movies", "5"]` are different keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct QueryKey(Vec<KeySegment>);

impl QueryKey {
    pub fn new(segments: Vec<KeySegment>) -> Self {
        Self(segments)
    }

    /// Returns a new key with `segment` appended
    pub fn with(mut self, segment: impl Into<KeySegment>) -> Self {
        self.0.push(segment.into());
        self
    }

    pub fn segments(&self) -> &[KeySegment] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether `prefix` matches the leading segments of this key
    pub fn starts_with(&self, prefix: &QueryKey) -> bool {
        self.0.starts_with(&prefix.0)
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{segment}")?;
        }
        f.write_str("]")
    }
}

/// Builds a [`QueryKey`] from mixed string and number segments
///
/// ```
/// use flickmeter::query_key;
///
/// let key = query_key!["movies", 42_i64, "reviews", 1_u32];
/// assert_eq!(key.to_string(), r#"["movies", 42, "reviews", 1]"#);
/// ```
#[macro_export]
macro_rules! query_key {
    ($($segment:expr),* $(,)?) => {
        $crate::app::query::QueryKey::new(vec![
            $($crate::app::query::KeySegment::from($segment)),*
        ])
    };
}

/// Key namespace shared by readers and invalidators
pub mod keys {
    use super::*;

    /// `["movies", id]`; also the prefix of every per-movie key
    pub fn movie(movie_id: i64) -> QueryKey {
        QueryKey::default().with(seg::MOVIES).with(movie_id)
    }

    /// `["movies", id, "reviews", page]`
    pub fn movie_reviews(movie_id: i64, page: u32) -> QueryKey {
        movie(movie_id).with(seg::REVIEWS).with(page)
    }

    /// `["movies", id, "reviews", "me"]`
    pub fn my_review(movie_id: i64) -> QueryKey {
        movie(movie_id).with(seg::REVIEWS).with(seg::ME)
    }

    /// `["movies", id, "videos"]`
    pub fn movie_videos(movie_id: i64) -> QueryKey {
        movie(movie_id).with(seg::VIDEOS)
    }

    /// `["trending", "daily" | "weekly"]`
    pub fn trending(weekly: bool) -> QueryKey {
        QueryKey::default()
            .with(seg::TRENDING)
            .with(if weekly { seg::WEEKLY } else { seg::DAILY })
    }

    /// `["movies", "search", query]`
    pub fn search(query: &str) -> QueryKey {
        QueryKey::default()
            .with(seg::MOVIES)
            .with("search")
            .with(query)
    }

    /// `["users", "me"]`
    pub fn current_user() -> QueryKey {
        QueryKey::default().with(seg::USERS).with(seg::ME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_equality_is_segment_wise() {
        assert_eq!(keys::movie(5), query_key!["movies", 5_i64]);
        assert_ne!(keys::movie(5), query_key!["movies", "5"]);
        assert_ne!(keys::movie(5), keys::movie(6));
    }

    #[test]
    fn test_prefix_matching() {
        let movie = keys::movie(42);
        assert!(keys::my_review(42).starts_with(&movie));
        assert!(keys::movie_reviews(42, 3).starts_with(&movie));
        assert!(keys::movie_videos(42).starts_with(&movie));
        assert!(movie.starts_with(&movie));
        assert!(!keys::my_review(43).starts_with(&movie));
        assert!(!keys::trending(true).starts_with(&movie));
        assert!(keys::current_user().starts_with(&QueryKey::default()));
    }

    #[test]
    fn test_namespace_shapes() {
        assert_eq!(
            keys::my_review(7).to_string(),
            r#"["movies", 7, "reviews", "me"]"#
        );
        assert_eq!(keys::trending(false).to_string(), r#"["trending", "daily"]"#);
        assert_eq!(keys::current_user().to_string(), r#"["users", "me"]"#);
    }

    #[test]
    fn test_page_and_me_do_not_collide() {
        assert_ne!(keys::movie_reviews(1, 1), keys::my_review(1));
        assert!(!keys::movie_reviews(1, 1).starts_with(&keys::my_review(1)));
    }
}
