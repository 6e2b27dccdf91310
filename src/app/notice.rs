//! Transient user-visible notices
//!
//! Failures that should not take over a view are reported as a [`Notice`]:
//! a short, dismissible message. A 401 never produces a notice; it routes to
//! a sign-in affordance instead.

use std::fmt;

use crate::app::mutation::MutationKind;
use crate::errors::ErrorInfo;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
}

/// A short message shown to the user and then dismissed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub description: Option<String>,
}

/// Which read a notice is about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryContext {
    CurrentUser,
    Movie,
    MyReview,
    Reviews,
    Videos,
    Trending,
    Search,
}

impl Notice {
    pub fn error(title: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            title: title.into(),
            description: None,
        }
    }

    pub fn success(title: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            title: title.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Notice for a failed read; `None` for 401
    pub fn for_query_error(context: QueryContext, error: &ErrorInfo) -> Option<Self> {
        if error.is_unauthenticated() {
            return None;
        }

        let notice = match context {
            QueryContext::CurrentUser => Notice::error("Oops! We couldn't load your info.")
                .with_description("Try again later"),
            QueryContext::Movie => Notice::error("Couldn't load this movie"),
            QueryContext::MyReview => Notice::error("Couldn't load your review"),
            QueryContext::Reviews => Notice::error("Couldn't load reviews"),
            QueryContext::Videos => Notice::error("Couldn't load videos"),
            QueryContext::Trending => Notice::error("Couldn't load trending movies"),
            QueryContext::Search => Notice::error("Search failed").with_description("Try again later"),
        };
        Some(notice)
    }

    /// Notice for a failed write
    pub fn for_mutation_error(kind: MutationKind) -> Self {
        match kind {
            MutationKind::SaveReview => Notice::error("Failed to save your review. Try again."),
            MutationKind::DeleteReview => Notice::error("Failed to delete this review. Try again."),
            MutationKind::Logout => {
                Notice::error("Oops! We couldn't log you out.").with_description("Try again later")
            }
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.title)?;
        if let Some(description) = &self.description {
            write!(f, " {description}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unauthenticated_has_no_notice() {
        let error = ErrorInfo::with_cause("Unauthorized", 401);
        assert!(Notice::for_query_error(QueryContext::MyReview, &error).is_none());
    }

    #[test]
    fn test_query_notice_text() {
        let error = ErrorInfo::with_cause("Internal", 500);
        let notice = Notice::for_query_error(QueryContext::Reviews, &error).unwrap();
        assert_eq!(notice.level, NoticeLevel::Error);
        assert_eq!(notice.to_string(), "Couldn't load reviews");
    }

    #[test]
    fn test_mutation_notice_text() {
        let notice = Notice::for_mutation_error(MutationKind::Logout);
        assert_eq!(notice.description.as_deref(), Some("Try again later"));
        assert_eq!(
            Notice::for_mutation_error(MutationKind::DeleteReview).title,
            "Failed to delete this review. Try again."
        );
    }
}
