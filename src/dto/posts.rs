use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PostStatus {
    Draft,
    Published,
    Archived,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Draft => "draft",
            PostStatus::Published => "published",
            PostStatus::Archived => "archived",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "draft" => Some(PostStatus::Draft),
            "published" => Some(PostStatus::Published),
            "archived" => Some(PostStatus::Archived),
            _ => None,
        }
    }

    /// Explicit publish/archive transitions; staying in place is not a transition.
    pub fn can_transition_to(self, next: PostStatus) -> bool {
        matches!(
            (self, next),
            (PostStatus::Draft, PostStatus::Published)
                | (PostStatus::Archived, PostStatus::Published)
                | (PostStatus::Draft, PostStatus::Archived)
                | (PostStatus::Published, PostStatus::Archived)
        )
    }
}

fn known_status(value: &str) -> Result<(), ValidationError> {
    if PostStatus::parse(value).is_none() {
        let mut err = ValidationError::new("in");
        err.message = Some("The status must be draft, published, or archived.".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct PostRequest {
    #[validate(length(
        min = 3,
        max = 255,
        message = "The title must be between 3 and 255 characters."
    ))]
    pub title: String,
    #[validate(length(min = 10, message = "The content must be at least 10 characters."))]
    pub content: String,
    #[validate(custom(function = "known_status"))]
    pub status: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}

impl PostRequest {
    pub fn status(&self) -> Option<PostStatus> {
        self.status.as_deref().and_then(PostStatus::parse)
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct PostStats {
    pub total: u64,
    pub published: u64,
    pub draft: u64,
    pub archived: u64,
    pub this_month: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transitions_follow_lifecycle() {
        use PostStatus::*;
        assert!(Draft.can_transition_to(Published));
        assert!(Published.can_transition_to(Archived));
        assert!(Archived.can_transition_to(Published));
        assert!(!Published.can_transition_to(Published));
        assert!(!Archived.can_transition_to(Archived));
        assert!(!Published.can_transition_to(Draft));
    }

    #[test]
    fn unknown_status_fails_validation() {
        let request = PostRequest {
            title: "A title".into(),
            content: "Long enough content".into(),
            status: Some("deleted".into()),
            published_at: None,
        };
        let errors = request.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("status"));
    }
}
