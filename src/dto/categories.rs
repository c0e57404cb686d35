use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CategoryRequest {
    #[validate(length(min = 1, max = 255, message = "The name field is required."))]
    pub name: String,
    #[validate(length(min = 1, max = 255, message = "The slug field is required."))]
    pub slug: String,
    /// `0` or absent makes the category a root.
    pub parent_id: Option<i64>,
}

impl CategoryRequest {
    pub fn parent(&self) -> Option<i64> {
        self.parent_id.filter(|id| *id != 0)
    }
}
