use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CompanyRequest {
    #[validate(length(min = 1, max = 255, message = "The name field is required."))]
    pub name: String,
    #[validate(
        email(message = "The email must be a valid email address."),
        length(max = 255)
    )]
    pub email: String,
    #[validate(length(max = 500))]
    pub address: Option<String>,
    #[validate(length(max = 255))]
    pub website: Option<String>,
}
