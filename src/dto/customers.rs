use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateCustomerRequest {
    #[validate(length(min = 1, max = 255, message = "The username field is required."))]
    pub username: String,
    #[validate(
        email(message = "The email must be a valid email address."),
        length(max = 255)
    )]
    pub email: String,
    #[validate(length(min = 6, message = "The password must be at least 6 characters."))]
    pub password: String,
    #[validate(length(max = 500))]
    pub address: Option<String>,
    #[validate(length(max = 20))]
    pub phone_number: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct UpdateCustomerRequest {
    #[validate(length(min = 1, max = 255, message = "The username field is required."))]
    pub username: String,
    #[validate(
        email(message = "The email must be a valid email address."),
        length(max = 255)
    )]
    pub email: String,
    /// Left unchanged when absent.
    #[validate(length(min = 6, message = "The password must be at least 6 characters."))]
    pub password: Option<String>,
    #[validate(length(max = 500))]
    pub address: Option<String>,
    #[validate(length(max = 20))]
    pub phone_number: Option<String>,
}
