//! External JSON representations of the stored entities.
//!
//! Relation fields are `None` unless the relation was loaded and are then left out of
//! the output entirely. Decimal columns serialize as JSON numbers.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entity::{
    categories, companies, customers, order_details, order_history, orders, posts, products, users,
};

const EXCERPT_CHARS: usize = 150;
const WORDS_PER_MINUTE: usize = 200;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResource {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl From<users::Model> for UserResource {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            email: model.email,
            role: model.role,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserSummary {
    pub id: i64,
    pub name: String,
    pub email: String,
}

impl From<users::Model> for UserSummary {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            email: model.email,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CompanyResource {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub address: Option<String>,
    pub website: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<companies::Model> for CompanyResource {
    fn from(model: companies::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            email: model.email,
            address: model.address,
            website: model.website,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CustomerResource {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub address: Option<String>,
    pub phone_number: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Vec<Object>>)]
    pub orders: Option<Vec<OrderResource>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Vec<Object>>)]
    pub order_history: Option<Vec<OrderHistoryResource>>,
}

impl From<customers::Model> for CustomerResource {
    fn from(model: customers::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            email: model.email,
            address: model.address,
            phone_number: model.phone_number,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
            orders: None,
            order_history: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CategoryResource {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub parent_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub parent: Option<Box<CategoryResource>>,
}

impl From<categories::Model> for CategoryResource {
    fn from(model: categories::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            slug: model.slug,
            parent_id: model.parent_id,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
            parent: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProductResource {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub image: String,
    pub price: Decimal,
    pub sales_off: Option<Decimal>,
    pub low_price: Option<Decimal>,
    pub stock_quantity: i32,
    pub category_id: Option<i64>,
    pub active: bool,
    pub status: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<CategoryResource>,
}

impl From<products::Model> for ProductResource {
    fn from(model: products::Model) -> Self {
        Self {
            id: model.id,
            title: model.title,
            description: model.description,
            image: model.image,
            price: model.price,
            sales_off: model.sales_off,
            low_price: model.low_price,
            stock_quantity: model.stock_quantity,
            category_id: model.category_id,
            active: model.active,
            status: model.status,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
            category: None,
        }
    }
}

/// The product shape nested inside an order detail.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProductSummary {
    pub id: i64,
    pub title: String,
    pub price: Decimal,
    pub image: String,
}

impl From<products::Model> for ProductSummary {
    fn from(model: products::Model) -> Self {
        Self {
            id: model.id,
            title: model.title,
            price: model.price,
            image: model.image,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OrderResource {
    pub id: i64,
    pub customer_id: i64,
    pub order_date: DateTime<Utc>,
    pub total_price: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub customer: Option<Box<CustomerResource>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Vec<Object>>)]
    pub order_details: Option<Vec<OrderDetailResource>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Vec<Object>>)]
    pub order_history: Option<Vec<OrderHistoryResource>>,
}

impl From<orders::Model> for OrderResource {
    fn from(model: orders::Model) -> Self {
        Self {
            id: model.id,
            customer_id: model.customer_id,
            order_date: model.order_date.with_timezone(&Utc),
            total_price: model.total_price,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
            customer: None,
            order_details: None,
            order_history: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OrderDetailResource {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub order: Option<Box<OrderResource>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product: Option<ProductSummary>,
}

impl From<order_details::Model> for OrderDetailResource {
    fn from(model: order_details::Model) -> Self {
        Self {
            id: model.id,
            order_id: model.order_id,
            product_id: model.product_id,
            quantity: model.quantity,
            unit_price: model.unit_price,
            subtotal: model.subtotal(),
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
            order: None,
            product: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OrderHistoryResource {
    pub id: i64,
    pub customer_id: i64,
    pub order_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub customer: Option<Box<CustomerResource>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub order: Option<Box<OrderResource>>,
}

impl From<order_history::Model> for OrderHistoryResource {
    fn from(model: order_history::Model) -> Self {
        Self {
            id: model.id,
            customer_id: model.customer_id,
            order_id: model.order_id,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
            customer: None,
            order: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PostResource {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub status: String,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_time: Option<u64>,
}

impl PostResource {
    /// Listing shape: adds the excerpt and read time.
    pub fn with_listing_fields(mut self) -> Self {
        let text = strip_tags(&self.content);
        self.excerpt = Some(excerpt(&text, EXCERPT_CHARS));
        self.read_time = Some(read_time_minutes(&text));
        self
    }
}

impl From<posts::Model> for PostResource {
    fn from(model: posts::Model) -> Self {
        Self {
            id: model.id,
            title: model.title,
            content: model.content,
            status: model.status,
            published_at: model.published_at.map(|dt| dt.with_timezone(&Utc)),
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
            user: None,
            excerpt: None,
            read_time: None,
        }
    }
}

/// Removes everything between `<` and `>`.
pub fn strip_tags(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    for ch in html.chars() {
        match ch {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    out
}

/// Truncates to `limit` characters, appending `...` when anything was cut.
pub fn excerpt(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let cut: String = text.chars().take(limit).collect();
    format!("{}...", cut.trim_end())
}

/// Words are runs of letters, apostrophes and hyphens containing at least one letter.
pub fn word_count(text: &str) -> usize {
    text.split(|c: char| !(c.is_alphabetic() || c == '\'' || c == '-'))
        .filter(|word| word.chars().any(char::is_alphabetic))
        .count()
}

pub fn read_time_minutes(text: &str) -> u64 {
    word_count(text).div_ceil(WORDS_PER_MINUTE) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_tags_keeps_text() {
        assert_eq!(strip_tags("<p>Hello <b>world</b></p>"), "Hello world");
        assert_eq!(strip_tags("a > b"), "a > b");
    }

    #[test]
    fn excerpt_truncates_with_ellipsis() {
        assert_eq!(excerpt("short", 150), "short");
        let long = "x".repeat(200);
        let cut = excerpt(&long, 150);
        assert_eq!(cut.len(), 153);
        assert!(cut.ends_with("..."));
    }

    #[test]
    fn read_time_rounds_up() {
        assert_eq!(read_time_minutes(""), 0);
        assert_eq!(read_time_minutes("one two three"), 1);
        let text = vec!["word"; 201].join(" ");
        assert_eq!(read_time_minutes(&text), 2);
        assert_eq!(word_count("it's a well-known 42 fact"), 4);
    }

    #[test]
    fn unloaded_relations_are_absent() {
        let now = Utc::now();
        let post = PostResource {
            id: 1,
            title: "Title".into(),
            content: "Content here".into(),
            status: "draft".into(),
            published_at: None,
            created_at: now,
            updated_at: now,
            user: None,
            excerpt: None,
            read_time: None,
        };
        let value = serde_json::to_value(&post).unwrap();
        assert!(value.get("user").is_none());
        assert!(value.get("excerpt").is_none());
        assert!(value.get("published_at").unwrap().is_null());
    }

    #[test]
    fn decimals_serialize_as_numbers() {
        let now = Utc::now();
        let detail = OrderDetailResource {
            id: 1,
            order_id: 1,
            product_id: 1,
            quantity: 3,
            unit_price: Decimal::new(999, 2),
            subtotal: Decimal::new(2997, 2),
            created_at: now,
            updated_at: now,
            order: None,
            product: None,
        };
        let value = serde_json::to_value(&detail).unwrap();
        assert_eq!(value["subtotal"].as_f64(), Some(29.97));
        assert!(value.get("order").is_none());
    }
}
