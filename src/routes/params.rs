use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::dto::posts::PostStatus;

pub const DEFAULT_PER_PAGE: u64 = 15;
pub const MAX_PER_PAGE: u64 = 100;

#[derive(Debug, Default, Clone, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct Pagination {
    pub page: Option<u64>,
    pub per_page: Option<i64>,
}

impl Pagination {
    pub fn new(page: Option<u64>, per_page: Option<i64>) -> Self {
        Self { page, per_page }
    }

    /// Returns `(page, per_page, offset)`; `per_page` is clamped to `[1, 100]` and
    /// `offset` to what a Postgres `BIGINT` accepts.
    pub fn normalize(&self) -> (u64, u64, u64) {
        let page = self.page.unwrap_or(1).max(1);
        let per_page = self
            .per_page
            .unwrap_or(DEFAULT_PER_PAGE as i64)
            .clamp(1, MAX_PER_PAGE as i64) as u64;
        let offset = (page - 1).saturating_mul(per_page).min(i64::MAX as u64);
        (page, per_page, offset)
    }
}

/// Trimmed search term; `None` when absent or blank.
pub fn search_term(raw: &Option<String>) -> Option<String> {
    raw.as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}

/// Intersects a comma-separated `with` parameter with an allow-list.
///
/// `None` means the parameter was absent or blank, so the resource default applies.
/// `Some(vec![])` means names were given but none were allowed.
pub fn parse_with(raw: &Option<String>, allowed: &[&'static str]) -> Option<Vec<&'static str>> {
    let raw = raw.as_deref().map(str::trim).filter(|s| !s.is_empty())?;
    let mut relations: Vec<&'static str> = Vec::new();
    for name in raw.split(',').map(str::trim) {
        if let Some(known) = allowed.iter().find(|a| **a == name) {
            if !relations.contains(known) {
                relations.push(known);
            }
        }
    }
    Some(relations)
}

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListQuery {
    pub page: Option<u64>,
    pub per_page: Option<i64>,
    pub search: Option<String>,
    pub with: Option<String>,
}

impl ListQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination::new(self.page, self.per_page)
    }
}

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct WithQuery {
    pub with: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchQuery {
    pub search: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct OrderListQuery {
    pub page: Option<u64>,
    pub per_page: Option<i64>,
    pub search: Option<String>,
    pub customer_id: Option<i64>,
    pub with: Option<String>,
}

impl OrderListQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination::new(self.page, self.per_page)
    }
}

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct OrderDetailListQuery {
    pub page: Option<u64>,
    pub per_page: Option<i64>,
    pub order_id: Option<i64>,
    pub product_id: Option<i64>,
    pub with: Option<String>,
}

impl OrderDetailListQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination::new(self.page, self.per_page)
    }
}

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct OrderHistoryListQuery {
    pub page: Option<u64>,
    pub per_page: Option<i64>,
    pub customer_id: Option<i64>,
    pub order_id: Option<i64>,
    pub with: Option<String>,
}

impl OrderHistoryListQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination::new(self.page, self.per_page)
    }
}

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProductListQuery {
    pub page: Option<u64>,
    pub per_page: Option<i64>,
    pub search: Option<String>,
    pub category_id: Option<i64>,
    pub with: Option<String>,
}

impl ProductListQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination::new(self.page, self.per_page)
    }
}

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CategoryListQuery {
    pub page: Option<u64>,
    pub per_page: Option<i64>,
    pub search: Option<String>,
    pub parent_id: Option<i64>,
    pub with: Option<String>,
}

impl CategoryListQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination::new(self.page, self.per_page)
    }
}

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PostListQuery {
    pub page: Option<u64>,
    pub per_page: Option<i64>,
    pub search: Option<String>,
    pub status: Option<PostStatus>,
}

impl PostListQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination::new(self.page, self.per_page)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RevenueFilter {
    #[default]
    Day,
    Week,
    Month,
}

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RevenueQuery {
    pub filter: Option<RevenueFilter>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn per_page_is_clamped() {
        assert_eq!(Pagination::new(None, Some(0)).normalize(), (1, 1, 0));
        assert_eq!(Pagination::new(None, Some(500)).normalize(), (1, 100, 0));
        assert_eq!(Pagination::new(None, Some(-3)).normalize(), (1, 1, 0));
        assert_eq!(Pagination::new(Some(3), None).normalize(), (3, 15, 30));
        assert_eq!(Pagination::new(Some(0), Some(10)).normalize(), (1, 10, 0));

        let far = u64::MAX / 10;
        assert_eq!(
            Pagination::new(Some(far), Some(100)).normalize(),
            (far, 100, i64::MAX as u64)
        );
        assert_eq!(
            Pagination::new(Some(u64::MAX), None).normalize().2,
            i64::MAX as u64
        );
    }

    #[test]
    fn unknown_relations_are_dropped() {
        let allowed = &["customer", "orderDetails", "orderDetails.product"];
        let parsed = parse_with(&Some("customer, bogus,orderDetails.product".into()), allowed);
        assert_eq!(parsed, Some(vec!["customer", "orderDetails.product"]));

        assert_eq!(parse_with(&Some("bogus".into()), allowed), Some(vec![]));
        assert_eq!(parse_with(&Some("   ".into()), allowed), None);
        assert_eq!(parse_with(&None, allowed), None);
    }

    #[test]
    fn blank_search_is_ignored() {
        assert_eq!(search_term(&Some("  ".into())), None);
        assert_eq!(search_term(&Some(" ali ".into())), Some("ali".to_string()));
    }
}
