use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Pagination metadata for list responses; all fields are absent on non-list responses.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq, Eq)]
pub struct Meta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_page: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_page: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_page: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    pub from: Option<u64>,
    pub to: Option<u64>,
}

impl Meta {
    /// `count` is the number of items actually on this page.
    pub fn new(page: u64, per_page: u64, total: u64, count: u64) -> Self {
        let last_page = total.div_ceil(per_page).max(1);
        let (from, to) = if count == 0 {
            (None, None)
        } else {
            let from = (page - 1).saturating_mul(per_page).saturating_add(1);
            (Some(from), Some(from.saturating_add(count - 1)))
        };
        Self {
            current_page: Some(page),
            last_page: Some(last_page),
            per_page: Some(per_page),
            total: Some(total),
            from,
            to,
        }
    }

    pub fn empty() -> Self {
        Self {
            current_page: None,
            last_page: None,
            per_page: None,
            total: None,
            from: None,
            to: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    pub message: String,
    pub data: Option<T>,
    pub meta: Option<Meta>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(message: impl Into<String>, data: T, meta: Option<Meta>) -> Self {
        Self {
            message: message.into(),
            data: Some(data),
            meta,
        }
    }
}

/// One page of items together with its pagination metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub meta: Meta,
}

impl<T: Serialize> Page<T> {
    pub fn into_response(self, message: impl Into<String>) -> ApiResponse<Vec<T>> {
        ApiResponse::success(message, self.items, Some(self.meta))
    }
}

#[cfg(test)]
mod tests {
    use super::Meta;

    #[test]
    fn meta_reports_item_window() {
        let meta = Meta::new(2, 15, 40, 15);
        assert_eq!(meta.last_page, Some(3));
        assert_eq!(meta.from, Some(16));
        assert_eq!(meta.to, Some(30));

        let last = Meta::new(3, 15, 40, 10);
        assert_eq!(last.from, Some(31));
        assert_eq!(last.to, Some(40));
    }

    #[test]
    fn far_pages_saturate() {
        let meta = Meta::new(u64::MAX / 10, 100, 40, 1);
        assert_eq!(meta.from, Some(u64::MAX));
        assert_eq!(meta.to, Some(u64::MAX));
    }

    #[test]
    fn empty_page_has_no_window() {
        let meta = Meta::new(1, 15, 0, 0);
        assert_eq!(meta.last_page, Some(1));
        assert_eq!(meta.from, None);
        assert_eq!(meta.to, None);
    }
}
