use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

#[derive(Debug, Deserialize, ToSchema)]
pub struct Pagination {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl Pagination {
    pub fn normalize(&self) -> (i64, i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let per_page = self.per_page.unwrap_or(20).clamp(1, 100);
        let offset = (page - 1) * per_page;
        (page, per_page, offset)
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ProductSort {
    /// Newest first; the default.
    #[default]
    Latest,
    PriceAsc,
    PriceDesc,
}

/// Catalog filters. Any change of filter or sort on the client starts a
/// fresh first page; `cursor` continues the previous page under the same
/// parameters.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CatalogQuery {
    pub category: Option<String>,
    /// Lexicographic prefix match on the product name, not a ranked search.
    pub search: Option<String>,
    pub featured: Option<bool>,
    pub sort: Option<ProductSort>,
    pub page_size: Option<i64>,
    pub cursor: Option<String>,
}

impl CatalogQuery {
    pub fn page_size(&self) -> i64 {
        self.page_size.unwrap_or(12).clamp(1, 50)
    }
}

/// Opaque keyset cursor: the sort key of the last returned row (price in
/// cents, or the creation timestamp in microseconds) plus its id as the
/// tie-break.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PageCursor {
    pub key: i64,
    pub id: Uuid,
}

impl PageCursor {
    pub fn encode(&self) -> String {
        // Serializing two plain fields cannot fail.
        let json = serde_json::to_vec(self).unwrap_or_default();
        URL_SAFE_NO_PAD.encode(json)
    }

    pub fn decode(raw: &str) -> AppResult<Self> {
        let bytes = URL_SAFE_NO_PAD
            .decode(raw)
            .map_err(|_| AppError::BadRequest("invalid cursor".to_string()))?;
        serde_json::from_slice(&bytes)
            .map_err(|_| AppError::BadRequest("invalid cursor".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_clamps_out_of_range_values() {
        let p = Pagination {
            page: Some(0),
            per_page: Some(1000),
        };
        assert_eq!(p.normalize(), (1, 100, 0));

        let p = Pagination {
            page: None,
            per_page: None,
        };
        assert_eq!(p.normalize(), (1, 20, 0));
    }

    #[test]
    fn cursor_survives_the_wire() {
        let cursor = PageCursor {
            key: 129900,
            id: Uuid::new_v4(),
        };
        assert_eq!(PageCursor::decode(&cursor.encode()).unwrap(), cursor);
    }

    #[test]
    fn garbage_cursors_are_a_bad_request() {
        assert!(PageCursor::decode("not a cursor!").is_err());
        assert!(PageCursor::decode(&URL_SAFE_NO_PAD.encode(b"{}")).is_err());
    }

    #[test]
    fn page_size_defaults_and_clamps() {
        let q = CatalogQuery {
            category: None,
            search: None,
            featured: None,
            sort: None,
            page_size: None,
            cursor: None,
        };
        assert_eq!(q.page_size(), 12);

        let q = CatalogQuery {
            page_size: Some(500),
            ..q
        };
        assert_eq!(q.page_size(), 50);
    }
}
