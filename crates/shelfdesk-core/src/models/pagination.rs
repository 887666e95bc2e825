use serde::{Deserialize, Serialize};

use super::Product;

/// Pagination block of the admin product listing, as sent by the server.
#[derive(Debug, Clone, Deserialize)]
pub struct PaginationInfo {
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub current_page: u32,
    #[serde(default)]
    pub has_pre: bool,
    #[serde(default)]
    pub has_next: bool,
    #[serde(default)]
    pub category: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProductsResponse {
    #[serde(default)]
    pub products: Vec<Product>,
    pub pagination: PaginationInfo,
}

/// What the pager knows about the listing beyond the current page number.
///
/// `has_previous`/`has_next` are the server's answer and are never derived
/// locally. The server's own `current_page` is not kept; the pager's page
/// number is the one that drives requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageDescriptor {
    pub total_pages: u32,
    pub has_previous: bool,
    pub has_next: bool,
    pub category: String,
}

impl Default for PageDescriptor {
    fn default() -> Self {
        Self {
            total_pages: 1,
            has_previous: false,
            has_next: false,
            category: String::new(),
        }
    }
}

impl From<PaginationInfo> for PageDescriptor {
    fn from(info: PaginationInfo) -> Self {
        Self {
            // An empty catalogue reports zero pages; keep at least one.
            total_pages: info.total_pages.max(1),
            has_previous: info.has_pre,
            has_next: info.has_next,
            category: info.category,
        }
    }
}

/// One page of products plus its pagination descriptor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductPage {
    pub products: Vec<Product>,
    pub pagination: PageDescriptor,
}

impl From<ProductsResponse> for ProductPage {
    fn from(resp: ProductsResponse) -> Self {
        Self {
            products: resp.products,
            pagination: resp.pagination.into(),
        }
    }
}
