//! The HTTP collaborator contract and its remote implementation.

mod http;

pub use http::HttpInventoryApi;

use async_trait::async_trait;

use crate::domain::{
    Credentials, LoginResponse, MovementRequest, Page, Product, ProductRequest, StockMovement,
    SyncSummary,
};
use crate::error::ApiError;

/// Typed requests against the inventory service.
///
/// Every call is non-blocking; failures of any kind (transport, timeout,
/// business-rule rejection) come back as an [`ApiError`].
#[async_trait]
pub trait InventoryApi: Send + Sync {
    async fn login(&self, credentials: Credentials) -> Result<LoginResponse, ApiError>;
    async fn list_products(&self, query: ProductQuery) -> Result<Page<Product>, ApiError>;
    async fn get_product(&self, id: u64) -> Result<Product, ApiError>;
    async fn create_product(&self, request: ProductRequest) -> Result<Product, ApiError>;
    async fn update_product(&self, id: u64, request: ProductRequest) -> Result<Product, ApiError>;
    async fn delete_product(&self, id: u64) -> Result<(), ApiError>;
    async fn sync_products(&self) -> Result<SyncSummary, ApiError>;
    async fn register_movement(&self, request: MovementRequest) -> Result<StockMovement, ApiError>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortField {
    Id,
    Name,
    Category,
    Supplier,
    Price,
    Stock,
    #[default]
    RegistrationDate,
}

impl SortField {
    pub fn as_str(self) -> &'static str {
        match self {
            SortField::Id => "id",
            SortField::Name => "name",
            SortField::Category => "category",
            SortField::Supplier => "supplier",
            SortField::Price => "price",
            SortField::Stock => "stock",
            SortField::RegistrationDate => "registrationDate",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

/// Query string of `GET /products`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductQuery {
    pub page: u32,
    pub size: u32,
    pub sort_by: SortField,
    pub sort_dir: SortDirection,
    pub search: Option<String>,
    pub category: Option<String>,
}

impl ProductQuery {
    pub fn new(page: u32, size: u32) -> Self {
        Self {
            page,
            size,
            sort_by: SortField::default(),
            sort_dir: SortDirection::default(),
            search: None,
            category: None,
        }
    }

    /// Sets the search filter; blank text means "no filter".
    pub fn with_search(mut self, search: &str) -> Self {
        self.search = non_blank(search);
        self
    }

    /// Sets the category filter; blank text means "no filter".
    pub fn with_category(mut self, category: &str) -> Self {
        self.category = non_blank(category);
        self
    }

    /// Query parameters in wire order; optional filters are omitted when unset.
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("page", self.page.to_string()),
            ("size", self.size.to_string()),
            ("sortBy", self.sort_by.as_str().to_string()),
            ("sortDir", self.sort_dir.as_str().to_string()),
        ];
        if let Some(search) = &self.search {
            params.push(("search", search.clone()));
        }
        if let Some(category) = &self.category {
            params.push(("categoria", category.clone()));
        }
        params
    }
}

fn non_blank(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_default_to_newest_first_and_skip_empty_filters() {
        let query = ProductQuery::new(0, 10).with_search("   ").with_category("");
        assert_eq!(
            query.to_params(),
            vec![
                ("page", "0".to_string()),
                ("size", "10".to_string()),
                ("sortBy", "registrationDate".to_string()),
                ("sortDir", "desc".to_string()),
            ]
        );
    }

    #[test]
    fn params_include_filters() {
        let query = ProductQuery::new(2, 25).with_search(" lamp ").with_category("home");
        let params = query.to_params();
        assert!(params.contains(&("search", "lamp".to_string())));
        assert!(params.contains(&("categoria", "home".to_string())));
    }
}
