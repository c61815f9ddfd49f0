//! Read-only catalog access.
//!
//! Categories and products are public: no token is required and nothing
//! here touches the store. Results are always fetched fresh.

use bazaar_core::{Category, CategoryId, Product, ProductId};
use tracing::instrument;

use crate::api::{ApiClient, ProductQuery};
use crate::error::Result;

/// Catalog browsing over the shared API client.
#[derive(Debug, Clone)]
pub struct Catalog {
    api: ApiClient,
}

impl Catalog {
    #[must_use]
    pub const fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn list_categories(&self) -> Result<Vec<Category>> {
        Ok(self.api.get_categories().await?)
    }

    /// # Errors
    ///
    /// Returns an error if the request fails or the category does not exist.
    #[instrument(skip(self), fields(category_id = %id))]
    pub async fn get_category(&self, id: &CategoryId) -> Result<Category> {
        Ok(self.api.get_category(id).await?)
    }

    /// Products matching `query`, in server order.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn list_products(&self, query: &ProductQuery) -> Result<Vec<Product>> {
        Ok(self.api.get_products(query).await?)
    }

    /// # Errors
    ///
    /// Returns an error if the request fails or the product does not exist.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product(&self, id: &ProductId) -> Result<Product> {
        Ok(self.api.get_product(id).await?)
    }
}
