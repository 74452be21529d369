use std::sync::Arc;

use tokio::sync::watch;
use tracing::{info, instrument, warn};

use super::forms::{MovementForm, ProductForm};
use crate::api::InventoryApi;
use crate::domain::{Product, StockMovement, SyncSummary};
use crate::error::{ApiError, ClientError};
use crate::query::{ListState, QueryClient};
use crate::session::SessionManager;

const DELETE_FAILED: &str = "Failed to delete product";
const CREATE_FAILED: &str = "Failed to create product";
const UPDATE_FAILED: &str = "Failed to update product";
const LOAD_PRODUCT_FAILED: &str = "Failed to load product";
const MOVEMENT_FAILED: &str = "Failed to register movement";
const SYNC_FAILED: &str = "Failed to synchronize products";

/// The product list screen.
///
/// Holds no state of its own: the listing lives in the query coordinator and
/// the username in the session manager. Mutations go straight to the api and
/// are followed by a refresh of the listing.
#[derive(Clone)]
pub struct ListViewController {
    session: Arc<SessionManager>,
    query: QueryClient,
    api: Arc<dyn InventoryApi>,
}

impl ListViewController {
    pub fn new(
        session: Arc<SessionManager>,
        query: QueryClient,
        api: Arc<dyn InventoryApi>,
    ) -> Self {
        Self { session, query, api }
    }

    /// Initial load of the screen.
    pub async fn open(&self) -> Result<(), ClientError> {
        self.query.refresh().await?;
        Ok(())
    }

    pub fn username(&self) -> Option<String> {
        self.session.username()
    }

    pub fn state(&self) -> ListState {
        self.query.state()
    }

    pub fn subscribe(&self) -> watch::Receiver<ListState> {
        self.query.subscribe()
    }

    pub fn page_indices(&self) -> Vec<u32> {
        self.query.state().page_indices()
    }

    pub async fn set_search(&self, text: impl Into<String>) -> Result<(), ClientError> {
        self.query.set_search(text.into()).await?;
        Ok(())
    }

    pub async fn set_category(&self, text: impl Into<String>) -> Result<(), ClientError> {
        self.query.set_category(text.into()).await?;
        Ok(())
    }

    pub async fn set_page_size(&self, size: u32) -> Result<(), ClientError> {
        self.query.set_page_size(size).await?;
        Ok(())
    }

    pub async fn go_to_page(&self, page: u32) -> Result<(), ClientError> {
        self.query.go_to_page(page).await?;
        Ok(())
    }

    pub async fn refresh(&self) -> Result<(), ClientError> {
        self.query.refresh().await?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn delete_product(&self, id: u64) -> Result<(), ClientError> {
        match self.api.delete_product(id).await {
            Ok(()) => {
                info!("Product deleted");
                self.refresh().await
            }
            Err(e) => Err(self.fail(e, DELETE_FAILED).await),
        }
    }

    #[instrument(skip(self, form))]
    pub async fn create_product(&self, form: &ProductForm) -> Result<Product, ClientError> {
        let request = form.validate()?;
        match self.api.create_product(request).await {
            Ok(product) => {
                info!(id = product.id, "Product created");
                self.refresh().await?;
                Ok(product)
            }
            Err(e) => Err(self.fail(e, CREATE_FAILED).await),
        }
    }

    #[instrument(skip(self, form))]
    pub async fn update_product(
        &self,
        id: u64,
        form: &ProductForm,
    ) -> Result<Product, ClientError> {
        let request = form.validate()?;
        match self.api.update_product(id, request).await {
            Ok(product) => {
                info!("Product updated");
                self.refresh().await?;
                Ok(product)
            }
            Err(e) => Err(self.fail(e, UPDATE_FAILED).await),
        }
    }

    /// Fetches a product for the edit form.
    #[instrument(skip(self))]
    pub async fn load_product(&self, id: u64) -> Result<Product, ClientError> {
        match self.api.get_product(id).await {
            Ok(product) => Ok(product),
            Err(e) => Err(self.fail(e, LOAD_PRODUCT_FAILED).await),
        }
    }

    #[instrument(skip(self, form))]
    pub async fn register_movement(
        &self,
        form: &MovementForm,
    ) -> Result<StockMovement, ClientError> {
        let request = form.validate()?;
        match self.api.register_movement(request).await {
            Ok(movement) => {
                info!(
                    product_id = movement.product_id,
                    stock_after = movement.stock_after,
                    "Movement registered"
                );
                self.refresh().await?;
                Ok(movement)
            }
            Err(e) => Err(self.fail(e, MOVEMENT_FAILED).await),
        }
    }

    /// Pulls the external catalogue, then shows the first page.
    #[instrument(skip(self))]
    pub async fn sync_products(&self) -> Result<SyncSummary, ClientError> {
        match self.api.sync_products().await {
            Ok(summary) => {
                info!(inserted = summary.inserted, "Catalogue synchronized");
                self.go_to_page(0).await?;
                Ok(summary)
            }
            Err(e) => Err(self.fail(e, SYNC_FAILED).await),
        }
    }

    pub fn logout(&self) -> Result<(), ClientError> {
        self.session.logout().map_err(|e| ClientError::Session(e.into()))
    }

    /// Shows the failure in the list's error slot and hands it back.
    async fn fail(&self, error: ApiError, default: &str) -> ClientError {
        let message = error.user_message(default);
        warn!(error = %error, "{}", message);
        if let Err(e) = self.query.report_error(message).await {
            warn!(error = %e, "Could not report failure to the list");
        }
        error.into()
    }
}
