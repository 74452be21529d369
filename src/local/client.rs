use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};

use crate::api::{InventoryApi, ProductQuery};
use crate::domain::{
    Credentials, LoginResponse, MovementRequest, Page, Product, ProductRequest, StockMovement,
    SyncSummary,
};
use crate::error::ApiError;
use crate::messages::{BackendRequest, ServiceResponse};

/// Client for the in-process backend.
#[derive(Clone)]
pub struct LocalInventory {
    sender: mpsc::Sender<BackendRequest>,
}

impl LocalInventory {
    pub(super) fn new(sender: mpsc::Sender<BackendRequest>) -> Self {
        Self { sender }
    }

    async fn call<T>(
        &self,
        request: impl FnOnce(ServiceResponse<T, ApiError>) -> BackendRequest,
    ) -> Result<T, ApiError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(request(respond_to))
            .await
            .map_err(|_| ApiError::Unavailable("Actor closed".to_string()))?;
        response
            .await
            .map_err(|_| ApiError::Unavailable("Actor dropped".to_string()))?
    }

    pub async fn shutdown(&self) -> Result<(), ApiError> {
        self.sender
            .send(BackendRequest::Shutdown)
            .await
            .map_err(|_| ApiError::Unavailable("Actor closed".to_string()))
    }
}

#[async_trait]
impl InventoryApi for LocalInventory {
    async fn login(&self, credentials: Credentials) -> Result<LoginResponse, ApiError> {
        self.call(|respond_to| BackendRequest::Login { credentials, respond_to }).await
    }

    async fn list_products(&self, query: ProductQuery) -> Result<Page<Product>, ApiError> {
        self.call(|respond_to| BackendRequest::ListProducts { query, respond_to }).await
    }

    async fn get_product(&self, id: u64) -> Result<Product, ApiError> {
        self.call(|respond_to| BackendRequest::GetProduct { id, respond_to }).await
    }

    async fn create_product(&self, request: ProductRequest) -> Result<Product, ApiError> {
        self.call(|respond_to| BackendRequest::CreateProduct { request, respond_to }).await
    }

    async fn update_product(&self, id: u64, request: ProductRequest) -> Result<Product, ApiError> {
        self.call(|respond_to| BackendRequest::UpdateProduct { id, request, respond_to }).await
    }

    async fn delete_product(&self, id: u64) -> Result<(), ApiError> {
        self.call(|respond_to| BackendRequest::DeleteProduct { id, respond_to }).await
    }

    async fn sync_products(&self) -> Result<SyncSummary, ApiError> {
        self.call(|respond_to| BackendRequest::SyncProducts { respond_to }).await
    }

    async fn register_movement(&self, request: MovementRequest) -> Result<StockMovement, ApiError> {
        self.call(|respond_to| BackendRequest::RegisterMovement { request, respond_to }).await
    }
}
