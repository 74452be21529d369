//! # Mock Framework
//!
//! Scripted stand-in for the HTTP collaborator.
//!
//! Use [`create_mock_api`] to get an [`InventoryApi`] and a receiver. Every
//! call made through the api shows up on the receiver together with a
//! responder, so a test decides what each request returns and, just as
//! important for the coordinator, in which order the responses land.

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};

use crate::api::{InventoryApi, ProductQuery};
use crate::domain::{
    Credentials, LoginResponse, MovementRequest, Page, Product, ProductRequest, StockMovement,
    SyncSummary,
};
use crate::error::ApiError;

pub type Responder<T> = oneshot::Sender<Result<T, ApiError>>;

/// One request observed by the mock, with the channel to answer it on.
#[derive(Debug)]
pub enum ApiCall {
    Login {
        credentials: Credentials,
        respond_to: Responder<LoginResponse>,
    },
    ListProducts {
        query: ProductQuery,
        respond_to: Responder<Page<Product>>,
    },
    GetProduct {
        id: u64,
        respond_to: Responder<Product>,
    },
    CreateProduct {
        request: ProductRequest,
        respond_to: Responder<Product>,
    },
    UpdateProduct {
        id: u64,
        request: ProductRequest,
        respond_to: Responder<Product>,
    },
    DeleteProduct {
        id: u64,
        respond_to: Responder<()>,
    },
    SyncProducts {
        respond_to: Responder<SyncSummary>,
    },
    RegisterMovement {
        request: MovementRequest,
        respond_to: Responder<StockMovement>,
    },
}

#[derive(Clone)]
pub struct MockApi {
    sender: mpsc::Sender<ApiCall>,
}

/// Creates a mock api and the receiver its calls are delivered to.
pub fn create_mock_api(buffer_size: usize) -> (MockApi, mpsc::Receiver<ApiCall>) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    (MockApi { sender }, receiver)
}

macro_rules! mock_call {
    ($self:ident, $variant:ident { $($field:ident),* }) => {{
        let (respond_to, response) = oneshot::channel();
        $self
            .sender
            .send(ApiCall::$variant { $($field,)* respond_to })
            .await
            .map_err(|_| ApiError::Unavailable("mock closed".to_string()))?;
        response
            .await
            .map_err(|_| ApiError::Unavailable("mock dropped".to_string()))?
    }};
}

#[async_trait]
impl InventoryApi for MockApi {
    async fn login(&self, credentials: Credentials) -> Result<LoginResponse, ApiError> {
        mock_call!(self, Login { credentials })
    }

    async fn list_products(&self, query: ProductQuery) -> Result<Page<Product>, ApiError> {
        mock_call!(self, ListProducts { query })
    }

    async fn get_product(&self, id: u64) -> Result<Product, ApiError> {
        mock_call!(self, GetProduct { id })
    }

    async fn create_product(&self, request: ProductRequest) -> Result<Product, ApiError> {
        mock_call!(self, CreateProduct { request })
    }

    async fn update_product(&self, id: u64, request: ProductRequest) -> Result<Product, ApiError> {
        mock_call!(self, UpdateProduct { id, request })
    }

    async fn delete_product(&self, id: u64) -> Result<(), ApiError> {
        mock_call!(self, DeleteProduct { id })
    }

    async fn sync_products(&self) -> Result<SyncSummary, ApiError> {
        mock_call!(self, SyncProducts {})
    }

    async fn register_movement(&self, request: MovementRequest) -> Result<StockMovement, ApiError> {
        mock_call!(self, RegisterMovement { request })
    }
}

/// Helper to verify that the next call is a login
pub async fn expect_login(
    receiver: &mut mpsc::Receiver<ApiCall>,
) -> Option<(Credentials, Responder<LoginResponse>)> {
    match receiver.recv().await {
        Some(ApiCall::Login { credentials, respond_to }) => Some((credentials, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next call is a product listing
pub async fn expect_list(
    receiver: &mut mpsc::Receiver<ApiCall>,
) -> Option<(ProductQuery, Responder<Page<Product>>)> {
    match receiver.recv().await {
        Some(ApiCall::ListProducts { query, respond_to }) => Some((query, respond_to)),
        _ => None,
    }
}

pub async fn expect_get(
    receiver: &mut mpsc::Receiver<ApiCall>,
) -> Option<(u64, Responder<Product>)> {
    match receiver.recv().await {
        Some(ApiCall::GetProduct { id, respond_to }) => Some((id, respond_to)),
        _ => None,
    }
}

pub async fn expect_create(
    receiver: &mut mpsc::Receiver<ApiCall>,
) -> Option<(ProductRequest, Responder<Product>)> {
    match receiver.recv().await {
        Some(ApiCall::CreateProduct { request, respond_to }) => Some((request, respond_to)),
        _ => None,
    }
}

pub async fn expect_update(
    receiver: &mut mpsc::Receiver<ApiCall>,
) -> Option<(u64, ProductRequest, Responder<Product>)> {
    match receiver.recv().await {
        Some(ApiCall::UpdateProduct { id, request, respond_to }) => Some((id, request, respond_to)),
        _ => None,
    }
}

pub async fn expect_delete(
    receiver: &mut mpsc::Receiver<ApiCall>,
) -> Option<(u64, Responder<()>)> {
    match receiver.recv().await {
        Some(ApiCall::DeleteProduct { id, respond_to }) => Some((id, respond_to)),
        _ => None,
    }
}

pub async fn expect_sync(receiver: &mut mpsc::Receiver<ApiCall>) -> Option<Responder<SyncSummary>> {
    match receiver.recv().await {
        Some(ApiCall::SyncProducts { respond_to }) => Some(respond_to),
        _ => None,
    }
}

pub async fn expect_movement(
    receiver: &mut mpsc::Receiver<ApiCall>,
) -> Option<(MovementRequest, Responder<StockMovement>)> {
    match receiver.recv().await {
        Some(ApiCall::RegisterMovement { request, respond_to }) => Some((request, respond_to)),
        _ => None,
    }
}

/// Builds a product with fixed supplier and date; only the fields tests care
/// about vary.
pub fn product(id: u64, name: &str, stock: u32) -> Product {
    Product {
        id,
        name: name.to_string(),
        category: "general".to_string(),
        supplier: "ACME".to_string(),
        price: 9.99,
        stock,
        registration_date: chrono::NaiveDate::from_ymd_opt(2025, 1, 1)
            .and_then(|d| d.and_hms_opt(10, 0, 0))
            .unwrap_or_default(),
    }
}

/// A page holding `names` as products, positioned as page `page_number` of a
/// listing with `total_elements` items.
pub fn page_of(
    names: &[&str],
    page_number: u32,
    page_size: u32,
    total_elements: u64,
) -> Page<Product> {
    let total_pages = total_elements.div_ceil(u64::from(page_size.max(1))) as u32;
    Page {
        content: names
            .iter()
            .enumerate()
            .map(|(i, name)| product(i as u64 + 1, name, 10))
            .collect(),
        page_number,
        page_size,
        total_elements,
        total_pages,
        first: page_number == 0,
        last: page_number + 1 >= total_pages,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_api() {
        let (api, mut receiver) = create_mock_api(10);

        let task = tokio::spawn(async move { api.get_product(7).await });

        let (id, responder) = expect_get(&mut receiver).await.expect("Expected GetProduct");
        assert_eq!(id, 7);
        responder.send(Ok(product(7, "Lamp", 3))).unwrap();

        let result = task.await.unwrap();
        assert_eq!(result.map(|p| p.name), Ok("Lamp".to_string()));
    }

    #[tokio::test]
    async fn dropped_receiver_is_unavailable() {
        let (api, receiver) = create_mock_api(1);
        drop(receiver);
        assert!(matches!(api.delete_product(1).await, Err(ApiError::Unavailable(_))));
    }
}
