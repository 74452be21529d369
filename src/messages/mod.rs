use tokio::sync::oneshot;

use crate::api::ProductQuery;
use crate::domain::{
    Credentials, LoginResponse, MovementRequest, Page, Product, ProductRequest, StockMovement,
    SyncSummary,
};
use crate::error::{ApiError, QueryError};
use crate::query::{FetchRequest, ListState};

/// Generic type aliases for service communication
pub type ServiceResult<T, E> = std::result::Result<T, E>;
pub type ServiceResponse<T, E> = oneshot::Sender<ServiceResult<T, E>>;

/// Commands accepted by the query coordinator. Each variant carries a oneshot
/// channel that is answered once the command has been applied to the state.
#[derive(Debug)]
pub enum QueryRequest {
    SetSearch {
        text: String,
        respond_to: ServiceResponse<(), QueryError>,
    },
    SetCategory {
        text: String,
        respond_to: ServiceResponse<(), QueryError>,
    },
    SetPageSize {
        size: u32,
        respond_to: ServiceResponse<(), QueryError>,
    },
    GoToPage {
        page: u32,
        respond_to: ServiceResponse<(), QueryError>,
    },
    Refresh {
        respond_to: ServiceResponse<(), QueryError>,
    },
    ReportError {
        message: String,
        respond_to: ServiceResponse<(), QueryError>,
    },
    Snapshot {
        respond_to: ServiceResponse<ListState, QueryError>,
    },
    Shutdown,
}

/// Completion of a spawned fetch, delivered back into the coordinator's loop.
#[derive(Debug)]
pub struct FetchOutcome {
    pub request: FetchRequest,
    pub result: Result<Page<Product>, ApiError>,
}

/// Requests served by the in-process backend, mirroring the HTTP contract.
#[derive(Debug)]
pub enum BackendRequest {
    Login {
        credentials: Credentials,
        respond_to: ServiceResponse<LoginResponse, ApiError>,
    },
    ListProducts {
        query: ProductQuery,
        respond_to: ServiceResponse<Page<Product>, ApiError>,
    },
    GetProduct {
        id: u64,
        respond_to: ServiceResponse<Product, ApiError>,
    },
    CreateProduct {
        request: ProductRequest,
        respond_to: ServiceResponse<Product, ApiError>,
    },
    UpdateProduct {
        id: u64,
        request: ProductRequest,
        respond_to: ServiceResponse<Product, ApiError>,
    },
    DeleteProduct {
        id: u64,
        respond_to: ServiceResponse<(), ApiError>,
    },
    SyncProducts {
        respond_to: ServiceResponse<SyncSummary, ApiError>,
    },
    RegisterMovement {
        request: MovementRequest,
        respond_to: ServiceResponse<StockMovement, ApiError>,
    },
    Shutdown,
}
