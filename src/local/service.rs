use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{Duration, NaiveDateTime};
use tokio::sync::mpsc;
use tracing::{debug, error, info, instrument, warn};

use super::catalog::seed_catalog;
use super::client::LocalInventory;
use crate::api::{ProductQuery, SortDirection, SortField};
use crate::domain::{
    Credentials, LoginResponse, MovementKind, MovementRequest, Page, Product, ProductRequest,
    StockMovement, SyncSummary,
};
use crate::error::ApiError;
use crate::messages::BackendRequest;
use crate::session::token::{encode_unsigned, TokenClaims};
use crate::session::Clock;

pub const MAX_PAGE_SIZE: u32 = 100;
pub const MAX_MOVEMENT_QUANTITY: u32 = 1_000_000;
/// Highest stock level an inbound movement may reach.
pub const MAX_STOCK: u32 = i32::MAX as u32 - MAX_MOVEMENT_QUANTITY;

const DEFAULT_TOKEN_TTL: Duration = Duration::hours(24);

/// In-memory inventory service.
///
/// Products and accounts live in this task only. Every request is
/// answered from the mailbox loop, so the stock check and the stock update of
/// a movement cannot interleave with another request.
pub struct LocalInventoryService {
    receiver: mpsc::Receiver<BackendRequest>,
    products: BTreeMap<u64, Product>,
    users: HashMap<String, String>,
    next_product_id: u64,
    next_movement_id: u64,
    token_ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl LocalInventoryService {
    pub fn new(buffer_size: usize, clock: Arc<dyn Clock>) -> (Self, LocalInventory) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let users = HashMap::from([("admin".to_string(), "admin123".to_string())]);
        let service = Self {
            receiver,
            products: BTreeMap::new(),
            users,
            next_product_id: 1,
            next_movement_id: 1,
            token_ttl: DEFAULT_TOKEN_TTL,
            clock,
        };
        (service, LocalInventory::new(sender))
    }

    /// Lifetime of the tokens minted by `login`.
    pub fn with_token_ttl(mut self, ttl: Duration) -> Self {
        self.token_ttl = ttl;
        self
    }

    pub fn with_user(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.users.insert(username.into(), password.into());
        self
    }

    #[instrument(name = "local_inventory", skip(self))]
    pub async fn run(mut self) {
        info!("LocalInventoryService starting");

        while let Some(msg) = self.receiver.recv().await {
            match msg {
                BackendRequest::Login { credentials, respond_to } => {
                    let _ = respond_to.send(self.login(credentials));
                }
                BackendRequest::ListProducts { query, respond_to } => {
                    let _ = respond_to.send(Ok(self.list(&query)));
                }
                BackendRequest::GetProduct { id, respond_to } => {
                    let _ = respond_to.send(self.get(id).cloned());
                }
                BackendRequest::CreateProduct { request, respond_to } => {
                    let _ = respond_to.send(self.create(request));
                }
                BackendRequest::UpdateProduct { id, request, respond_to } => {
                    let _ = respond_to.send(self.update(id, request));
                }
                BackendRequest::DeleteProduct { id, respond_to } => {
                    let _ = respond_to.send(self.delete(id));
                }
                BackendRequest::SyncProducts { respond_to } => {
                    let _ = respond_to.send(Ok(self.sync()));
                }
                BackendRequest::RegisterMovement { request, respond_to } => {
                    let _ = respond_to.send(self.register_movement(request));
                }
                BackendRequest::Shutdown => {
                    info!("LocalInventoryService shutting down");
                    break;
                }
            }
        }

        info!("LocalInventoryService stopped");
    }

    #[instrument(skip(self))]
    fn login(&self, credentials: Credentials) -> Result<LoginResponse, ApiError> {
        match self.users.get(&credentials.username) {
            Some(password) if *password == credentials.password => {}
            _ => {
                warn!(username = %credentials.username, "Rejected login");
                return Err(ApiError::rejected(401, "Invalid username or password"));
            }
        }

        let now = self.clock.now();
        let claims = TokenClaims {
            sub: Some(credentials.username.clone()),
            exp: (now + self.token_ttl).timestamp() as f64,
            iat: Some(now.timestamp() as f64),
        };
        info!(username = %credentials.username, "Issued token");
        Ok(LoginResponse {
            token: encode_unsigned(&claims),
            username: credentials.username,
        })
    }

    #[instrument(skip(self), fields(page = query.page, size = query.size))]
    fn list(&self, query: &ProductQuery) -> Page<Product> {
        let search = query.search.as_deref().map(str::to_lowercase);
        let category = query.category.as_deref().map(str::to_lowercase);

        let mut matches: Vec<Product> = self
            .products
            .values()
            .filter(|p| contains(&p.name, search.as_deref()))
            .filter(|p| contains(&p.category, category.as_deref()))
            .cloned()
            .collect();
        matches.sort_by(|a, b| {
            let ordering = compare(a, b, query.sort_by);
            match query.sort_dir {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        });

        let size = query.size.clamp(1, MAX_PAGE_SIZE);
        let page = Page::slice(matches, query.page, size);
        debug!(items = page.content.len(), total = page.total_elements, "Listed products");
        page
    }

    fn get(&self, id: u64) -> Result<&Product, ApiError> {
        self.products.get(&id).ok_or_else(|| not_found(id))
    }

    #[instrument(skip(self), fields(name = %request.name))]
    fn create(&mut self, request: ProductRequest) -> Result<Product, ApiError> {
        check_request(&request)?;
        self.ensure_unique_name(&request.name, None)?;

        let id = self.next_product_id;
        self.next_product_id += 1;
        let product = Product {
            id,
            name: request.name,
            category: request.category,
            supplier: request.supplier,
            price: request.price,
            stock: request.stock,
            registration_date: self.now(),
        };
        self.products.insert(id, product.clone());
        info!(id, "Created product");
        Ok(product)
    }

    #[instrument(skip(self, request))]
    fn update(&mut self, id: u64, request: ProductRequest) -> Result<Product, ApiError> {
        check_request(&request)?;
        self.get(id)?;
        self.ensure_unique_name(&request.name, Some(id))?;

        let product = self.products.get_mut(&id).ok_or_else(|| not_found(id))?;
        product.name = request.name;
        product.category = request.category;
        product.supplier = request.supplier;
        product.price = request.price;
        product.stock = request.stock;
        info!("Updated product");
        Ok(product.clone())
    }

    #[instrument(skip(self))]
    fn delete(&mut self, id: u64) -> Result<(), ApiError> {
        self.products.remove(&id).ok_or_else(|| not_found(id))?;
        info!("Deleted product");
        Ok(())
    }

    #[instrument(skip(self))]
    fn sync(&mut self) -> SyncSummary {
        let mut inserted = 0;
        for request in seed_catalog() {
            if self.ensure_unique_name(&request.name, None).is_err() {
                continue;
            }
            match self.create(request) {
                Ok(_) => inserted += 1,
                Err(e) => error!(error = %e, "Seed product rejected"),
            }
        }
        info!(inserted, "Synchronized catalogue");
        SyncSummary {
            inserted,
            message: format!("{inserted} products synchronized"),
        }
    }

    #[instrument(skip(self))]
    fn register_movement(&mut self, request: MovementRequest) -> Result<StockMovement, ApiError> {
        if request.quantity == 0 || request.quantity > MAX_MOVEMENT_QUANTITY {
            return Err(ApiError::rejected(
                400,
                format!("Quantity must be between 1 and {MAX_MOVEMENT_QUANTITY}"),
            ));
        }
        let timestamp = self.now();
        let product = self
            .products
            .get_mut(&request.product_id)
            .ok_or_else(|| not_found(request.product_id))?;

        let stock_before = product.stock;
        let stock_after = match (request.kind, request.kind.apply(stock_before, request.quantity)) {
            (MovementKind::Outbound, Some(after)) => after,
            (MovementKind::Inbound, Some(after)) if after <= MAX_STOCK => after,
            (MovementKind::Inbound, _) => {
                warn!(stock_before, "Inbound movement would overflow stock");
                return Err(ApiError::rejected(400, format!("Stock cannot exceed {MAX_STOCK}")));
            }
            (MovementKind::Outbound, None) => {
                warn!(stock_before, "Outbound movement exceeds available stock");
                return Err(ApiError::rejected(
                    400,
                    format!(
                        "Insufficient stock. Available: {stock_before}, requested: {}",
                        request.quantity
                    ),
                ));
            }
        };
        product.stock = stock_after;

        let movement = StockMovement {
            id: self.next_movement_id,
            product_id: request.product_id,
            kind: request.kind,
            quantity: request.quantity,
            stock_before,
            stock_after,
            timestamp,
        };
        self.next_movement_id += 1;
        info!(stock_before, stock_after, "Registered movement");
        Ok(movement)
    }

    fn ensure_unique_name(&self, name: &str, except: Option<u64>) -> Result<(), ApiError> {
        let taken = self
            .products
            .values()
            .any(|p| Some(p.id) != except && p.name.eq_ignore_ascii_case(name.trim()));
        if taken {
            return Err(ApiError::rejected(
                409,
                format!("A product named '{}' already exists", name.trim()),
            ));
        }
        Ok(())
    }

    fn now(&self) -> NaiveDateTime {
        self.clock.now().naive_utc()
    }
}

fn contains(field: &str, needle: Option<&str>) -> bool {
    needle.is_none_or(|needle| field.to_lowercase().contains(needle))
}

fn compare(a: &Product, b: &Product, field: SortField) -> Ordering {
    let ordering = match field {
        SortField::Id => a.id.cmp(&b.id),
        SortField::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
        SortField::Category => a.category.to_lowercase().cmp(&b.category.to_lowercase()),
        SortField::Supplier => a.supplier.to_lowercase().cmp(&b.supplier.to_lowercase()),
        SortField::Price => a.price.total_cmp(&b.price),
        SortField::Stock => a.stock.cmp(&b.stock),
        SortField::RegistrationDate => a.registration_date.cmp(&b.registration_date),
    };
    // Ties fall back to insertion order.
    ordering.then_with(|| a.id.cmp(&b.id))
}

fn check_request(request: &ProductRequest) -> Result<(), ApiError> {
    if request.name.trim().is_empty() {
        return Err(ApiError::rejected(400, "Product name is required"));
    }
    if request.price.is_nan() || request.price <= 0.0 {
        return Err(ApiError::rejected(400, "Price must be greater than 0"));
    }
    Ok(())
}

fn not_found(id: u64) -> ApiError {
    ApiError::rejected(404, format!("Product not found with id: {id}"))
}
