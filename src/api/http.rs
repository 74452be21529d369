use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use super::{InventoryApi, ProductQuery};
use crate::domain::{
    Credentials, LoginResponse, MovementRequest, Page, Product, ProductRequest, StockMovement,
    SyncSummary,
};
use crate::error::ApiError;
use crate::session::TOKEN_KEY;
use crate::store::KeyValueStore;

/// Error body returned by the service for every failed request.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// [`InventoryApi`] over HTTP.
///
/// Requests other than login carry the stored session token as a bearer
/// credential. Timeouts are enforced by the underlying client.
#[derive(Clone)]
pub struct HttpInventoryApi {
    base_url: String,
    http: Client,
    store: Arc<dyn KeyValueStore>,
}

impl HttpInventoryApi {
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        store: Arc<dyn KeyValueStore>,
    ) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Transport(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
            store,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match self.store.get(TOKEN_KEY) {
            Ok(Some(token)) => request.bearer_auth(token),
            Ok(None) => request,
            Err(e) => {
                warn!(error = %e, "Could not read session token; sending request without it");
                request
            }
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        let response = self.authorized(request).send().await?;
        check_status(response).await
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = self.send(request).await?;
        Ok(response.json::<T>().await?)
    }
}

/// Turns a non-2xx response into [`ApiError::Status`], keeping the server's
/// message when the body carries one.
async fn check_status(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&text)
        .ok()
        .and_then(|body| body.message);
    debug!(status = status.as_u16(), "Request rejected by server");
    Err(ApiError::Status {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl InventoryApi for HttpInventoryApi {
    #[instrument(skip(self), fields(username = %credentials.username))]
    async fn login(&self, credentials: Credentials) -> Result<LoginResponse, ApiError> {
        debug!("Sending request");
        let response = self
            .http
            .post(self.url("/login"))
            .json(&credentials)
            .send()
            .await?;
        let response = check_status(response).await?;
        Ok(response.json().await?)
    }

    #[instrument(skip(self))]
    async fn list_products(&self, query: ProductQuery) -> Result<Page<Product>, ApiError> {
        debug!("Sending request");
        let request = self.http.get(self.url("/products")).query(&query.to_params());
        self.send_json(request).await
    }

    #[instrument(skip(self))]
    async fn get_product(&self, id: u64) -> Result<Product, ApiError> {
        debug!("Sending request");
        self.send_json(self.http.get(self.url(&format!("/products/{id}"))))
            .await
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    async fn create_product(&self, request: ProductRequest) -> Result<Product, ApiError> {
        debug!("Sending request");
        self.send_json(self.http.post(self.url("/products")).json(&request))
            .await
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    async fn update_product(&self, id: u64, request: ProductRequest) -> Result<Product, ApiError> {
        debug!("Sending request");
        self.send_json(self.http.put(self.url(&format!("/products/{id}"))).json(&request))
            .await
    }

    #[instrument(skip(self))]
    async fn delete_product(&self, id: u64) -> Result<(), ApiError> {
        debug!("Sending request");
        self.send(self.http.delete(self.url(&format!("/products/{id}"))))
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn sync_products(&self) -> Result<SyncSummary, ApiError> {
        debug!("Sending request");
        let response = self.send(self.http.post(self.url("/sync-products"))).await?;
        // The body is informational only; an unreadable one still means success.
        let text = response.text().await.unwrap_or_default();
        Ok(serde_json::from_str(&text).unwrap_or_default())
    }

    #[instrument(skip(self))]
    async fn register_movement(&self, request: MovementRequest) -> Result<StockMovement, ApiError> {
        debug!("Sending request");
        self.send_json(self.http.post(self.url("/stock-movements")).json(&request))
            .await
    }
}
