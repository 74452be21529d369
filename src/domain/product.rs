use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Represents a product in the inventory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: u64,
    #[serde(alias = "nombre")]
    pub name: String,
    #[serde(alias = "categoria")]
    pub category: String,
    #[serde(default, alias = "proveedor")]
    pub supplier: String,
    #[serde(alias = "precio")]
    pub price: f64,
    pub stock: u32,
    #[serde(alias = "fechaRegistro")]
    pub registration_date: NaiveDateTime,
}

/// Payload for creating or replacing a product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRequest {
    pub name: String,
    pub category: String,
    pub supplier: String,
    pub price: f64,
    pub stock: u32,
}

/// Outcome of `POST /sync-products`.
///
/// The body is not part of the contract, so every field is optional and
/// unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncSummary {
    #[serde(default, alias = "totalSincronizados")]
    pub inserted: u32,
    #[serde(default, alias = "mensaje")]
    pub message: String,
}
