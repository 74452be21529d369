use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Direction of a stock movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MovementKind {
    #[serde(alias = "ENTRADA")]
    Inbound,
    #[serde(alias = "SALIDA")]
    Outbound,
}

impl MovementKind {
    /// Stock level after moving `quantity` units, or `None` when an outbound
    /// movement would take the stock below zero (or an inbound one overflows).
    pub fn apply(self, stock: u32, quantity: u32) -> Option<u32> {
        match self {
            MovementKind::Inbound => stock.checked_add(quantity),
            MovementKind::Outbound => stock.checked_sub(quantity),
        }
    }
}

/// Body of `POST /stock-movements`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovementRequest {
    #[serde(alias = "productoId")]
    pub product_id: u64,
    #[serde(rename = "type", alias = "tipo")]
    pub kind: MovementKind,
    #[serde(alias = "cantidad")]
    pub quantity: u32,
}

/// A registered movement as confirmed by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockMovement {
    pub id: u64,
    #[serde(alias = "productoId")]
    pub product_id: u64,
    #[serde(rename = "type", alias = "tipo")]
    pub kind: MovementKind,
    #[serde(alias = "cantidad")]
    pub quantity: u32,
    #[serde(alias = "stockAnterior")]
    pub stock_before: u32,
    #[serde(alias = "stockNuevo")]
    pub stock_after: u32,
    #[serde(alias = "fecha")]
    pub timestamp: NaiveDateTime,
}
