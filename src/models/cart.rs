use serde::{Deserialize, Serialize};

use super::legacy_id;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CartItem {
    #[serde(deserialize_with = "legacy_id::deserialize")]
    pub id: String,
    #[serde(deserialize_with = "legacy_id::deserialize")]
    pub user_id: String,
    #[serde(deserialize_with = "legacy_id::deserialize")]
    pub product_id: String,
    #[serde(alias = "cantidad")]
    pub quantity: i64,
    #[serde(default, alias = "talla")]
    pub size: Option<String>,
    #[serde(default)]
    pub added_at: i64,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct AddToCartRequest {
    pub product_id: String,
    #[serde(default = "default_quantity", alias = "cantidad")]
    pub quantity: i64,
    #[serde(default, alias = "talla")]
    pub size: Option<String>,
}

fn default_quantity() -> i64 {
    1
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct UpdateCartItemRequest {
    #[serde(alias = "cantidad")]
    pub quantity: i64,
}

/// Línea del carrito ya valorizada con el precio actual del producto
#[derive(Debug, Clone, Serialize, PartialEq, utoipa::ToSchema)]
pub struct CartLine {
    pub id: String,
    pub product_id: String,
    pub name: String,
    pub size: Option<String>,
    pub unit_price: f64,
    pub quantity: i64,
    pub line_total: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq, utoipa::ToSchema)]
pub struct CartSummary {
    pub items: Vec<CartLine>,
    pub subtotal: f64,
    pub tax: f64,
    pub total: f64,
    pub item_count: i64,
}
