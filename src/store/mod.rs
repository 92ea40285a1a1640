//! Persistencia.
//!
//! `Store` es el único camino hacia los datos; los handlers reciben un
//! `Arc<dyn Store>` y no saben si detrás hay archivos JSON o MongoDB.

pub mod json;

use async_trait::async_trait;
use serde::Serialize;

use crate::{
    models::{CartItem, Category, Order, OrderStatus, Product, ProductFilter, User},
    utils::AppError,
};

pub use json::JsonStore;

/// Conteos expuestos por `/api/test`
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq, utoipa::ToSchema)]
pub struct StoreStats {
    pub products: u64,
    pub categories: u64,
    pub users: u64,
    pub orders: u64,
}

#[async_trait]
pub trait Store: Send + Sync {
    fn backend(&self) -> &'static str;

    // ---- productos ----
    async fn list_products(&self, filter: &ProductFilter) -> Result<Vec<Product>, AppError>;
    async fn get_product(&self, id: &str) -> Result<Option<Product>, AppError>;
    async fn insert_product(&self, product: Product) -> Result<Product, AppError>;
    /// Reemplaza el producto completo; NotFound si no existe
    async fn update_product(&self, product: Product) -> Result<Product, AppError>;
    async fn delete_product(&self, id: &str) -> Result<bool, AppError>;

    // ---- categorías ----
    async fn list_categories(&self) -> Result<Vec<Category>, AppError>;
    async fn get_category(&self, id: &str) -> Result<Option<Category>, AppError>;
    async fn insert_category(&self, category: Category) -> Result<Category, AppError>;
    async fn delete_category(&self, id: &str) -> Result<bool, AppError>;

    // ---- usuarios ----
    /// Búsqueda sin distinguir mayúsculas
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    async fn get_user(&self, id: &str) -> Result<Option<User>, AppError>;
    async fn insert_user(&self, user: User) -> Result<User, AppError>;
    /// Alta por registro: la primera cuenta de la tienda queda `admin`,
    /// el resto `customer`. La decisión y el insert son atómicos.
    async fn register_user(&self, user: User) -> Result<User, AppError>;
    async fn touch_last_login(&self, id: &str, at: i64) -> Result<(), AppError>;

    // ---- carrito ----
    async fn list_cart(&self, user_id: &str) -> Result<Vec<CartItem>, AppError>;
    /// Upsert por `id`
    async fn save_cart_item(&self, item: CartItem) -> Result<CartItem, AppError>;
    async fn delete_cart_item(&self, user_id: &str, item_id: &str) -> Result<bool, AppError>;
    async fn clear_cart(&self, user_id: &str) -> Result<(), AppError>;

    // ---- pedidos ----
    /// `None` lista todos; orden: más reciente primero
    async fn list_orders(&self, user_id: Option<&str>) -> Result<Vec<Order>, AppError>;
    async fn get_order(&self, id: &str) -> Result<Option<Order>, AppError>;

    /// Carrito -> pedido, todo o nada: valida stock, descuenta stock,
    /// inserta el pedido y vacía el carrito.
    async fn place_order(
        &self,
        user_id: &str,
        tax_rate: f64,
        shipping_address: Option<String>,
    ) -> Result<Order, AppError>;

    /// Compare-and-set de `status`. Con `restock` devuelve las cantidades
    /// del pedido al stock. Conflict si el estado actual no es `from`.
    async fn transition_order(
        &self,
        id: &str,
        from: OrderStatus,
        to: OrderStatus,
        restock: bool,
    ) -> Result<Order, AppError>;

    async fn stats(&self) -> Result<StoreStats, AppError>;
}
