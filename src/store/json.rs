// ==================== JSON FILE STORE ====================
// Ruta legacy: una colección = un array JSON en `DATA_DIR`.
// Cada escritura va a `<archivo>.tmp` y luego se renombra encima.

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use super::{Store, StoreStats};
use crate::{
    models::{now_ts, CartItem, Category, Order, OrderStatus, Product, ProductFilter, User, ROLE_ADMIN, ROLE_CUSTOMER},
    services::pricing::{self, StockChange},
    utils::AppError,
};

pub const PRODUCTS_FILE: &str = "productos.json";
pub const CATEGORIES_FILE: &str = "categorias.json";
pub const USERS_FILE: &str = "usuarios.json";
pub const CART_FILE: &str = "carrito.json";
pub const ORDERS_FILE: &str = "pedidos.json";

pub struct JsonStore {
    dir: PathBuf,
    // Serializa todas las operaciones (lecturas incluidas)
    lock: Mutex<()>,
}

impl JsonStore {
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, AppError> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;
        log::info!("📁 JSON store at {}", dir.display());
        Ok(Self { dir, lock: Mutex::new(()) })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Solo para la importación legacy; el API nunca lista usuarios
    pub async fn list_users(&self) -> Result<Vec<User>, AppError> {
        let _guard = self.lock.lock().await;
        self.read(USERS_FILE).await
    }

    async fn read<T: DeserializeOwned>(&self, file: &str) -> Result<Vec<T>, AppError> {
        let path = self.dir.join(file);
        match tokio::fs::read(&path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(Vec::new()),
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
                AppError::StorageError(format!("Corrupt collection {}: {}", path.display(), e))
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write<T: Serialize>(&self, file: &str, items: &[T]) -> Result<(), AppError> {
        let path = self.dir.join(file);
        let tmp = self.dir.join(format!("{}.tmp", file));
        let bytes = serde_json::to_vec_pretty(items)?;
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    /// Llamar con el lock tomado. Con `by_registration` el rol depende de
    /// si es la primera cuenta.
    async fn push_user(&self, mut user: User, by_registration: bool) -> Result<User, AppError> {
        let mut users: Vec<User> = self.read(USERS_FILE).await?;
        if users.iter().any(|u| u.id == user.id || u.email.eq_ignore_ascii_case(&user.email)) {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }
        if by_registration {
            user.role = if users.is_empty() { ROLE_ADMIN } else { ROLE_CUSTOMER }.to_string();
        }
        users.push(user.clone());
        self.write(USERS_FILE, &users).await?;
        Ok(user)
    }

    /// Aplica todos los cambios o ninguno (la copia en memoria queda
    /// intacta si alguno desborda).
    fn apply_stock(products: &mut [Product], changes: &[StockChange], sign: i64, now: i64) -> Result<(), AppError> {
        let mut updated = Vec::with_capacity(changes.len());
        for change in changes {
            if let Some(idx) = products.iter().position(|p| p.id == change.product_id) {
                let stock = change
                    .quantity
                    .checked_mul(sign)
                    .and_then(|delta| products[idx].stock.checked_add(delta))
                    .ok_or_else(|| {
                        AppError::Conflict(format!("Stock out of range for {}", products[idx].name))
                    })?;
                updated.push((idx, stock));
            }
        }
        for (idx, stock) in updated {
            products[idx].stock = stock;
            products[idx].updated_at = now;
        }
        Ok(())
    }
}

#[async_trait]
impl Store for JsonStore {
    fn backend(&self) -> &'static str {
        "json"
    }

    async fn list_products(&self, filter: &ProductFilter) -> Result<Vec<Product>, AppError> {
        let _guard = self.lock.lock().await;
        let mut products: Vec<Product> = self
            .read::<Product>(PRODUCTS_FILE)
            .await?
            .into_iter()
            .filter(|p| filter.matches(p))
            .collect();
        products.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(products)
    }

    async fn get_product(&self, id: &str) -> Result<Option<Product>, AppError> {
        let _guard = self.lock.lock().await;
        let products: Vec<Product> = self.read(PRODUCTS_FILE).await?;
        Ok(products.into_iter().find(|p| p.id == id))
    }

    async fn insert_product(&self, product: Product) -> Result<Product, AppError> {
        let _guard = self.lock.lock().await;
        let mut products: Vec<Product> = self.read(PRODUCTS_FILE).await?;
        if products.iter().any(|p| p.id == product.id) {
            return Err(AppError::Conflict(format!("Product {} already exists", product.id)));
        }
        products.push(product.clone());
        self.write(PRODUCTS_FILE, &products).await?;
        Ok(product)
    }

    async fn update_product(&self, product: Product) -> Result<Product, AppError> {
        let _guard = self.lock.lock().await;
        let mut products: Vec<Product> = self.read(PRODUCTS_FILE).await?;
        let slot = products
            .iter_mut()
            .find(|p| p.id == product.id)
            .ok_or_else(|| AppError::NotFound(format!("Product {} not found", product.id)))?;
        *slot = product.clone();
        self.write(PRODUCTS_FILE, &products).await?;
        Ok(product)
    }

    async fn delete_product(&self, id: &str) -> Result<bool, AppError> {
        let _guard = self.lock.lock().await;
        let mut products: Vec<Product> = self.read(PRODUCTS_FILE).await?;
        let before = products.len();
        products.retain(|p| p.id != id);
        if products.len() == before {
            return Ok(false);
        }
        self.write(PRODUCTS_FILE, &products).await?;
        Ok(true)
    }

    async fn list_categories(&self) -> Result<Vec<Category>, AppError> {
        let _guard = self.lock.lock().await;
        let mut categories: Vec<Category> = self.read(CATEGORIES_FILE).await?;
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn get_category(&self, id: &str) -> Result<Option<Category>, AppError> {
        let _guard = self.lock.lock().await;
        let categories: Vec<Category> = self.read(CATEGORIES_FILE).await?;
        Ok(categories.into_iter().find(|c| c.id == id))
    }

    async fn insert_category(&self, category: Category) -> Result<Category, AppError> {
        let _guard = self.lock.lock().await;
        let mut categories: Vec<Category> = self.read(CATEGORIES_FILE).await?;
        if categories.iter().any(|c| c.id == category.id || c.slug == category.slug) {
            return Err(AppError::Conflict(format!("Category '{}' already exists", category.name)));
        }
        categories.push(category.clone());
        self.write(CATEGORIES_FILE, &categories).await?;
        Ok(category)
    }

    async fn delete_category(&self, id: &str) -> Result<bool, AppError> {
        let _guard = self.lock.lock().await;
        let mut categories: Vec<Category> = self.read(CATEGORIES_FILE).await?;
        let before = categories.len();
        categories.retain(|c| c.id != id);
        if categories.len() == before {
            return Ok(false);
        }
        self.write(CATEGORIES_FILE, &categories).await?;
        Ok(true)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let _guard = self.lock.lock().await;
        let users: Vec<User> = self.read(USERS_FILE).await?;
        Ok(users.into_iter().find(|u| u.email.eq_ignore_ascii_case(email)))
    }

    async fn get_user(&self, id: &str) -> Result<Option<User>, AppError> {
        let _guard = self.lock.lock().await;
        let users: Vec<User> = self.read(USERS_FILE).await?;
        Ok(users.into_iter().find(|u| u.id == id))
    }

    async fn insert_user(&self, user: User) -> Result<User, AppError> {
        let _guard = self.lock.lock().await;
        self.push_user(user, false).await
    }

    async fn register_user(&self, user: User) -> Result<User, AppError> {
        let _guard = self.lock.lock().await;
        self.push_user(user, true).await
    }

    async fn touch_last_login(&self, id: &str, at: i64) -> Result<(), AppError> {
        let _guard = self.lock.lock().await;
        let mut users: Vec<User> = self.read(USERS_FILE).await?;
        if let Some(user) = users.iter_mut().find(|u| u.id == id) {
            user.last_login = Some(at);
            self.write(USERS_FILE, &users).await?;
        }
        Ok(())
    }

    async fn list_cart(&self, user_id: &str) -> Result<Vec<CartItem>, AppError> {
        let _guard = self.lock.lock().await;
        let cart: Vec<CartItem> = self.read(CART_FILE).await?;
        Ok(cart.into_iter().filter(|i| i.user_id == user_id).collect())
    }

    async fn save_cart_item(&self, item: CartItem) -> Result<CartItem, AppError> {
        let _guard = self.lock.lock().await;
        let mut cart: Vec<CartItem> = self.read(CART_FILE).await?;
        match cart.iter_mut().find(|i| i.id == item.id) {
            Some(slot) => *slot = item.clone(),
            None => cart.push(item.clone()),
        }
        self.write(CART_FILE, &cart).await?;
        Ok(item)
    }

    async fn delete_cart_item(&self, user_id: &str, item_id: &str) -> Result<bool, AppError> {
        let _guard = self.lock.lock().await;
        let mut cart: Vec<CartItem> = self.read(CART_FILE).await?;
        let before = cart.len();
        cart.retain(|i| !(i.id == item_id && i.user_id == user_id));
        if cart.len() == before {
            return Ok(false);
        }
        self.write(CART_FILE, &cart).await?;
        Ok(true)
    }

    async fn clear_cart(&self, user_id: &str) -> Result<(), AppError> {
        let _guard = self.lock.lock().await;
        let mut cart: Vec<CartItem> = self.read(CART_FILE).await?;
        cart.retain(|i| i.user_id != user_id);
        self.write(CART_FILE, &cart).await
    }

    async fn list_orders(&self, user_id: Option<&str>) -> Result<Vec<Order>, AppError> {
        let _guard = self.lock.lock().await;
        let mut orders: Vec<Order> = self
            .read::<Order>(ORDERS_FILE)
            .await?
            .into_iter()
            .filter(|o| user_id.map_or(true, |u| o.user_id == u))
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    async fn get_order(&self, id: &str) -> Result<Option<Order>, AppError> {
        let _guard = self.lock.lock().await;
        let orders: Vec<Order> = self.read(ORDERS_FILE).await?;
        Ok(orders.into_iter().find(|o| o.id == id))
    }

    async fn place_order(
        &self,
        user_id: &str,
        tax_rate: f64,
        shipping_address: Option<String>,
    ) -> Result<Order, AppError> {
        let _guard = self.lock.lock().await;

        let mut cart: Vec<CartItem> = self.read(CART_FILE).await?;
        let mut products: Vec<Product> = self.read(PRODUCTS_FILE).await?;
        let mut orders: Vec<Order> = self.read(ORDERS_FILE).await?;

        let lines: Vec<CartItem> = cart.iter().filter(|i| i.user_id == user_id).cloned().collect();
        let catalog: HashMap<String, Product> =
            products.iter().map(|p| (p.id.clone(), p.clone())).collect();

        // Todo se valida antes de tocar disco
        let (order, changes) =
            pricing::build_order(user_id, &lines, &catalog, tax_rate, shipping_address)?;

        Self::apply_stock(&mut products, &changes, -1, order.created_at)?;
        orders.push(order.clone());
        cart.retain(|i| i.user_id != user_id);

        self.write(PRODUCTS_FILE, &products).await?;
        self.write(ORDERS_FILE, &orders).await?;
        self.write(CART_FILE, &cart).await?;

        Ok(order)
    }

    async fn transition_order(
        &self,
        id: &str,
        from: OrderStatus,
        to: OrderStatus,
        restock: bool,
    ) -> Result<Order, AppError> {
        let _guard = self.lock.lock().await;

        let mut orders: Vec<Order> = self.read(ORDERS_FILE).await?;
        let order = orders
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Order {} not found", id)))?;

        if order.status != from {
            return Err(AppError::Conflict(format!(
                "Order {} is {}, expected {}",
                id, order.status, from
            )));
        }

        let now = now_ts();
        order.status = to;
        order.updated_at = now;
        let updated = order.clone();

        if restock {
            let mut products: Vec<Product> = self.read(PRODUCTS_FILE).await?;
            Self::apply_stock(&mut products, &pricing::restock_changes(&updated), 1, now)?;
            self.write(PRODUCTS_FILE, &products).await?;
        }
        self.write(ORDERS_FILE, &orders).await?;

        Ok(updated)
    }

    async fn stats(&self) -> Result<StoreStats, AppError> {
        let _guard = self.lock.lock().await;
        Ok(StoreStats {
            products: self.read::<Product>(PRODUCTS_FILE).await?.len() as u64,
            categories: self.read::<Category>(CATEGORIES_FILE).await?.len() as u64,
            users: self.read::<User>(USERS_FILE).await?.len() as u64,
            orders: self.read::<Order>(ORDERS_FILE).await?.len() as u64,
        })
    }
}
