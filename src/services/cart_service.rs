// ==================== CART ====================

use std::collections::HashMap;

use crate::{
    config::AppConfig,
    models::{new_id, now_ts, AddToCartRequest, CartItem, CartSummary, Product},
    services::pricing,
    store::Store,
    utils::AppError,
};

async fn products_for(store: &dyn Store, items: &[CartItem]) -> Result<HashMap<String, Product>, AppError> {
    let mut products = HashMap::new();
    for item in items {
        if products.contains_key(&item.product_id) {
            continue;
        }
        if let Some(product) = store.get_product(&item.product_id).await? {
            products.insert(product.id.clone(), product);
        }
    }
    Ok(products)
}

/// Unidades del producto en el carrito, todas las tallas, excepto `skip_item`,
/// más `extra`. `None` si la suma desborda.
fn reserved_with(items: &[CartItem], product_id: &str, skip_item: Option<&str>, extra: i64) -> Option<i64> {
    items
        .iter()
        .filter(|i| i.product_id == product_id && Some(i.id.as_str()) != skip_item)
        .try_fold(extra, |acc, i| acc.checked_add(i.quantity))
}

/// Una suma desbordada nunca cabe en el stock
fn check_stock(product: &Product, wanted: Option<i64>) -> Result<(), AppError> {
    match wanted {
        Some(wanted) if wanted <= product.stock => Ok(()),
        Some(wanted) => Err(AppError::Conflict(format!(
            "Insufficient stock for {}: requested {}, available {}",
            product.name, wanted, product.stock
        ))),
        None => Err(AppError::Conflict(format!(
            "Insufficient stock for {}: available {}",
            product.name, product.stock
        ))),
    }
}

pub async fn summary(store: &dyn Store, config: &AppConfig, user_id: &str) -> Result<CartSummary, AppError> {
    let items = store.list_cart(user_id).await?;
    let products = products_for(store, &items).await?;
    Ok(pricing::quote(&items, &products, config.tax_rate))
}

pub async fn add_item(
    store: &dyn Store,
    config: &AppConfig,
    user_id: &str,
    request: AddToCartRequest,
) -> Result<CartSummary, AppError> {
    if request.quantity < 1 {
        return Err(AppError::InvalidRequest("Quantity must be at least 1".to_string()));
    }

    let product = store
        .get_product(&request.product_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Product {} not found", request.product_id)))?;

    let size = request.size.map(|s| s.trim().to_uppercase()).filter(|s| !s.is_empty());
    if !product.accepts_size(size.as_deref()) {
        return Err(AppError::InvalidRequest(format!(
            "Size must be one of: {}",
            product.sizes.join(", ")
        )));
    }
    // Producto sin tallas: la talla se ignora
    let size = if product.sizes.is_empty() { None } else { size };

    let items = store.list_cart(user_id).await?;
    check_stock(&product, reserved_with(&items, &product.id, None, request.quantity))?;

    let item = match items.iter().find(|i| i.product_id == product.id && i.size == size) {
        Some(existing) => CartItem {
            // acotado por el stock ya verificado
            quantity: existing.quantity.saturating_add(request.quantity),
            ..existing.clone()
        },
        None => CartItem {
            id: new_id(),
            user_id: user_id.to_string(),
            product_id: product.id.clone(),
            quantity: request.quantity,
            size,
            added_at: now_ts(),
        },
    };

    log::info!("🛒 Cart {} += {} x {}", user_id, request.quantity, product.name);
    store.save_cart_item(item).await?;
    summary(store, config, user_id).await
}

pub async fn update_quantity(
    store: &dyn Store,
    config: &AppConfig,
    user_id: &str,
    item_id: &str,
    quantity: i64,
) -> Result<CartSummary, AppError> {
    if quantity < 0 {
        return Err(AppError::InvalidRequest("Quantity cannot be negative".to_string()));
    }

    let items = store.list_cart(user_id).await?;
    let item = items
        .iter()
        .find(|i| i.id == item_id)
        .cloned()
        .ok_or_else(|| AppError::NotFound("Cart item not found".to_string()))?;

    if quantity == 0 {
        store.delete_cart_item(user_id, item_id).await?;
        return summary(store, config, user_id).await;
    }

    let product = store
        .get_product(&item.product_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Product {} no longer exists", item.product_id)))?;
    check_stock(&product, reserved_with(&items, &product.id, Some(item_id), quantity))?;

    store.save_cart_item(CartItem { quantity, ..item }).await?;
    summary(store, config, user_id).await
}

pub async fn remove_item(store: &dyn Store, user_id: &str, item_id: &str) -> Result<(), AppError> {
    if !store.delete_cart_item(user_id, item_id).await? {
        return Err(AppError::NotFound("Cart item not found".to_string()));
    }
    Ok(())
}

pub async fn clear(store: &dyn Store, user_id: &str) -> Result<(), AppError> {
    store.clear_cart(user_id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::JsonStore;

    fn jersey(id: &str, stock: i64, sizes: &[&str]) -> Product {
        Product {
            id: id.into(),
            name: format!("Camiseta {}", id),
            description: String::new(),
            price: 20.0,
            stock,
            category_id: None,
            team: None,
            sizes: sizes.iter().map(|s| s.to_string()).collect(),
            image_url: None,
            created_at: 0,
            updated_at: 0,
        }
    }

    fn add(product_id: &str, quantity: i64, size: Option<&str>) -> AddToCartRequest {
        AddToCartRequest { product_id: product_id.into(), quantity, size: size.map(String::from) }
    }

    async fn setup() -> (tempfile::TempDir, JsonStore, AppConfig) {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::open(dir.path()).await.unwrap();
        store.insert_product(jersey("p1", 5, &["S", "M"])).await.unwrap();
        store.insert_product(jersey("p2", 2, &[])).await.unwrap();
        let config = AppConfig::for_tests(dir.path().to_path_buf());
        (dir, store, config)
    }

    #[tokio::test]
    async fn add_merges_same_product_and_size() {
        let (_dir, store, config) = setup().await;

        add_item(&store, &config, "u1", add("p1", 1, Some("m"))).await.unwrap();
        let cart = add_item(&store, &config, "u1", add("p1", 2, Some("M"))).await.unwrap();
        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items[0].quantity, 3);
        assert_eq!(cart.subtotal, 60.0);
        assert_eq!(cart.tax, 9.0);
        assert_eq!(cart.total, 69.0);

        let cart = add_item(&store, &config, "u1", add("p1", 1, Some("S"))).await.unwrap();
        assert_eq!(cart.items.len(), 2);
        assert_eq!(cart.item_count, 4);
    }

    #[tokio::test]
    async fn add_checks_size_and_stock() {
        let (_dir, store, config) = setup().await;

        let no_size = add_item(&store, &config, "u1", add("p1", 1, None)).await;
        assert!(matches!(no_size, Err(AppError::InvalidRequest(_))));
        let bad_size = add_item(&store, &config, "u1", add("p1", 1, Some("XXL"))).await;
        assert!(matches!(bad_size, Err(AppError::InvalidRequest(_))));

        add_item(&store, &config, "u1", add("p1", 4, Some("S"))).await.unwrap();
        // el stock se comparte entre tallas
        let over = add_item(&store, &config, "u1", add("p1", 2, Some("M"))).await;
        assert!(matches!(over, Err(AppError::Conflict(_))));

        let zero = add_item(&store, &config, "u1", add("p2", 0, None)).await;
        assert!(matches!(zero, Err(AppError::InvalidRequest(_))));
        let missing = add_item(&store, &config, "u1", add("nope", 1, None)).await;
        assert!(matches!(missing, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn huge_quantities_are_rejected_without_overflow() {
        let (_dir, store, config) = setup().await;
        let cart = add_item(&store, &config, "u1", add("p1", 1, Some("S"))).await.unwrap();
        let small_id = cart.items[0].id.clone();

        let huge = add_item(&store, &config, "u1", add("p1", i64::MAX, Some("M"))).await;
        assert!(matches!(huge, Err(AppError::Conflict(_))));
        let merged = add_item(&store, &config, "u1", add("p1", i64::MAX, Some("S"))).await;
        assert!(matches!(merged, Err(AppError::Conflict(_))));

        let cart = add_item(&store, &config, "u1", add("p1", 1, Some("M"))).await.unwrap();
        let other = cart.items.iter().find(|i| i.id != small_id).unwrap().id.clone();
        let bumped = update_quantity(&store, &config, "u1", &other, i64::MAX).await;
        assert!(matches!(bumped, Err(AppError::Conflict(_))));

        let cart = summary(&store, &config, "u1").await.unwrap();
        assert_eq!(cart.item_count, 2);
    }

    #[tokio::test]
    async fn update_and_remove_are_scoped_to_owner() {
        let (_dir, store, config) = setup().await;
        let cart = add_item(&store, &config, "u1", add("p2", 1, None)).await.unwrap();
        let item_id = cart.items[0].id.clone();

        let foreign = update_quantity(&store, &config, "u2", &item_id, 1).await;
        assert!(matches!(foreign, Err(AppError::NotFound(_))));
        assert!(matches!(remove_item(&store, "u2", &item_id).await, Err(AppError::NotFound(_))));

        let over = update_quantity(&store, &config, "u1", &item_id, 3).await;
        assert!(matches!(over, Err(AppError::Conflict(_))));

        let cart = update_quantity(&store, &config, "u1", &item_id, 2).await.unwrap();
        assert_eq!(cart.items[0].quantity, 2);

        let cart = update_quantity(&store, &config, "u1", &item_id, 0).await.unwrap();
        assert!(cart.items.is_empty());
        assert_eq!(cart.total, 0.0);
    }

    #[tokio::test]
    async fn clear_empties_only_that_cart() {
        let (_dir, store, config) = setup().await;
        add_item(&store, &config, "u1", add("p2", 1, None)).await.unwrap();
        add_item(&store, &config, "u2", add("p2", 1, None)).await.unwrap();

        clear(&store, "u1").await.unwrap();
        assert!(summary(&store, &config, "u1").await.unwrap().items.is_empty());
        assert_eq!(summary(&store, &config, "u2").await.unwrap().items.len(), 1);
    }
}
