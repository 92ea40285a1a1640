// ==================== ORDERS ====================
// Checkout y ciclo de vida del pedido. El stock se mueve siempre dentro
// del store (transacción Mongo / lock JSON), nunca aquí.

use crate::{
    config::AppConfig,
    models::{CheckoutRequest, Order, OrderStatus},
    services::auth_service::Claims,
    store::Store,
    utils::AppError,
};

/// Pedido visible para `user`: dueño o admin. Para el resto no existe.
async fn visible_order(store: &dyn Store, user: &Claims, order_id: &str) -> Result<Order, AppError> {
    let not_found = || AppError::NotFound(format!("Order {} not found", order_id));
    let order = store.get_order(order_id).await?.ok_or_else(not_found)?;
    if order.user_id != user.sub && !user.is_admin() {
        return Err(not_found());
    }
    Ok(order)
}

pub async fn checkout(
    store: &dyn Store,
    config: &AppConfig,
    user: &Claims,
    request: CheckoutRequest,
) -> Result<Order, AppError> {
    let shipping_address = request
        .shipping_address
        .map(|a| a.trim().to_string())
        .filter(|a| !a.is_empty());

    let order = store.place_order(&user.sub, config.tax_rate, shipping_address).await?;

    log::info!(
        "✅ Order {} placed by {} ({} items, total {:.2})",
        order.id,
        user.sub,
        order.items.len(),
        order.total
    );
    Ok(order)
}

pub async fn list(store: &dyn Store, user: &Claims) -> Result<Vec<Order>, AppError> {
    if user.is_admin() {
        store.list_orders(None).await
    } else {
        store.list_orders(Some(&user.sub)).await
    }
}

pub async fn get(store: &dyn Store, user: &Claims, order_id: &str) -> Result<Order, AppError> {
    visible_order(store, user, order_id).await
}

pub async fn cancel(store: &dyn Store, user: &Claims, order_id: &str) -> Result<Order, AppError> {
    let order = visible_order(store, user, order_id).await?;
    if !order.status.can_transition_to(OrderStatus::Cancelled) {
        return Err(AppError::Conflict(format!(
            "Order in status '{}' cannot be cancelled",
            order.status
        )));
    }

    let cancelled = store
        .transition_order(&order.id, order.status, OrderStatus::Cancelled, true)
        .await?;

    log::info!("🚫 Order {} cancelled by {}", order.id, user.sub);
    Ok(cancelled)
}

/// Transición administrativa; `cancelled` devuelve el stock
pub async fn update_status(store: &dyn Store, order_id: &str, next: OrderStatus) -> Result<Order, AppError> {
    let order = store
        .get_order(order_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Order {} not found", order_id)))?;

    if !order.status.can_transition_to(next) {
        return Err(AppError::Conflict(format!(
            "Invalid status transition: {} -> {}",
            order.status, next
        )));
    }

    let updated = store
        .transition_order(&order.id, order.status, next, next == OrderStatus::Cancelled)
        .await?;

    log::info!("📦 Order {}: {} -> {}", order.id, order.status, next);
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CartItem, Product, ROLE_ADMIN, ROLE_CUSTOMER};
    use crate::store::JsonStore;

    fn claims(sub: &str, role: &str) -> Claims {
        Claims {
            sub: sub.into(),
            email: format!("{}@jersey.club", sub),
            name: sub.into(),
            role: role.into(),
            iat: 0,
            exp: 0,
            jti: String::new(),
            aud: String::new(),
            iss: String::new(),
        }
    }

    async fn setup() -> (tempfile::TempDir, JsonStore, AppConfig) {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::open(dir.path()).await.unwrap();
        store
            .insert_product(Product {
                id: "p1".into(),
                name: "Camiseta Barcelona SC".into(),
                description: String::new(),
                price: 40.0,
                stock: 3,
                category_id: None,
                team: None,
                sizes: vec![],
                image_url: None,
                created_at: 0,
                updated_at: 0,
            })
            .await
            .unwrap();
        let config = AppConfig::for_tests(dir.path().to_path_buf());
        (dir, store, config)
    }

    async fn fill_cart(store: &JsonStore, user: &str, quantity: i64) {
        store
            .save_cart_item(CartItem {
                id: format!("c-{}", user),
                user_id: user.into(),
                product_id: "p1".into(),
                quantity,
                size: None,
                added_at: 0,
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn checkout_then_cancel_restocks() {
        let (_dir, store, config) = setup().await;
        let ana = claims("ana", ROLE_CUSTOMER);
        fill_cart(&store, "ana", 2).await;

        let order = checkout(&store, &config, &ana, CheckoutRequest { shipping_address: Some(" Quito ".into()) })
            .await
            .unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.total, 92.0);
        assert_eq!(order.shipping_address.as_deref(), Some("Quito"));
        assert_eq!(store.get_product("p1").await.unwrap().unwrap().stock, 1);
        assert!(store.list_cart("ana").await.unwrap().is_empty());

        let cancelled = cancel(&store, &ana, &order.id).await.unwrap();
        assert_eq!(cancelled.status, OrderStatus::Cancelled);
        assert_eq!(store.get_product("p1").await.unwrap().unwrap().stock, 3);

        assert!(matches!(cancel(&store, &ana, &order.id).await, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn empty_cart_cannot_checkout() {
        let (_dir, store, config) = setup().await;
        let res = checkout(&store, &config, &claims("ana", ROLE_CUSTOMER), CheckoutRequest::default()).await;
        assert!(matches!(res, Err(AppError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn visibility_is_owner_or_admin() {
        let (_dir, store, config) = setup().await;
        let ana = claims("ana", ROLE_CUSTOMER);
        let luis = claims("luis", ROLE_CUSTOMER);
        let admin = claims("root", ROLE_ADMIN);

        fill_cart(&store, "ana", 1).await;
        let order = checkout(&store, &config, &ana, CheckoutRequest::default()).await.unwrap();
        fill_cart(&store, "luis", 1).await;
        checkout(&store, &config, &luis, CheckoutRequest::default()).await.unwrap();

        assert_eq!(list(&store, &ana).await.unwrap().len(), 1);
        assert_eq!(list(&store, &admin).await.unwrap().len(), 2);

        assert!(get(&store, &admin, &order.id).await.is_ok());
        assert!(matches!(get(&store, &luis, &order.id).await, Err(AppError::NotFound(_))));
        assert!(matches!(cancel(&store, &luis, &order.id).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn admin_transitions_follow_the_lifecycle() {
        let (_dir, store, config) = setup().await;
        let ana = claims("ana", ROLE_CUSTOMER);
        fill_cart(&store, "ana", 1).await;
        let order = checkout(&store, &config, &ana, CheckoutRequest::default()).await.unwrap();

        let skip = update_status(&store, &order.id, OrderStatus::Delivered).await;
        assert!(matches!(skip, Err(AppError::Conflict(_))));

        update_status(&store, &order.id, OrderStatus::Paid).await.unwrap();
        update_status(&store, &order.id, OrderStatus::Shipped).await.unwrap();
        assert!(matches!(cancel(&store, &ana, &order.id).await, Err(AppError::Conflict(_))));

        let delivered = update_status(&store, &order.id, OrderStatus::Delivered).await.unwrap();
        assert_eq!(delivered.status, OrderStatus::Delivered);
        assert_eq!(store.get_product("p1").await.unwrap().unwrap().stock, 2);

        assert!(matches!(
            update_status(&store, "missing", OrderStatus::Paid).await,
            Err(AppError::NotFound(_))
        ));
    }
}
