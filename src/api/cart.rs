use actix_web::{web, HttpResponse};

use crate::{
    middleware::auth::AuthUser,
    models::{AddToCartRequest, CartSummary, UpdateCartItemRequest},
    services::cart_service,
    state::AppState,
    utils::{response, AppError},
};

#[utoipa::path(
    get,
    path = "/api/carrito",
    tag = "Cart",
    responses(
        (status = 200, description = "Cart with current prices and totals", body = CartSummary),
        (status = 401, description = "Authentication required")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_cart(state: web::Data<AppState>, user: AuthUser) -> Result<HttpResponse, AppError> {
    let cart = cart_service::summary(state.store.as_ref(), &state.config, &user.sub).await?;
    Ok(response::ok(cart))
}

#[utoipa::path(
    post,
    path = "/api/carrito",
    tag = "Cart",
    request_body = AddToCartRequest,
    responses(
        (status = 201, description = "Item added", body = CartSummary),
        (status = 400, description = "Invalid quantity or size"),
        (status = 404, description = "Product not found"),
        (status = 409, description = "Insufficient stock")
    ),
    security(("bearer_auth" = []))
)]
pub async fn add_item(
    state: web::Data<AppState>,
    user: AuthUser,
    request: web::Json<AddToCartRequest>,
) -> Result<HttpResponse, AppError> {
    let cart = cart_service::add_item(state.store.as_ref(), &state.config, &user.sub, request.into_inner()).await?;
    Ok(response::created(cart))
}

#[utoipa::path(
    put,
    path = "/api/carrito/{item_id}",
    tag = "Cart",
    params(("item_id" = String, Path, description = "Cart line id")),
    request_body = UpdateCartItemRequest,
    responses(
        (status = 200, description = "Quantity updated; 0 removes the line", body = CartSummary),
        (status = 404, description = "Cart item not found"),
        (status = 409, description = "Insufficient stock")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_item(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<String>,
    request: web::Json<UpdateCartItemRequest>,
) -> Result<HttpResponse, AppError> {
    let cart =
        cart_service::update_quantity(state.store.as_ref(), &state.config, &user.sub, &path, request.quantity)
            .await?;
    Ok(response::ok(cart))
}

#[utoipa::path(
    delete,
    path = "/api/carrito/{item_id}",
    tag = "Cart",
    params(("item_id" = String, Path, description = "Cart line id")),
    responses(
        (status = 200, description = "Item removed"),
        (status = 404, description = "Cart item not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn remove_item(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    cart_service::remove_item(state.store.as_ref(), &user.sub, &path).await?;
    Ok(response::message("Item removed from cart"))
}

#[utoipa::path(
    delete,
    path = "/api/carrito",
    tag = "Cart",
    responses((status = 200, description = "Cart emptied")),
    security(("bearer_auth" = []))
)]
pub async fn clear_cart(state: web::Data<AppState>, user: AuthUser) -> Result<HttpResponse, AppError> {
    cart_service::clear(state.store.as_ref(), &user.sub).await?;
    log::info!("🧹 Cart cleared for {}", user.sub);
    Ok(response::message("Cart emptied"))
}
