use actix_web::{web, HttpResponse};

use crate::{
    middleware::auth::{AdminUser, AuthUser},
    models::{CheckoutRequest, Order, UpdateOrderStatusRequest},
    services::order_service,
    state::AppState,
    utils::{response, AppError},
};

#[utoipa::path(
    post,
    path = "/api/pedidos",
    tag = "Orders",
    request_body(content = CheckoutRequest, description = "Optional shipping address"),
    responses(
        (status = 201, description = "Order placed from the cart", body = Order),
        (status = 400, description = "Cart is empty or malformed body"),
        (status = 409, description = "Insufficient stock")
    ),
    security(("bearer_auth" = []))
)]
pub async fn checkout(
    state: web::Data<AppState>,
    user: AuthUser,
    body: web::Bytes,
) -> Result<HttpResponse, AppError> {
    // Cuerpo vacío = sin dirección; JSON mal formado es 400
    let request: CheckoutRequest = if body.iter().all(u8::is_ascii_whitespace) {
        CheckoutRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| AppError::InvalidRequest(format!("Invalid checkout body: {}", e)))?
    };
    let order = order_service::checkout(state.store.as_ref(), &state.config, &user, request).await?;
    Ok(response::created(order))
}

#[utoipa::path(
    get,
    path = "/api/pedidos",
    tag = "Orders",
    responses(
        (status = 200, description = "Own orders, or every order for admins", body = [Order])
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_orders(state: web::Data<AppState>, user: AuthUser) -> Result<HttpResponse, AppError> {
    let orders = order_service::list(state.store.as_ref(), &user).await?;
    log::info!("📋 GET /pedidos - {} orders for {}", orders.len(), user.sub);
    Ok(response::ok(orders))
}

#[utoipa::path(
    get,
    path = "/api/pedidos/{id}",
    tag = "Orders",
    params(("id" = String, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order", body = Order),
        (status = 404, description = "Order not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_order(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    Ok(response::ok(order_service::get(state.store.as_ref(), &user, &path).await?))
}

#[utoipa::path(
    post,
    path = "/api/pedidos/{id}/cancelar",
    tag = "Orders",
    params(("id" = String, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order cancelled and restocked", body = Order),
        (status = 404, description = "Order not found"),
        (status = 409, description = "Order can no longer be cancelled")
    ),
    security(("bearer_auth" = []))
)]
pub async fn cancel_order(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    Ok(response::ok(order_service::cancel(state.store.as_ref(), &user, &path).await?))
}

#[utoipa::path(
    patch,
    path = "/api/pedidos/{id}/estado",
    tag = "Orders",
    params(("id" = String, Path, description = "Order id")),
    request_body = UpdateOrderStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = Order),
        (status = 403, description = "Admin role required"),
        (status = 404, description = "Order not found"),
        (status = 409, description = "Invalid transition")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_status(
    state: web::Data<AppState>,
    admin: AdminUser,
    path: web::Path<String>,
    request: web::Json<UpdateOrderStatusRequest>,
) -> Result<HttpResponse, AppError> {
    let order = order_service::update_status(state.store.as_ref(), &path, request.status).await?;
    log::info!("👤 Status change by admin {}", admin.sub);
    Ok(response::ok(order))
}
