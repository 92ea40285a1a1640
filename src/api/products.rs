use actix_web::{web, HttpResponse};

use crate::{
    middleware::auth::AdminUser,
    models::{CreateProductRequest, Product, ProductFilter, UpdateProductRequest},
    services::catalog_service,
    state::AppState,
    utils::{response, AppError},
};

#[utoipa::path(
    get,
    path = "/api/productos",
    tag = "Catalog",
    params(ProductFilter),
    responses(
        (status = 200, description = "Products matching the filters", body = [Product]),
        (status = 400, description = "Invalid filter")
    )
)]
pub async fn list_products(
    state: web::Data<AppState>,
    filter: web::Query<ProductFilter>,
) -> Result<HttpResponse, AppError> {
    let products = catalog_service::list_products(state.store.as_ref(), &filter).await?;
    log::info!("📋 GET /productos - {} results", products.len());
    Ok(response::ok(products))
}

#[utoipa::path(
    get,
    path = "/api/productos/{id}",
    tag = "Catalog",
    params(("id" = String, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product", body = Product),
        (status = 404, description = "Product not found")
    )
)]
pub async fn get_product(state: web::Data<AppState>, path: web::Path<String>) -> Result<HttpResponse, AppError> {
    let product = catalog_service::get_product(state.store.as_ref(), &path).await?;
    Ok(response::ok(product))
}

#[utoipa::path(
    post,
    path = "/api/productos",
    tag = "Catalog",
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Product created", body = Product),
        (status = 400, description = "Invalid fields"),
        (status = 403, description = "Admin role required"),
        (status = 404, description = "Unknown category")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_product(
    state: web::Data<AppState>,
    admin: AdminUser,
    request: web::Json<CreateProductRequest>,
) -> Result<HttpResponse, AppError> {
    let product = catalog_service::create_product(state.store.as_ref(), request.into_inner()).await?;
    log::info!("➕ Product {} created by {}", product.id, admin.sub);
    Ok(response::created(product))
}

#[utoipa::path(
    put,
    path = "/api/productos/{id}",
    tag = "Catalog",
    params(("id" = String, Path, description = "Product id")),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Product updated", body = Product),
        (status = 400, description = "Invalid fields"),
        (status = 403, description = "Admin role required"),
        (status = 404, description = "Product or category not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_product(
    state: web::Data<AppState>,
    admin: AdminUser,
    path: web::Path<String>,
    request: web::Json<UpdateProductRequest>,
) -> Result<HttpResponse, AppError> {
    let product = catalog_service::update_product(state.store.as_ref(), &path, request.into_inner()).await?;
    log::info!("✏️  Product {} updated by {}", product.id, admin.sub);
    Ok(response::ok(product))
}

#[utoipa::path(
    delete,
    path = "/api/productos/{id}",
    tag = "Catalog",
    params(("id" = String, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product deleted"),
        (status = 403, description = "Admin role required"),
        (status = 404, description = "Product not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_product(
    state: web::Data<AppState>,
    admin: AdminUser,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    catalog_service::delete_product(state.store.as_ref(), &path).await?;
    log::info!("🗑️  Product {} deleted by {}", path, admin.sub);
    Ok(response::message("Product deleted"))
}
