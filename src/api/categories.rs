use actix_web::{web, HttpResponse};

use crate::{
    middleware::auth::AdminUser,
    models::{Category, CreateCategoryRequest},
    services::catalog_service,
    state::AppState,
    utils::{response, AppError},
};

#[utoipa::path(
    get,
    path = "/api/categorias",
    tag = "Catalog",
    responses((status = 200, description = "All categories", body = [Category]))
)]
pub async fn list_categories(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    Ok(response::ok(catalog_service::list_categories(state.store.as_ref()).await?))
}

#[utoipa::path(
    post,
    path = "/api/categorias",
    tag = "Catalog",
    request_body = CreateCategoryRequest,
    responses(
        (status = 201, description = "Category created", body = Category),
        (status = 400, description = "Name is required"),
        (status = 409, description = "Duplicate slug")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_category(
    state: web::Data<AppState>,
    admin: AdminUser,
    request: web::Json<CreateCategoryRequest>,
) -> Result<HttpResponse, AppError> {
    let category = catalog_service::create_category(state.store.as_ref(), request.into_inner()).await?;
    log::info!("🏷️  Category '{}' created by {}", category.slug, admin.sub);
    Ok(response::created(category))
}

#[utoipa::path(
    delete,
    path = "/api/categorias/{id}",
    tag = "Catalog",
    params(("id" = String, Path, description = "Category id")),
    responses(
        (status = 200, description = "Category deleted"),
        (status = 404, description = "Category not found"),
        (status = 409, description = "Category still has products")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_category(
    state: web::Data<AppState>,
    admin: AdminUser,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    catalog_service::delete_category(state.store.as_ref(), &path).await?;
    log::info!("🗑️  Category {} deleted by {}", path, admin.sub);
    Ok(response::message("Category deleted"))
}
