use actix_web::{web, HttpResponse};

use crate::{
    middleware::auth::AuthUser,
    models::UserInfo,
    services::auth_service::{self, AuthResponse, LoginRequest, RegisterRequest},
    state::AppState,
    utils::{response, AppError},
};

#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "Auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Registration successful", body = AuthResponse),
        (status = 400, description = "Invalid name, email or password"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn register(
    state: web::Data<AppState>,
    request: web::Json<RegisterRequest>,
) -> Result<HttpResponse, AppError> {
    log::info!("📝 POST /auth/register - email: {}", request.email);

    let auth = auth_service::register(state.store.as_ref(), &state.config, request.into_inner()).await?;
    Ok(response::created(auth))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    state: web::Data<AppState>,
    request: web::Json<LoginRequest>,
) -> Result<HttpResponse, AppError> {
    log::info!("🔐 POST /auth/login - email: {}", request.email);

    let auth = auth_service::login(state.store.as_ref(), &state.config, request.into_inner()).await?;
    log::info!("✅ Login successful: {}", auth.user.email);
    Ok(response::ok(auth))
}

#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "Auth",
    responses(
        (status = 200, description = "Current user", body = UserInfo),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "User no longer exists")
    ),
    security(("bearer_auth" = []))
)]
pub async fn me(state: web::Data<AppState>, user: AuthUser) -> Result<HttpResponse, AppError> {
    let info = auth_service::current_user(state.store.as_ref(), &user.sub).await?;
    Ok(response::ok(info))
}
