use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::HeaderMap,
    web, Error, FromRequest, HttpMessage, HttpRequest, HttpResponse,
};
use futures::future::LocalBoxFuture;
use std::future::{ready, Ready};
use std::ops::Deref;

use crate::{
    config::AppConfig,
    models::ROLE_CUSTOMER,
    services::auth_service::{self, Claims},
    state::AppState,
    utils::AppError,
};

pub const USER_ID_HEADER: &str = "X-User-Id";
pub const USER_EMAIL_HEADER: &str = "X-User-Email";
pub const USER_ROLE_HEADER: &str = "X-User-Role";

/// Resuelve la identidad del request.
///
/// - `Authorization: Bearer <jwt>`: se verifica; token inválido es 401.
/// - Sin Authorization y con el fallback activo: `X-User-Id` (+ email/rol).
/// - Nada de lo anterior: request anónimo.
pub fn resolve_claims(headers: &HeaderMap, config: &AppConfig) -> Result<Option<Claims>, AppError> {
    if let Some(value) = headers.get(actix_web::http::header::AUTHORIZATION) {
        let raw = value
            .to_str()
            .map_err(|_| AppError::Unauthorized("Invalid authorization header".to_string()))?;
        let token = raw
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::Unauthorized("Invalid token format".to_string()))?;
        return auth_service::verify_token(token, &config.jwt).map(Some);
    }

    if !config.allow_header_auth {
        return Ok(None);
    }

    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    Ok(header(USER_ID_HEADER).map(|user_id| Claims {
        sub: user_id,
        email: header(USER_EMAIL_HEADER).unwrap_or_default(),
        name: String::new(),
        role: header(USER_ROLE_HEADER)
            .map(|r| r.to_lowercase())
            .unwrap_or_else(|| ROLE_CUSTOMER.to_string()),
        iat: 0,
        exp: 0,
        jti: String::new(),
        aud: "header".to_string(),
        iss: "header".to_string(),
    }))
}

pub struct AuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService { service }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let resolved = match req.app_data::<web::Data<AppState>>() {
            Some(state) => resolve_claims(req.headers(), &state.config),
            None => {
                log::error!("❌ AppState missing; auth middleware cannot resolve identity");
                Ok(None)
            }
        };

        match resolved {
            Ok(Some(claims)) => {
                req.extensions_mut().insert(claims);
            }
            Ok(None) => {}
            Err(e) => {
                log::warn!("❌ Rejected credentials on {}: {}", req.path(), e);
                // Respuesta (no Err) para que los middlewares externos la vean
                let (http_req, _) = req.into_parts();
                let res = HttpResponse::from_error(e).map_into_right_body();
                return Box::pin(async move { Ok(ServiceResponse::new(http_req, res)) });
            }
        }

        let fut = self.service.call(req);
        Box::pin(async move { fut.await.map(ServiceResponse::map_into_left_body) })
    }
}

/// Usuario autenticado (401 si el request es anónimo)
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

impl Deref for AuthUser {
    type Target = Claims;

    fn deref(&self) -> &Claims {
        &self.0
    }
}

impl FromRequest for AuthUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<Claims>()
                .cloned()
                .map(AuthUser)
                .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string())),
        )
    }
}

/// Usuario con rol admin (401 anónimo, 403 sin rol)
#[derive(Debug, Clone)]
pub struct AdminUser(pub Claims);

impl Deref for AdminUser {
    type Target = Claims;

    fn deref(&self) -> &Claims {
        &self.0
    }
}

impl FromRequest for AdminUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let claims = req.extensions().get::<Claims>().cloned();
        ready(match claims {
            Some(c) if c.is_admin() => Ok(AdminUser(c)),
            Some(_) => Err(AppError::Forbidden("Admin role required".to_string())),
            None => Err(AppError::Unauthorized("Authentication required".to_string())),
        })
    }
}
