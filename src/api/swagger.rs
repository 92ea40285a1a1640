use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Jersey Club EC API",
        version = "1.0.0",
        description = "Storefront backend for Jersey Club EC.\n\n**Authentication:** cart and order endpoints require a JWT Bearer token; catalog mutations require the `admin` role.\n\n**Envelope:** every `/api` response is `{status, data}` or `{status, message}`.",
        contact(
            name = "Jersey Club EC",
            email = "soporte@jerseyclub.ec"
        )
    ),
    paths(
        // Auth
        crate::api::auth::register,
        crate::api::auth::login,
        crate::api::auth::me,

        // Health & Metrics
        crate::api::status::health_check,
        crate::api::metrics::get_metrics,
        crate::api::status::store_probe,

        // Catálogo
        crate::api::products::list_products,
        crate::api::products::get_product,
        crate::api::products::create_product,
        crate::api::products::update_product,
        crate::api::products::delete_product,
        crate::api::categories::list_categories,
        crate::api::categories::create_category,
        crate::api::categories::delete_category,

        // Carrito
        crate::api::cart::get_cart,
        crate::api::cart::add_item,
        crate::api::cart::update_item,
        crate::api::cart::remove_item,
        crate::api::cart::clear_cart,

        // Pedidos
        crate::api::orders::checkout,
        crate::api::orders::list_orders,
        crate::api::orders::get_order,
        crate::api::orders::cancel_order,
        crate::api::orders::update_status,
    ),
    components(
        schemas(
            crate::services::auth_service::LoginRequest,
            crate::services::auth_service::RegisterRequest,
            crate::services::auth_service::AuthResponse,
            crate::models::UserInfo,

            crate::api::status::HealthResponse,
            crate::api::status::StoreProbe,
            crate::store::StoreStats,

            crate::models::Product,
            crate::models::CreateProductRequest,
            crate::models::UpdateProductRequest,
            crate::models::Category,
            crate::models::CreateCategoryRequest,

            crate::models::AddToCartRequest,
            crate::models::UpdateCartItemRequest,
            crate::models::CartLine,
            crate::models::CartSummary,

            crate::models::Order,
            crate::models::OrderItem,
            crate::models::OrderStatus,
            crate::models::CheckoutRequest,
            crate::models::UpdateOrderStatusRequest,
        )
    ),
    tags(
        (name = "Auth", description = "Registration, login and current user. The first registered account becomes admin."),
        (name = "Health", description = "Health check, Prometheus metrics and the store connectivity probe."),
        (name = "Catalog", description = "Products and categories. Reads are public; writes need the admin role."),
        (name = "Cart", description = "Per-user shopping cart priced with current product prices."),
        (name = "Orders", description = "Checkout and order lifecycle (pending, paid, shipped, delivered, cancelled)."),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Token returned by /api/auth/login"))
                        .build(),
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_routes_and_bearer_scheme() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/pedidos/{id}/estado"));
        assert!(doc.paths.paths.contains_key("/api/productos"));
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}
