pub mod auth;
pub mod cart;
pub mod categories;
pub mod metrics;
pub mod orders;
pub mod products;
pub mod status;
pub mod swagger;


use actix_web::{error, web};

use crate::{middleware::auth::AuthMiddleware, utils::AppError};

/// Body, path o query ilegibles -> 400 con el envelope de error
fn bad_request(message: String) -> error::Error {
    AppError::InvalidRequest(message).into()
}

/// Todas las rutas de la app; `main` y los tests montan lo mismo
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _| bad_request(err.to_string())))
        .app_data(web::PathConfig::default().error_handler(|err, _| bad_request(err.to_string())))
        .app_data(web::QueryConfig::default().error_handler(|err, _| bad_request(err.to_string())))
        // Health & Metrics (fuera del envelope)
        .route("/health", web::get().to(status::health_check))
        .route("/metrics", web::get().to(metrics::get_metrics))
        .service(
            web::scope("/api")
                // Identidad opcional; AuthUser / AdminUser deciden por handler
                .wrap(AuthMiddleware)
                .route("/test", web::get().to(status::store_probe))
                .service(
                    web::scope("/auth")
                        .route("/register", web::post().to(auth::register))
                        .route("/login", web::post().to(auth::login))
                        .route("/me", web::get().to(auth::me)),
                )
                .service(
                    web::scope("/productos")
                        .route("", web::get().to(products::list_products))
                        .route("", web::post().to(products::create_product))
                        .route("/{id}", web::get().to(products::get_product))
                        .route("/{id}", web::put().to(products::update_product))
                        .route("/{id}", web::delete().to(products::delete_product)),
                )
                .service(
                    web::scope("/categorias")
                        .route("", web::get().to(categories::list_categories))
                        .route("", web::post().to(categories::create_category))
                        .route("/{id}", web::delete().to(categories::delete_category)),
                )
                .service(
                    web::scope("/carrito")
                        .route("", web::get().to(cart::get_cart))
                        .route("", web::post().to(cart::add_item))
                        .route("", web::delete().to(cart::clear_cart))
                        .route("/{item_id}", web::put().to(cart::update_item))
                        .route("/{item_id}", web::delete().to(cart::remove_item)),
                )
                .service(
                    web::scope("/pedidos")
                        .route("", web::post().to(orders::checkout))
                        .route("", web::get().to(orders::list_orders))
                        .route("/{id}", web::get().to(orders::get_order))
                        .route("/{id}/cancelar", web::post().to(orders::cancel_order))
                        .route("/{id}/estado", web::patch().to(orders::update_status)),
                ),
        );
}
