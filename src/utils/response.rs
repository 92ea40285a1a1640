use actix_web::HttpResponse;
use serde::Serialize;

/// 200 `{status: "success", data}`
pub fn ok<T: Serialize>(data: T) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "success",
        "data": data
    }))
}

/// 201 `{status: "success", data}`
pub fn created<T: Serialize>(data: T) -> HttpResponse {
    HttpResponse::Created().json(serde_json::json!({
        "status": "success",
        "data": data
    }))
}

/// 200 `{status: "success", message}`
pub fn message(text: &str) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "success",
        "message": text
    }))
}
