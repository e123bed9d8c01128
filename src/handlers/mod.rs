use rocket::serde::json::Json;
use rocket::{Request, catch, get, http::Status};
use serde::Serialize;
use serde_json::{Value, json};

pub mod health;

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ApiInfo {
    pub message: &'static str,
    pub version: &'static str,
}

#[get("/")]
pub fn index() -> Json<ApiInfo> {
    Json(ApiInfo {
        message: "YourDrobe API",
        version: env!("CARGO_PKG_VERSION"),
    })
}

fn error_body(status: Status, message: &str) -> Json<Value> {
    Json(json!({
        "error": message,
        "status": status.code
    }))
}

#[catch(404)]
pub fn catch404(req: &Request) -> Json<Value> {
    error_body(Status::NotFound, &format!("No route for {}", req.uri()))
}

#[catch(500)]
pub fn catch500() -> Json<Value> {
    error_body(Status::InternalServerError, "Internal server error")
}

#[catch(503)]
pub fn catch503() -> Json<Value> {
    error_body(Status::ServiceUnavailable, "Database unavailable")
}
