use mongodb::bson::doc;
use rocket::{get, routes as rocket_routes, serde::json::Json};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::db::Db;
use crate::errors::DbError;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    Healthy,
    Unhealthy,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct HealthStatus {
    pub status: ServiceStatus,
    pub database: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl HealthStatus {
    fn healthy() -> Self {
        Self {
            status: ServiceStatus::Healthy,
            database: "connected".to_string(),
            error: None,
        }
    }

    fn unhealthy(error: impl ToString) -> Self {
        Self {
            status: ServiceStatus::Unhealthy,
            database: "disconnected".to_string(),
            error: Some(error.to_string()),
        }
    }
}

/// Pings the database. Failures are reported in the body, never as an error
/// status.
#[get("/healthz")]
pub async fn health(db: Result<Db, DbError>) -> Json<HealthStatus> {
    let status = match db {
        Ok(db) => match db.run_command(doc! { "ping": 1 }).await {
            Ok(_) => HealthStatus::healthy(),
            Err(e) => {
                warn!(error = %e, "Health check ping failed");
                HealthStatus::unhealthy(e)
            }
        },
        Err(e) => HealthStatus::unhealthy(e),
    };

    Json(status)
}

pub fn routes() -> Vec<rocket::Route> {
    rocket_routes![health]
}
