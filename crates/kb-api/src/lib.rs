//! # kb-api
//!
//! The RPC surface for the board: every operation is `POST /api/{name}`
//! with a JSON payload, answered by a `{ datas, result, resultMsg }`
//! envelope.

pub mod handlers;
pub mod middleware;

use actix_web::web;

/// Configures the routes for the board.
///
/// # Developer Note
/// We use a scoped configuration to allow the main binary to mount
/// the API under different paths if needed (e.g., /v1/).
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("")
            .route("/", web::get().to(handlers::index))
            .route("/api/{operation}", web::post().to(handlers::call_operation)),
    );
}
