//! Middleware for request logging and cross-origin access.

use actix_cors::Cors;
use actix_web::middleware::Logger;

/// remote-ip "request-line" status-code response-size "referrer" "user-agent"
pub fn standard_middleware() -> Logger {
    Logger::default()
}

// The board UI is served from a different origin than the API.
pub fn cors_policy() -> Cors {
    Cors::default()
        .allow_any_origin()
        .allowed_methods(vec!["GET", "POST"])
        .allow_any_header()
        .max_age(3600)
}
