//! # kb-api Handlers
//!
//! This module turns HTTP requests into `BoardService` calls.

use actix_web::{web, HttpRequest, HttpResponse, Responder};
use kb_core::traits::AuthProvider;
use kb_core::{BoardService, CallContext, Operation};
use serde_json::{json, Value};

/// State shared across all Actix-web workers.
pub struct AppState {
    pub board: BoardService,
    pub auth: Box<dyn AuthProvider>,
}

/// Extracts the credential from an `Authorization` value. The scheme name
/// is matched case-insensitively.
fn bearer_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Resolves `Authorization: Bearer <token>` into a caller. A missing or
/// unverifiable token yields an anonymous caller; the service rejects it.
pub fn caller_context(req: &HttpRequest, auth: &dyn AuthProvider) -> CallContext {
    req.headers()
        .get(actix_web::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(bearer_token)
        .and_then(|token| auth.verify_token(token))
        .map(CallContext::authenticated)
        .unwrap_or_else(CallContext::anonymous)
}

/// Runs one board operation. The body is parsed leniently: anything that is
/// not JSON reaches the validator as `null` and is reported as missing
/// fields, the same as an empty payload.
pub async fn call_operation(
    data: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
    body: web::Bytes,
) -> impl Responder {
    let op = match path.into_inner().parse::<Operation>() {
        Ok(op) => op,
        Err(msg) => return HttpResponse::NotFound().body(msg),
    };
    let payload: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    let ctx = caller_context(&req, data.auth.as_ref());

    HttpResponse::Ok().json(data.board.call(op, &ctx, payload).await)
}

/// Lists the available operations.
pub async fn index() -> impl Responder {
    let ops: Vec<&str> = Operation::ALL.iter().map(|op| op.name()).collect();
    HttpResponse::Ok().json(json!({ "service": "kanban-board", "operations": ops }))
}
