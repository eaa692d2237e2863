//! # Result Envelope
//!
//! The uniform `{ datas, result, resultMsg }` shape every operation answers
//! with. Error kinds are collapsed to their wire strings here and nowhere
//! else.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AppError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultEnvelope {
    pub datas: Value,
    pub result: bool,
    #[serde(rename = "resultMsg")]
    pub result_msg: String,
}

impl ResultEnvelope {
    pub fn ok(datas: Value) -> Self {
        Self { datas, result: true, result_msg: String::new() }
    }

    pub fn error(err: &AppError) -> Self {
        let result_msg = match err {
            AppError::Unauthenticated | AppError::Validation(_) => err.to_string(),
            // Store causes stay server-side.
            AppError::Store(_) => String::new(),
        };
        Self { datas: Value::Null, result: false, result_msg }
    }

    pub fn from_result<T: Serialize>(res: Result<T>) -> Self {
        match res.and_then(|v| Ok(serde_json::to_value(v)?)) {
            Ok(datas) => Self::ok(datas),
            Err(err) => Self::error(&err),
        }
    }
}
