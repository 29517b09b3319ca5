//! Shared response envelope types for API handlers.
//!
//! Successful JSON responses under `/api/v1` use a `{ "data": ... }`
//! envelope. Use [`DataResponse`] rather than ad-hoc `json!` bodies.

use serde::Serialize;

/// Standard `{ "data": T }` response envelope.
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}
