//! Shared response envelope types for API handlers.
//!
//! Notification endpoints answer with a `{ "data": ... }` envelope; product
//! CRUD returns bare rows.

use serde::Serialize;

/// Standard `{ "data": T }` response envelope.
///
/// ```ignore
/// Ok(Json(DataResponse { data: items }))
/// ```
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}
