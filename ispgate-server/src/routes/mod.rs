pub(crate) mod auth;
pub(crate) mod health;
pub(crate) mod licenses;

use crate::error::ApiError;

pub(crate) async fn not_found() -> ApiError {
    ApiError::NotFound("Not found".into())
}
