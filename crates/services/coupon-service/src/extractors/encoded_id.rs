//! Path extractor that turns an ID token back into an internal id.

use axum::{
    async_trait,
    extract::{FromRequestParts, Path},
    http::request::Parts,
};

use common::AppError;

use crate::state::AppState;

/// Internal id decoded from the single path parameter.
///
/// Tokens that fail to decode are rejected with 400 before the handler runs.
#[derive(Debug, Clone, Copy)]
pub struct EncodedId(pub i64);

#[async_trait]
impl FromRequestParts<AppState> for EncodedId {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Path(token) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|e| AppError::bad_request(e.body_text()))?;

        let id = state.codec.decode(&token)?;
        Ok(EncodedId(id))
    }
}
