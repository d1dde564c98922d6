//! Request extractors.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use rollup_core::OwnerContext;

use crate::response::ApiError;

/// Header carrying the owner id.
pub const OWNER_ID_HEADER: &str = "X-Owner-Id";

/// Header carrying the owner's UTC offset in minutes.
pub const OWNER_OFFSET_HEADER: &str = "X-Owner-Utc-Offset";

/// Owner identity from request headers.
///
/// Authentication happens upstream; this only reads what the gateway forwards.
#[derive(Debug, Clone)]
pub struct Owner(pub OwnerContext);

#[async_trait]
impl<S> FromRequestParts<S> for Owner
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let owner_id = parts
            .headers
            .get(OWNER_ID_HEADER)
            .and_then(|h| h.to_str().ok())
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ApiError::bad_request(format!("{} header is required", OWNER_ID_HEADER)))?;

        let offset = match parts.headers.get(OWNER_OFFSET_HEADER) {
            None => 0,
            Some(raw) => raw
                .to_str()
                .ok()
                .and_then(|v| v.trim().parse::<i32>().ok())
                .ok_or_else(|| {
                    ApiError::bad_request(format!(
                        "{} must be an integer number of minutes",
                        OWNER_OFFSET_HEADER
                    ))
                })?,
        };

        let owner = OwnerContext::new(owner_id).with_utc_offset_minutes(offset);
        owner.time_zone()?;

        Ok(Owner(owner))
    }
}
