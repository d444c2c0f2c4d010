use crate::models::Principal;
use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use service_core::error::AppError;

pub const USER_ID_HEADER: &str = "X-User-ID";
pub const SUPERUSER_HEADER: &str = "X-Superuser";

/// Caller identity set by the authenticating gateway.
///
/// `X-User-ID` is required. `X-Superuser: true` marks a principal that
/// bypasses credential grants.
#[async_trait]
impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| {
                AppError::AuthError(anyhow::anyhow!("Missing X-User-ID header"))
            })?;

        let superuser = parts
            .headers
            .get(SUPERUSER_HEADER)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.eq_ignore_ascii_case("true"));

        tracing::Span::current().record("user_id", user_id);

        Ok(Principal {
            user_id: user_id.to_string(),
            superuser,
        })
    }
}
