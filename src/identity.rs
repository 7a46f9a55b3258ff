use axum::Json;
use axum::extract::FromRequestParts;
use axum::http::StatusCode;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::AppState;
use crate::models::User;

const USER_ID_HEADER: &str = "x-user-id";

/// The authenticated caller, resolved from the `x-user-id` header.
///
/// Authentication itself is owned by an upstream layer; this service trusts
/// the header and only checks that it names a real user.
pub struct CurrentUser(pub User);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = IdentityRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(user_id) = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
        else {
            return Err(IdentityRejection::Unauthorized);
        };

        let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(&state.db)
            .await
            .map_err(IdentityRejection::Database)?;

        user.map(CurrentUser).ok_or(IdentityRejection::Unauthorized)
    }
}

/// A missing or unknown header is the caller's problem; a failed lookup is
/// ours and must not masquerade as a credential error.
pub enum IdentityRejection {
    Unauthorized,
    Database(sqlx::Error),
}

impl IntoResponse for IdentityRejection {
    fn into_response(self) -> Response {
        match self {
            IdentityRejection::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "unknown caller identity" })),
            )
                .into_response(),
            IdentityRejection::Database(e) => {
                tracing::error!("Database error during identity lookup: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "internal server error" })),
                )
                    .into_response()
            }
        }
    }
}
