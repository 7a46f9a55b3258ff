use axum::{
    Json, Router,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
};
use serde_json::json;

use crate::AppState;
use crate::associations::replace_tags;
use crate::error::AppError;
use crate::models::{Newsletter, Tag, TaggableKind};
use crate::validation::{NewsletterForm, validate_newsletter};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/newsletters", post(create_newsletter))
        .route("/newsletters/{id}", get(show_newsletter))
        .route("/newsletters/{id}", put(update_newsletter))
        .route("/newsletters/{id}", delete(destroy_newsletter))
}

/// Soft-deleted newsletters are invisible to every read path.
async fn fetch_newsletter(db: &sqlx::SqlitePool, id: &str) -> Result<Newsletter, AppError> {
    let newsletter: Option<Newsletter> =
        sqlx::query_as("SELECT * FROM newsletters WHERE id = ? AND deleted_at IS NULL")
            .bind(id)
            .fetch_optional(db)
            .await?;
    newsletter.ok_or(AppError::NotFound("newsletter not found"))
}

async fn fetch_tags(db: &sqlx::SqlitePool, newsletter_id: &str) -> Result<Vec<Tag>, AppError> {
    let tags: Vec<Tag> = sqlx::query_as(
        "SELECT * FROM tags WHERE taggable_kind = ? AND taggable_id = ? ORDER BY rowid",
    )
    .bind(TaggableKind::Newsletter)
    .bind(newsletter_id)
    .fetch_all(db)
    .await?;
    Ok(tags)
}

async fn create_newsletter(
    State(state): State<AppState>,
    Json(form): Json<NewsletterForm>,
) -> Result<Response, AppError> {
    let errors = validate_newsletter(&form);
    if !errors.is_empty() {
        return Err(AppError::validation(errors, &form));
    }

    let newsletter = Newsletter::new(
        form.title.clone().unwrap_or_default(),
        form.content.clone().unwrap_or_default(),
        form.status.clone().unwrap_or_default(),
    );

    let mut tx = state.db.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO newsletters (id, title, content, status, deleted_at, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&newsletter.id)
    .bind(&newsletter.title)
    .bind(&newsletter.content)
    .bind(&newsletter.status)
    .bind(&newsletter.deleted_at)
    .bind(&newsletter.created_at)
    .bind(&newsletter.updated_at)
    .execute(&mut *tx)
    .await?;

    if let Some(labels) = &form.tags {
        replace_tags(&mut tx, TaggableKind::Newsletter, &newsletter.id, labels).await?;
    }

    tx.commit().await?;

    let tags = fetch_tags(&state.db, &newsletter.id).await?;
    let location = format!("/newsletters/{}", newsletter.id);

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(json!({ "newsletter": newsletter, "tags": tags })),
    )
        .into_response())
}

async fn show_newsletter(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let newsletter = fetch_newsletter(&state.db, &id).await?;
    let tags = fetch_tags(&state.db, &id).await?;

    Ok(Json(json!({ "newsletter": newsletter, "tags": tags })))
}

async fn update_newsletter(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(form): Json<NewsletterForm>,
) -> Result<impl IntoResponse, AppError> {
    fetch_newsletter(&state.db, &id).await?;

    let errors = validate_newsletter(&form);
    if !errors.is_empty() {
        return Err(AppError::validation(errors, &form));
    }

    let now = chrono::Utc::now().to_rfc3339();

    let mut tx = state.db.begin().await?;

    sqlx::query("UPDATE newsletters SET title = ?, content = ?, status = ?, updated_at = ? WHERE id = ?")
        .bind(&form.title)
        .bind(&form.content)
        .bind(&form.status)
        .bind(&now)
        .bind(&id)
        .execute(&mut *tx)
        .await?;

    if let Some(labels) = &form.tags {
        replace_tags(&mut tx, TaggableKind::Newsletter, &id, labels).await?;
    }

    tx.commit().await?;

    let newsletter = fetch_newsletter(&state.db, &id).await?;
    let tags = fetch_tags(&state.db, &id).await?;

    Ok(Json(json!({ "newsletter": newsletter, "tags": tags })))
}

async fn destroy_newsletter(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    fetch_newsletter(&state.db, &id).await?;

    // Soft delete: the row is retained, reads stop seeing it.
    sqlx::query("UPDATE newsletters SET deleted_at = ? WHERE id = ?")
        .bind(chrono::Utc::now().to_rfc3339())
        .bind(&id)
        .execute(&state.db)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
