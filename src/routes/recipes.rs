use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::FromRow;

use crate::AppState;
use crate::associations::{replace_collaborators, replace_tags, resolve_collaborators};
use crate::error::AppError;
use crate::identity::CurrentUser;
use crate::models::{Comment, Recipe, Tag, TaggableKind, User};
use crate::models::recipe::{json_to_lines, lines_to_json};
use crate::validation::{
    CollaboratorsForm, RatingForm, RecipeForm, ValidationErrors, validate_rating, validate_recipe,
};

const LIST_PAGE_SIZE: i64 = 10;
const LIST_COMMENT_LIMIT: i64 = 10;
const SHOW_COMMENT_PAGE_SIZE: i64 = 15;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/recipes", get(list_recipes))
        .route("/recipes", post(create_recipe))
        .route("/recipes/{id}", get(show_recipe))
        .route("/recipes/{id}/edit", get(edit_recipe))
        .route("/recipes/{id}", put(update_recipe))
        .route("/recipes/{id}", delete(destroy_recipe))
        .route("/recipes/{id}/collaborators", post(add_collaborators))
        .route("/recipes/{id}/rate", post(rate_recipe))
        .route("/recipes/{id}/like", post(like_recipe))
}

/// Recipe as it appears in responses: the stored JSON-array columns are
/// expanded back into ordered lists of lines.
#[derive(Serialize)]
struct RecipeJson {
    id: String,
    author_id: String,
    title: String,
    description: String,
    instructions: String,
    prep_time: String,
    cook_time: String,
    total_time: String,
    servings: i64,
    image_url: Option<String>,
    video_url: Option<String>,
    ingredients: Vec<String>,
    nutritional_info: Vec<String>,
    created_at: String,
    updated_at: String,
}

impl From<Recipe> for RecipeJson {
    fn from(recipe: Recipe) -> Self {
        Self {
            id: recipe.id,
            author_id: recipe.author_id,
            title: recipe.title,
            description: recipe.description,
            instructions: recipe.instructions,
            prep_time: recipe.prep_time,
            cook_time: recipe.cook_time,
            total_time: recipe.total_time,
            servings: recipe.servings,
            image_url: recipe.image_url,
            video_url: recipe.video_url,
            ingredients: json_to_lines(&recipe.ingredients),
            nutritional_info: json_to_lines(&recipe.nutritional_info),
            created_at: recipe.created_at,
            updated_at: recipe.updated_at,
        }
    }
}

#[derive(Serialize)]
struct ListItem {
    #[serde(flatten)]
    recipe: RecipeJson,
    comments: Vec<Comment>,
}

/// Detail view: recipe fields plus every eager-loaded relation.
#[derive(Serialize)]
struct RecipeDetail {
    #[serde(flatten)]
    recipe: RecipeJson,
    author: User,
    users_liked: Vec<User>,
    user_ratings: Vec<RatingEntry>,
    collaborators: Vec<User>,
    tags: Vec<Tag>,
    comments: Vec<Comment>,
    comments_page: i64,
    comments_per_page: i64,
}

/// User row joined with the rating pivot attribute.
#[derive(FromRow)]
struct UserWithRating {
    // User fields
    id: String,
    username: String,
    name: String,
    created_at: String,
    updated_at: String,
    // Pivot field
    rating: i64,
}

#[derive(Serialize)]
struct RatingEntry {
    user: User,
    rating: i64,
}

impl UserWithRating {
    fn into_rating_entry(self) -> RatingEntry {
        RatingEntry {
            user: User {
                id: self.id,
                username: self.username,
                name: self.name,
                created_at: self.created_at,
                updated_at: self.updated_at,
            },
            rating: self.rating,
        }
    }
}

#[derive(Deserialize)]
struct PageQuery {
    page: Option<i64>,
}

// Keeps page * size offsets well inside i64.
const MAX_PAGE: i64 = 1_000_000;

impl PageQuery {
    fn page(&self) -> i64 {
        self.page.unwrap_or(1).clamp(1, MAX_PAGE)
    }
}

async fn fetch_recipe(db: &sqlx::SqlitePool, id: &str) -> Result<Recipe, AppError> {
    let recipe: Option<Recipe> = sqlx::query_as("SELECT * FROM recipes WHERE id = ?")
        .bind(id)
        .fetch_optional(db)
        .await?;
    recipe.ok_or(AppError::NotFound("recipe not found"))
}

async fn fetch_collaborators(db: &sqlx::SqlitePool, recipe_id: &str) -> Result<Vec<User>, AppError> {
    let users: Vec<User> = sqlx::query_as(
        r#"
        SELECT u.* FROM users u
        JOIN recipe_collaborators rc ON rc.user_id = u.id
        WHERE rc.recipe_id = ?
        ORDER BY rc.created_at, u.username
        "#,
    )
    .bind(recipe_id)
    .fetch_all(db)
    .await?;
    Ok(users)
}

async fn fetch_tags(db: &sqlx::SqlitePool, recipe_id: &str) -> Result<Vec<Tag>, AppError> {
    let tags: Vec<Tag> = sqlx::query_as(
        "SELECT * FROM tags WHERE taggable_kind = ? AND taggable_id = ? ORDER BY rowid",
    )
    .bind(TaggableKind::Recipe)
    .bind(recipe_id)
    .fetch_all(db)
    .await?;
    Ok(tags)
}

async fn list_recipes(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, AppError> {
    let page = query.page();
    let offset = (page - 1) * LIST_PAGE_SIZE;

    // Only recipes with at least one comment qualify for the listing.
    let recipes: Vec<Recipe> = sqlx::query_as(
        r#"
        SELECT r.* FROM recipes r
        WHERE EXISTS (SELECT 1 FROM comments c WHERE c.recipe_id = r.id)
        ORDER BY r.created_at DESC, r.id DESC
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(LIST_PAGE_SIZE)
    .bind(offset)
    .fetch_all(&state.db)
    .await?;

    let mut items = Vec::with_capacity(recipes.len());
    for recipe in recipes {
        let comments: Vec<Comment> = sqlx::query_as(
            "SELECT * FROM comments WHERE recipe_id = ? ORDER BY created_at DESC, id DESC LIMIT ?",
        )
        .bind(&recipe.id)
        .bind(LIST_COMMENT_LIMIT)
        .fetch_all(&state.db)
        .await?;

        items.push(ListItem {
            recipe: recipe.into(),
            comments,
        });
    }

    Ok(Json(json!({
        "recipes": items,
        "page": page,
        "per_page": LIST_PAGE_SIZE,
    })))
}

async fn create_recipe(
    State(state): State<AppState>,
    CurrentUser(author): CurrentUser,
    Json(form): Json<RecipeForm>,
) -> Result<Response, AppError> {
    let mut errors = validate_recipe(&form);

    // Resolve collaborator usernames up front so nothing is written when any
    // of them is unknown.
    let collaborators = match form.collaborators.as_deref() {
        Some(raw) => Some(resolve_collaborators(&state.db, raw, &mut errors).await?),
        None => None,
    };

    if !errors.is_empty() {
        return Err(AppError::validation(errors, &form));
    }

    let id = uuid::Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();
    let image_url = form.image_url.clone().filter(|s| !s.is_empty());
    let video_url = form.video_url.clone().filter(|s| !s.is_empty());

    // Recipe row, tag rows, and collaborator rows persist together or not
    // at all.
    let mut tx = state.db.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO recipes (id, author_id, title, description, instructions, prep_time,
            cook_time, total_time, servings, image_url, video_url, ingredients,
            nutritional_info, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(&author.id)
    .bind(&form.title)
    .bind(&form.description)
    .bind(&form.instructions)
    .bind(&form.prep_time)
    .bind(&form.cook_time)
    .bind(&form.total_time)
    .bind(form.servings_value())
    .bind(&image_url)
    .bind(&video_url)
    .bind(lines_to_json(form.ingredients.as_deref().unwrap_or_default()))
    .bind(lines_to_json(form.nutritional_info.as_deref().unwrap_or_default()))
    .bind(&now)
    .bind(&now)
    .execute(&mut *tx)
    .await?;

    if let Some(labels) = &form.tags {
        replace_tags(&mut tx, TaggableKind::Recipe, &id, labels).await?;
    }

    if let Some(users) = &collaborators {
        replace_collaborators(&mut tx, &id, &author.id, users).await?;
    }

    tx.commit().await?;

    let recipe = fetch_recipe(&state.db, &id).await?;
    let location = format!("/recipes/{id}");

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(json!({ "recipe": RecipeJson::from(recipe) })),
    )
        .into_response())
}

async fn show_recipe(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, AppError> {
    let recipe = fetch_recipe(&state.db, &id).await?;

    let author: User = sqlx::query_as("SELECT * FROM users WHERE id = ?")
        .bind(&recipe.author_id)
        .fetch_one(&state.db)
        .await?;

    let users_liked: Vec<User> = sqlx::query_as(
        r#"
        SELECT u.* FROM users u
        JOIN recipe_likes rl ON rl.user_id = u.id
        WHERE rl.recipe_id = ?
        ORDER BY rl.created_at, u.username
        "#,
    )
    .bind(&id)
    .fetch_all(&state.db)
    .await?;

    let ratings: Vec<UserWithRating> = sqlx::query_as(
        r#"
        SELECT u.*, rr.rating FROM users u
        JOIN recipe_ratings rr ON rr.user_id = u.id
        WHERE rr.recipe_id = ?
        ORDER BY rr.created_at, u.username
        "#,
    )
    .bind(&id)
    .fetch_all(&state.db)
    .await?;
    let user_ratings: Vec<RatingEntry> =
        ratings.into_iter().map(|r| r.into_rating_entry()).collect();

    let collaborators = fetch_collaborators(&state.db, &id).await?;
    let tags = fetch_tags(&state.db, &id).await?;

    let page = query.page();
    let comments: Vec<Comment> = sqlx::query_as(
        "SELECT * FROM comments WHERE recipe_id = ? ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
    )
    .bind(&id)
    .bind(SHOW_COMMENT_PAGE_SIZE)
    .bind((page - 1) * SHOW_COMMENT_PAGE_SIZE)
    .fetch_all(&state.db)
    .await?;

    let likes: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM recipe_likes WHERE recipe_id = ?")
        .bind(&id)
        .fetch_one(&state.db)
        .await?;

    // NULL (serialized as JSON null) when the recipe has no ratings yet.
    let rating: (Option<f64>,) =
        sqlx::query_as("SELECT AVG(rating) FROM recipe_ratings WHERE recipe_id = ?")
            .bind(&id)
            .fetch_one(&state.db)
            .await?;

    let detail = RecipeDetail {
        recipe: recipe.into(),
        author,
        users_liked,
        user_ratings,
        collaborators,
        tags,
        comments,
        comments_page: page,
        comments_per_page: SHOW_COMMENT_PAGE_SIZE,
    };

    Ok(Json(json!({
        "recipe": detail,
        "likes": likes.0,
        "rating": rating.0,
    })))
}

async fn edit_recipe(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let recipe = fetch_recipe(&state.db, &id).await?;
    let collaborators = fetch_collaborators(&state.db, &id).await?;
    let tags = fetch_tags(&state.db, &id).await?;

    Ok(Json(json!({
        "recipe": RecipeJson::from(recipe),
        "collaborators": collaborators,
        "tags": tags,
    })))
}

async fn update_recipe(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(form): Json<RecipeForm>,
) -> Result<impl IntoResponse, AppError> {
    let existing = fetch_recipe(&state.db, &id).await?;

    let mut errors = validate_recipe(&form);
    let collaborators = match form.collaborators.as_deref() {
        Some(raw) => Some(resolve_collaborators(&state.db, raw, &mut errors).await?),
        None => None,
    };

    if !errors.is_empty() {
        return Err(AppError::validation(errors, &form));
    }

    let now = chrono::Utc::now().to_rfc3339();
    let image_url = form.image_url.clone().filter(|s| !s.is_empty());
    let video_url = form.video_url.clone().filter(|s| !s.is_empty());

    let mut tx = state.db.begin().await?;

    // Full field overwrite; the author is immutable.
    sqlx::query(
        r#"
        UPDATE recipes
        SET title = ?, description = ?, instructions = ?, prep_time = ?, cook_time = ?,
            total_time = ?, servings = ?, image_url = ?, video_url = ?, ingredients = ?,
            nutritional_info = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&form.title)
    .bind(&form.description)
    .bind(&form.instructions)
    .bind(&form.prep_time)
    .bind(&form.cook_time)
    .bind(&form.total_time)
    .bind(form.servings_value())
    .bind(&image_url)
    .bind(&video_url)
    .bind(lines_to_json(form.ingredients.as_deref().unwrap_or_default()))
    .bind(lines_to_json(form.nutritional_info.as_deref().unwrap_or_default()))
    .bind(&now)
    .bind(&id)
    .execute(&mut *tx)
    .await?;

    // Tags and collaborators are replaced wholesale when their field is
    // present at all, and left untouched otherwise.
    if let Some(labels) = &form.tags {
        replace_tags(&mut tx, TaggableKind::Recipe, &id, labels).await?;
    }

    if let Some(users) = &collaborators {
        replace_collaborators(&mut tx, &id, &existing.author_id, users).await?;
    }

    tx.commit().await?;

    let recipe = fetch_recipe(&state.db, &id).await?;
    Ok(Json(json!({ "recipe": RecipeJson::from(recipe) })))
}

async fn destroy_recipe(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    fetch_recipe(&state.db, &id).await?;

    // Cascading delete: owned tags, pivot rows, and comments go with the
    // recipe, atomically.
    let mut tx = state.db.begin().await?;

    sqlx::query("DELETE FROM comments WHERE recipe_id = ?")
        .bind(&id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM tags WHERE taggable_kind = ? AND taggable_id = ?")
        .bind(TaggableKind::Recipe)
        .bind(&id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM recipe_collaborators WHERE recipe_id = ?")
        .bind(&id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM recipe_likes WHERE recipe_id = ?")
        .bind(&id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM recipe_ratings WHERE recipe_id = ?")
        .bind(&id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM recipes WHERE id = ?")
        .bind(&id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(StatusCode::NO_CONTENT)
}

async fn add_collaborators(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(form): Json<CollaboratorsForm>,
) -> Result<impl IntoResponse, AppError> {
    let recipe = fetch_recipe(&state.db, &id).await?;

    let mut errors = ValidationErrors::default();
    let users = resolve_collaborators(
        &state.db,
        form.collaborators.as_deref().unwrap_or_default(),
        &mut errors,
    )
    .await?;

    if !errors.is_empty() {
        return Err(AppError::validation(errors, &form));
    }

    let mut tx = state.db.begin().await?;
    replace_collaborators(&mut tx, &id, &recipe.author_id, &users).await?;
    tx.commit().await?;

    let collaborators = fetch_collaborators(&state.db, &id).await?;
    Ok(Json(json!({ "collaborators": collaborators })))
}

async fn rate_recipe(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    Json(form): Json<RatingForm>,
) -> Result<impl IntoResponse, AppError> {
    fetch_recipe(&state.db, &id).await?;

    let errors = validate_rating(&form);
    if !errors.is_empty() {
        return Err(AppError::validation(errors, &form));
    }
    let rating = form.rating.as_ref().and_then(|v| v.as_i64()).unwrap_or_default();

    // A second rating from the same user replaces the first.
    sqlx::query(
        r#"
        INSERT INTO recipe_ratings (recipe_id, user_id, rating, created_at)
        VALUES (?, ?, ?, ?)
        ON CONFLICT(recipe_id, user_id) DO UPDATE SET rating = excluded.rating
        "#,
    )
    .bind(&id)
    .bind(&user.id)
    .bind(rating)
    .bind(chrono::Utc::now().to_rfc3339())
    .execute(&state.db)
    .await?;

    Ok(StatusCode::NO_CONTENT)
}

async fn like_recipe(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    fetch_recipe(&state.db, &id).await?;

    // Liking twice is a no-op.
    sqlx::query(
        "INSERT OR IGNORE INTO recipe_likes (recipe_id, user_id, created_at) VALUES (?, ?, ?)",
    )
    .bind(&id)
    .bind(&user.id)
    .bind(chrono::Utc::now().to_rfc3339())
    .execute(&state.db)
    .await?;

    Ok(StatusCode::NO_CONTENT)
}
