#![allow(dead_code)]

use axum::Router;
use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use http_body_util::BodyExt;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;

pub struct TestApp {
    pub router: Router,
    pub db: SqlitePool,
}

impl TestApp {
    pub async fn new() -> Self {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .unwrap()
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .expect("Failed to create in-memory SQLite pool");

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("Failed to run migrations");

        let router = ladle::build_app(pool.clone());

        Self { router, db: pool }
    }

    /// Send a request through the app and return the response.
    pub async fn request(&self, req: Request<Body>) -> Response {
        tower::ServiceExt::oneshot(self.router.clone(), req)
            .await
            .unwrap()
    }

    /// Create a user row and return its id.
    pub async fn create_user(&self, username: &str) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        let now = chrono::Utc::now().to_rfc3339();

        sqlx::query(
            "INSERT INTO users (id, username, name, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(username)
        .bind(username)
        .bind(&now)
        .bind(&now)
        .execute(&self.db)
        .await
        .expect("Failed to create test user");

        id
    }

    /// Insert a comment row directly; comments come from an external
    /// collaborator, not through this API.
    pub async fn create_comment(&self, recipe_id: &str, user_id: &str, body: &str) {
        self.create_comment_at(recipe_id, user_id, body, &chrono::Utc::now().to_rfc3339())
            .await;
    }

    pub async fn create_comment_at(
        &self,
        recipe_id: &str,
        user_id: &str,
        body: &str,
        created_at: &str,
    ) {
        let id = uuid::Uuid::new_v4().to_string();
        sqlx::query(
            "INSERT INTO comments (id, recipe_id, user_id, body, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(recipe_id)
        .bind(user_id)
        .bind(body)
        .bind(created_at)
        .execute(&self.db)
        .await
        .expect("Failed to create test comment");
    }

    /// Send a GET request.
    pub async fn get(&self, uri: &str) -> Response {
        let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
        self.request(req).await
    }

    /// Send a JSON request with an optional `x-user-id` identity header.
    pub async fn send_json(
        &self,
        method: &str,
        uri: &str,
        body: serde_json::Value,
        user_id: Option<&str>,
    ) -> Response {
        let mut builder = Request::builder()
            .uri(uri)
            .method(method)
            .header("content-type", "application/json");
        if let Some(user_id) = user_id {
            builder = builder.header("x-user-id", user_id);
        }
        let req = builder.body(Body::from(body.to_string())).unwrap();
        self.request(req).await
    }

    pub async fn post_json(
        &self,
        uri: &str,
        body: serde_json::Value,
        user_id: Option<&str>,
    ) -> Response {
        self.send_json("POST", uri, body, user_id).await
    }

    pub async fn put_json(
        &self,
        uri: &str,
        body: serde_json::Value,
        user_id: Option<&str>,
    ) -> Response {
        self.send_json("PUT", uri, body, user_id).await
    }

    /// Send a DELETE request.
    pub async fn delete(&self, uri: &str) -> Response {
        let req = Request::builder()
            .uri(uri)
            .method("DELETE")
            .body(Body::empty())
            .unwrap();
        self.request(req).await
    }
}

/// Read the full response body as parsed JSON.
pub async fn body_json(resp: Response) -> serde_json::Value {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// A complete valid recipe payload; tests override fields as needed.
pub fn valid_recipe(title: &str) -> serde_json::Value {
    serde_json::json!({
        "title": title,
        "description": "A cozy one-pan dinner.",
        "instructions": "Heat the pan. Cook everything.",
        "prep_time": "10 minutes",
        "cook_time": "25 minutes",
        "total_time": "35 minutes",
        "servings": 4,
        "ingredients": "2 eggs\n1 cup flour\na pinch of salt",
        "nutritional_info": "Calories: 320\nProtein: 12g"
    })
}

/// Create a recipe through the API and return its id.
pub async fn create_recipe(app: &TestApp, author_id: &str, payload: serde_json::Value) -> String {
    let resp = app.post_json("/recipes", payload, Some(author_id)).await;
    assert_eq!(resp.status(), axum::http::StatusCode::CREATED);
    let body = body_json(resp).await;
    body["recipe"]["id"].as_str().unwrap().to_string()
}
