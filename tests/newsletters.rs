mod common;

use axum::http::StatusCode;
use common::{TestApp, body_json, create_recipe, valid_recipe};
use serde_json::json;

fn valid_newsletter(title: &str) -> serde_json::Value {
    json!({
        "title": title,
        "content": "This month: stone fruit desserts.",
        "status": "draft"
    })
}

#[tokio::test]
async fn create_then_show_with_tags() {
    let app = TestApp::new().await;

    let mut payload = valid_newsletter("August Issue");
    payload["tags"] = json!(["seasonal", "desserts"]);

    let resp = app.post_json("/newsletters", payload, None).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let location = resp
        .headers()
        .get("location")
        .expect("created response should carry a Location header")
        .to_str()
        .unwrap()
        .to_string();

    let body = body_json(app.get(&location).await).await;
    assert_eq!(body["newsletter"]["title"], "August Issue");
    assert_eq!(body["newsletter"]["status"], "draft");
    let tags: Vec<&str> = body["tags"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["tag"].as_str().unwrap())
        .collect();
    assert_eq!(tags, vec!["seasonal", "desserts"]);
}

#[tokio::test]
async fn missing_fields_are_collected() {
    let app = TestApp::new().await;

    let resp = app.post_json("/newsletters", json!({}), None).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = body_json(resp).await;
    let errors = body["errors"].as_object().unwrap();
    for field in ["title", "content", "status"] {
        assert!(errors.contains_key(field), "expected error for {field}");
    }
}

#[tokio::test]
async fn update_replaces_tags_wholesale() {
    let app = TestApp::new().await;

    let mut payload = valid_newsletter("Evolving Issue");
    payload["tags"] = json!(["seasonal"]);
    let resp = app.post_json("/newsletters", payload, None).await;
    let id = body_json(resp).await["newsletter"]["id"]
        .as_str()
        .unwrap()
        .to_string();

    let mut payload = valid_newsletter("Evolving Issue");
    payload["status"] = json!("published");
    payload["tags"] = json!(["archive"]);
    let resp = app
        .put_json(&format!("/newsletters/{id}"), payload, None)
        .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body = body_json(app.get(&format!("/newsletters/{id}")).await).await;
    assert_eq!(body["newsletter"]["status"], "published");
    let tags = body["tags"].as_array().unwrap();
    assert_eq!(tags.len(), 1);
    assert_eq!(tags[0]["tag"], "archive");
}

#[tokio::test]
async fn soft_delete_hides_but_retains_the_row() {
    let app = TestApp::new().await;

    let resp = app
        .post_json("/newsletters", valid_newsletter("Ephemeral"), None)
        .await;
    let id = body_json(resp).await["newsletter"]["id"]
        .as_str()
        .unwrap()
        .to_string();

    let resp = app.delete(&format!("/newsletters/{id}")).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    // Hidden from reads and from further writes.
    let resp = app.get(&format!("/newsletters/{id}")).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let resp = app.delete(&format!("/newsletters/{id}")).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    // Storage keeps the row, with deleted_at set.
    let row: (Option<String>,) =
        sqlx::query_as("SELECT deleted_at FROM newsletters WHERE id = ?")
            .bind(&id)
            .fetch_one(&app.db)
            .await
            .unwrap();
    assert!(row.0.is_some());
}

#[tokio::test]
async fn newsletter_tags_are_scoped_by_kind() {
    let app = TestApp::new().await;
    let author = app.create_user("chef").await;

    // Same label on both kinds; neither read may see the other's rows.
    let mut payload = valid_recipe("Shared Label");
    payload["tags"] = json!(["shared"]);
    let recipe_id = create_recipe(&app, &author, payload).await;

    let mut payload = valid_newsletter("Shared Label Issue");
    payload["tags"] = json!(["shared"]);
    let resp = app.post_json("/newsletters", payload, None).await;
    let newsletter_id = body_json(resp).await["newsletter"]["id"]
        .as_str()
        .unwrap()
        .to_string();

    let body = body_json(app.get(&format!("/recipes/{recipe_id}")).await).await;
    assert_eq!(body["recipe"]["tags"].as_array().unwrap().len(), 1);
    assert_eq!(
        body["recipe"]["tags"][0]["taggable_kind"],
        "recipe"
    );

    let body = body_json(app.get(&format!("/newsletters/{newsletter_id}")).await).await;
    assert_eq!(body["tags"].as_array().unwrap().len(), 1);
    assert_eq!(body["tags"][0]["taggable_kind"], "newsletter");
}

#[tokio::test]
async fn show_missing_newsletter_is_not_found() {
    let app = TestApp::new().await;
    let resp = app.get("/newsletters/nonexistent").await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
