use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Comment {
    pub id: String,
    pub recipe_id: String,
    pub user_id: String,
    pub body: String,
    pub created_at: String,
}

impl Comment {
    pub fn new(recipe_id: String, user_id: String, body: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            recipe_id,
            user_id,
            body,
            created_at: Utc::now().to_rfc3339(),
        }
    }
}
