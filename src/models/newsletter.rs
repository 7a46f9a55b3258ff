use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Soft-deletable: `deleted_at` set means hidden from reads, row retained.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Newsletter {
    pub id: String,
    pub title: String,
    pub content: String,
    pub status: String,
    pub deleted_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Newsletter {
    pub fn new(title: String, content: String, status: String) -> Self {
        let now = Utc::now().to_rfc3339();
        Self {
            id: Uuid::new_v4().to_string(),
            title,
            content,
            status,
            deleted_at: None,
            created_at: now.clone(),
            updated_at: now,
        }
    }
}
