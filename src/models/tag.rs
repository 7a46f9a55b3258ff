use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Which entity a tag row is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT")]
pub enum TaggableKind {
    #[serde(rename = "recipe")]
    #[sqlx(rename = "recipe")]
    Recipe,
    #[serde(rename = "newsletter")]
    #[sqlx(rename = "newsletter")]
    Newsletter,
}

impl std::fmt::Display for TaggableKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaggableKind::Recipe => write!(f, "recipe"),
            TaggableKind::Newsletter => write!(f, "newsletter"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Tag {
    pub id: String,
    pub taggable_kind: TaggableKind,
    pub taggable_id: String,
    pub tag: String,
    pub created_at: String,
}

impl Tag {
    pub fn new(kind: TaggableKind, taggable_id: String, tag: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            taggable_kind: kind,
            taggable_id,
            tag,
            created_at: Utc::now().to_rfc3339(),
        }
    }
}
