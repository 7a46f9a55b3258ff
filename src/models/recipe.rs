use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A recipe row. `ingredients` and `nutritional_info` hold JSON arrays of
/// strings (one element per submitted line) serialized to TEXT.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Recipe {
    pub id: String,
    pub author_id: String,
    pub title: String,
    pub description: String,
    pub instructions: String,
    pub prep_time: String,
    pub cook_time: String,
    pub total_time: String,
    pub servings: i64,
    pub image_url: Option<String>,
    pub video_url: Option<String>,
    pub ingredients: String,
    pub nutritional_info: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Split request text into its lines and serialize them as a JSON array.
///
/// The API convention is one item per line: input is split on `\n`, a
/// trailing `\r` is trimmed from each line, and blank lines are kept so the
/// submitted ordering round-trips exactly.
pub fn lines_to_json(text: &str) -> String {
    let lines: Vec<&str> = text.split('\n').map(|l| l.trim_end_matches('\r')).collect();
    serde_json::to_string(&lines).unwrap_or_else(|_| "[]".to_string())
}

/// Deserialize a stored JSON array column back into its lines.
pub fn json_to_lines(stored: &str) -> Vec<String> {
    serde_json::from_str(stored).unwrap_or_default()
}
