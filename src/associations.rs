use chrono::Utc;
use sqlx::{Sqlite, SqlitePool, Transaction};

use crate::models::{Tag, TaggableKind, User};
use crate::validation::ValidationErrors;

/// Split a semicolon-delimited username list, trimming whitespace and
/// dropping empty segments.
pub fn parse_collaborators(raw: &str) -> Vec<String> {
    raw.split(';')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Resolve every submitted username against the user store. Unknown names
/// become field errors on `collaborators`; callers must not write anything
/// while `errors` is non-empty.
pub async fn resolve_collaborators(
    db: &SqlitePool,
    raw: &str,
    errors: &mut ValidationErrors,
) -> Result<Vec<User>, sqlx::Error> {
    let mut users = Vec::new();
    for username in parse_collaborators(raw) {
        let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE username = ?")
            .bind(&username)
            .fetch_optional(db)
            .await?;
        match user {
            Some(user) => users.push(user),
            None => errors.add("collaborators", format!("unknown username: {username}")),
        }
    }
    Ok(users)
}

/// Clear-then-insert replacement of a recipe's collaborator set, inside the
/// caller's transaction. The author is never linked, even when named.
pub async fn replace_collaborators(
    tx: &mut Transaction<'_, Sqlite>,
    recipe_id: &str,
    author_id: &str,
    users: &[User],
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM recipe_collaborators WHERE recipe_id = ?")
        .bind(recipe_id)
        .execute(&mut **tx)
        .await?;

    let now = Utc::now().to_rfc3339();
    for user in users {
        if user.id == author_id {
            continue;
        }
        sqlx::query(
            "INSERT OR IGNORE INTO recipe_collaborators (recipe_id, user_id, created_at) VALUES (?, ?, ?)",
        )
        .bind(recipe_id)
        .bind(&user.id)
        .bind(&now)
        .execute(&mut **tx)
        .await?;
    }

    Ok(())
}

/// Delete-and-recreate the tag rows for one taggable entity. No dedup and no
/// content rules beyond presence, matching the replacement contract.
pub async fn replace_tags(
    tx: &mut Transaction<'_, Sqlite>,
    kind: TaggableKind,
    taggable_id: &str,
    labels: &[String],
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM tags WHERE taggable_kind = ? AND taggable_id = ?")
        .bind(kind)
        .bind(taggable_id)
        .execute(&mut **tx)
        .await?;

    for label in labels {
        let tag = Tag::new(kind, taggable_id.to_string(), label.clone());
        sqlx::query(
            "INSERT INTO tags (id, taggable_kind, taggable_id, tag, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&tag.id)
        .bind(tag.taggable_kind)
        .bind(&tag.taggable_id)
        .bind(&tag.tag)
        .bind(&tag.created_at)
        .execute(&mut **tx)
        .await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_trims_usernames() {
        assert_eq!(
            parse_collaborators("alice; bob ;  carol"),
            vec!["alice", "bob", "carol"]
        );
    }

    #[test]
    fn empty_list_parses_to_nothing() {
        assert!(parse_collaborators("").is_empty());
        assert!(parse_collaborators(" ; ; ").is_empty());
    }

    #[test]
    fn single_username_without_delimiter() {
        assert_eq!(parse_collaborators("alice"), vec!["alice"]);
    }
}
