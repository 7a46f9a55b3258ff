use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::LazyLock;
use url::Url;

// Accepts youtube.com / youtu.be / youtube-nocookie.com hosts with optional
// www. or m. subdomains, and watch?v= / embed/ / live/ / v/ / short-link
// path forms.
static YOUTUBE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^((?:https?:)?//)?((?:www|m)\.)?(youtube(?:-nocookie)?\.com|youtu\.be)(/(?:[\w\-]+\?v=|embed/|live/|v/)?)([\w\-]+)(\S+)?$",
    )
    .unwrap()
});

/// Field-scoped validation failures. Every failing rule for a request is
/// collected before anything is written.
#[derive(Debug, Default, Serialize)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

pub fn is_http_url(value: &str) -> bool {
    match Url::parse(value) {
        Ok(url) => matches!(url.scheme(), "http" | "https"),
        Err(_) => false,
    }
}

pub fn is_youtube_url(value: &str) -> bool {
    YOUTUBE_RE.is_match(value)
}

/// Recipe create/update payload. Fields are optional at the serde level so
/// missing values surface as collected field errors, not parse failures;
/// `servings` stays a raw JSON value for the same reason.
#[derive(Debug, Serialize, Deserialize)]
pub struct RecipeForm {
    pub title: Option<String>,
    pub description: Option<String>,
    pub instructions: Option<String>,
    pub prep_time: Option<String>,
    pub cook_time: Option<String>,
    pub total_time: Option<String>,
    pub servings: Option<serde_json::Value>,
    pub image_url: Option<String>,
    pub video_url: Option<String>,
    pub ingredients: Option<String>,
    pub nutritional_info: Option<String>,
    pub tags: Option<Vec<String>>,
    pub collaborators: Option<String>,
}

impl RecipeForm {
    /// Valid only after `validate_recipe` has passed.
    pub fn servings_value(&self) -> i64 {
        self.servings
            .as_ref()
            .and_then(|v| v.as_i64())
            .unwrap_or_default()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RatingForm {
    pub rating: Option<serde_json::Value>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CollaboratorsForm {
    pub collaborators: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NewsletterForm {
    pub title: Option<String>,
    pub content: Option<String>,
    pub status: Option<String>,
    pub tags: Option<Vec<String>>,
}

fn require_text(
    errors: &mut ValidationErrors,
    field: &str,
    value: Option<&str>,
    max_len: Option<usize>,
) {
    match value {
        None => errors.add(field, format!("{field} is required")),
        Some(s) if s.trim().is_empty() => errors.add(field, format!("{field} is required")),
        Some(s) => {
            if let Some(max) = max_len {
                if s.chars().count() > max {
                    errors.add(field, format!("{field} must be at most {max} characters"));
                }
            }
        }
    }
}

pub fn validate_recipe(form: &RecipeForm) -> ValidationErrors {
    let mut errors = ValidationErrors::default();

    require_text(&mut errors, "title", form.title.as_deref(), Some(255));
    require_text(&mut errors, "description", form.description.as_deref(), None);
    require_text(&mut errors, "instructions", form.instructions.as_deref(), None);
    require_text(&mut errors, "prep_time", form.prep_time.as_deref(), Some(255));
    require_text(&mut errors, "cook_time", form.cook_time.as_deref(), Some(255));
    require_text(&mut errors, "total_time", form.total_time.as_deref(), Some(255));

    match &form.servings {
        None => errors.add("servings", "servings is required"),
        Some(value) => match value.as_i64() {
            Some(n) if (1..=255).contains(&n) => {}
            Some(_) => errors.add("servings", "servings must be between 1 and 255"),
            None => errors.add("servings", "servings must be an integer"),
        },
    }

    if let Some(url) = form.image_url.as_deref().filter(|s| !s.is_empty()) {
        if !is_http_url(url) {
            errors.add("image_url", "image_url must be an http or https URL");
        }
    }

    if let Some(url) = form.video_url.as_deref().filter(|s| !s.is_empty()) {
        if !is_youtube_url(url) {
            errors.add("video_url", "video_url must be a YouTube video URL");
        }
    }

    require_text(&mut errors, "ingredients", form.ingredients.as_deref(), None);
    require_text(
        &mut errors,
        "nutritional_info",
        form.nutritional_info.as_deref(),
        None,
    );

    errors
}

pub fn validate_rating(form: &RatingForm) -> ValidationErrors {
    let mut errors = ValidationErrors::default();
    match &form.rating {
        None => errors.add("rating", "rating is required"),
        Some(value) => match value.as_i64() {
            Some(n) if (1..=5).contains(&n) => {}
            Some(_) => errors.add("rating", "rating must be between 1 and 5"),
            None => errors.add("rating", "rating must be an integer"),
        },
    }
    errors
}

pub fn validate_newsletter(form: &NewsletterForm) -> ValidationErrors {
    let mut errors = ValidationErrors::default();
    require_text(&mut errors, "title", form.title.as_deref(), Some(255));
    require_text(&mut errors, "content", form.content.as_deref(), None);
    require_text(&mut errors, "status", form.status.as_deref(), Some(255));
    errors
}
