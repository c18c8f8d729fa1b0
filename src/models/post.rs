use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::error::AppError;
use crate::utils::html::clean_html;

/// Supported content languages. English is the default and the slug source.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Ar,
}

impl Locale {
    pub const ALL: [Locale; 2] = [Locale::En, Locale::Ar];

    pub fn as_str(&self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::Ar => "ar",
        }
    }

    /// Parses a language tag, falling back to English for anything unsupported.
    pub fn from_lang(lang: &str) -> Self {
        match lang.trim().to_ascii_lowercase().as_str() {
            "ar" => Locale::Ar,
            s if s.starts_with("ar-") => Locale::Ar,
            _ => Locale::En,
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-language content bundle of a post.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct LocaleContent {
    #[validate(length(max = 200, message = "Title must be at most 200 characters"))]
    pub title: String,
    #[validate(length(max = 100000, message = "Body must be at most 100000 characters"))]
    pub body: String,
    #[validate(length(max = 200, message = "Meta title must be at most 200 characters"))]
    pub meta_title: String,
    #[validate(length(max = 500, message = "Meta description must be at most 500 characters"))]
    pub meta_description: String,
    /// Behaves as a set; see `normalized`.
    pub keywords: Vec<String>,
}

impl LocaleContent {
    /// Complete means a non-blank title and body.
    pub fn is_complete(&self) -> bool {
        !self.title.trim().is_empty() && !self.body.trim().is_empty()
    }

    /// Trims text fields, sanitizes the body and turns keywords into a set
    /// (first occurrence order kept).
    pub fn normalized(self) -> Self {
        let mut seen = HashSet::new();
        let keywords = self
            .keywords
            .into_iter()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty() && seen.insert(k.clone()))
            .collect();

        Self {
            title: self.title.trim().to_string(),
            body: clean_html(self.body.trim()),
            meta_title: self.meta_title.trim().to_string(),
            meta_description: self.meta_description.trim().to_string(),
            keywords,
        }
    }
}

/// Locale records of a post. A missing record is `None`.
///
/// Also used as a patch: a locale present in the patch replaces the stored one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct PostContent {
    pub en: Option<LocaleContent>,
    pub ar: Option<LocaleContent>,
}

impl PostContent {
    pub fn get(&self, locale: Locale) -> Option<&LocaleContent> {
        match locale {
            Locale::En => self.en.as_ref(),
            Locale::Ar => self.ar.as_ref(),
        }
    }

    /// Locales whose record is absent or incomplete.
    pub fn incomplete_locales(&self) -> Vec<Locale> {
        Locale::ALL
            .into_iter()
            .filter(|l| !self.get(*l).is_some_and(LocaleContent::is_complete))
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.incomplete_locales().is_empty()
    }

    pub fn english_title(&self) -> Option<&str> {
        self.en
            .as_ref()
            .map(|c| c.title.trim())
            .filter(|t| !t.is_empty())
    }

    /// Length rules for every present locale, prefixed with the locale name.
    pub fn check(&self) -> Result<(), AppError> {
        for locale in Locale::ALL {
            if let Some(content) = self.get(locale) {
                content
                    .validate()
                    .map_err(|e| AppError::Validation(format!("content.{}: {}", locale, e)))?;
            }
        }
        Ok(())
    }

    pub fn normalized(self) -> Self {
        Self {
            en: self.en.map(LocaleContent::normalized),
            ar: self.ar.map(LocaleContent::normalized),
        }
    }

    /// Replaces every locale present in `patch`.
    pub fn merge(&mut self, patch: PostContent) {
        if let Some(en) = patch.en {
            self.en = Some(en);
        }
        if let Some(ar) = patch.ar {
            self.ar = Some(ar);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    #[default]
    Draft,
    Published,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Draft => "draft",
            PostStatus::Published => "published",
        }
    }
}

impl FromStr for PostStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(PostStatus::Draft),
            "published" => Ok(PostStatus::Published),
            other => Err(AppError::Validation(format!("Unknown status '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

/// Recipe metadata. Times are minutes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct RecipeMeta {
    #[validate(range(min = 0, message = "prepTime must not be negative"))]
    pub prep_time: Option<i32>,
    #[validate(range(min = 0, message = "cookTime must not be negative"))]
    pub cook_time: Option<i32>,
    pub difficulty: Option<Difficulty>,
    #[validate(range(min = 0, message = "servings must not be negative"))]
    pub servings: Option<i32>,
    #[validate(range(min = 0, message = "calories must not be negative"))]
    pub calories: Option<i32>,
    pub meal_times: Vec<String>,
}

impl RecipeMeta {
    pub fn normalized(self) -> Self {
        let mut meal_times: Vec<String> = self
            .meal_times
            .into_iter()
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .collect();
        meal_times.sort();
        meal_times.dedup();

        Self { meal_times, ..self }
    }
}

/// Represents the 'posts' table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BlogPost {
    pub id: i64,
    pub slug: String,
    pub content: PostContent,
    pub categories: Vec<String>,
    pub tags: Vec<String>,
    pub cover_image: Option<String>,
    pub images: Vec<String>,
    pub status: PostStatus,
    pub publish_date: Option<DateTime<Utc>>,
    pub recipe: RecipeMeta,
    pub views: i64,
    pub author_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BlogPost {
    /// Cover image followed by the gallery.
    pub fn media_references(&self) -> Vec<String> {
        self.cover_image
            .iter()
            .chain(self.images.iter())
            .cloned()
            .collect()
    }
}

/// Everything needed to insert a post. The store assigns `id`; `views` starts at 0.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub slug: String,
    pub content: PostContent,
    pub categories: Vec<String>,
    pub tags: Vec<String>,
    pub cover_image: Option<String>,
    pub images: Vec<String>,
    pub status: PostStatus,
    pub publish_date: Option<DateTime<Utc>>,
    pub recipe: RecipeMeta,
    pub author_id: i64,
    pub created_at: DateTime<Utc>,
}

/// DTO for creating a post from the admin dashboard.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct PostForm {
    pub content: PostContent,
    pub categories: Vec<String>,
    pub tags: Vec<String>,
    pub cover_image: Option<String>,
    pub images: Vec<String>,
    /// Requested status; honored only when both locales are complete.
    pub status: Option<PostStatus>,
    pub publish_date: Option<DateTime<Utc>>,
    pub recipe: RecipeMeta,
}

/// DTO for a partial update. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct PostPatch {
    pub content: Option<PostContent>,
    pub categories: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
    /// `null` clears the cover, a string replaces it.
    #[serde(deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub cover_image: Option<Option<String>>,
    pub images: Option<Vec<String>>,
    pub status: Option<PostStatus>,
    pub publish_date: Option<DateTime<Utc>>,
    pub recipe: Option<RecipeMeta>,
}

impl PostPatch {
    pub fn is_empty(&self) -> bool {
        self.content.is_none()
            && self.categories.is_none()
            && self.tags.is_none()
            && self.cover_image.is_none()
            && self.images.is_none()
            && self.status.is_none()
            && self.publish_date.is_none()
            && self.recipe.is_none()
    }
}

/// Distinguishes an absent field from an explicit `null`.
fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct StatusRequest {
    pub status: PostStatus,
}

/// Query parameters for listing posts.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostQuery {
    /// Registry category id.
    pub category: Option<String>,
    pub tag: Option<String>,
    /// Admin listing only; the public listing is always `published`.
    pub status: Option<PostStatus>,
    /// Cursor for pagination: the created_at timestamp of the last post in the previous page.
    pub cursor: Option<DateTime<Utc>>,
    /// Number of items to return (default: 20, max: 100).
    pub limit: Option<i64>,
}

impl PostQuery {
    pub const DEFAULT_LIMIT: i64 = 20;
    pub const MAX_LIMIT: i64 = 100;

    pub fn effective_limit(&self) -> i64 {
        self.limit
            .unwrap_or(Self::DEFAULT_LIMIT)
            .clamp(1, Self::MAX_LIMIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn locale(title: &str, body: &str) -> LocaleContent {
        LocaleContent {
            title: title.into(),
            body: body.into(),
            ..Default::default()
        }
    }

    #[test]
    fn completeness_needs_both_locales() {
        let mut content = PostContent {
            en: Some(locale("Kabsa", "Rice and chicken")),
            ar: None,
        };
        assert_eq!(content.incomplete_locales(), vec![Locale::Ar]);

        content.ar = Some(locale("كبسة", "   "));
        assert!(!content.is_complete());

        content.ar = Some(locale("كبسة", "أرز ودجاج"));
        assert!(content.is_complete());
    }

    #[test]
    fn keywords_behave_as_a_set() {
        let c = LocaleContent {
            keywords: vec![" rice ".into(), "rice".into(), "".into(), "Rice".into()],
            ..Default::default()
        }
        .normalized();
        assert_eq!(c.keywords, vec!["rice".to_string(), "Rice".to_string()]);
    }

    #[test]
    fn cover_image_null_vs_absent() {
        let cleared: PostPatch = serde_json::from_str(r#"{"coverImage": null}"#).unwrap();
        assert_eq!(cleared.cover_image, Some(None));

        let untouched: PostPatch = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(untouched.cover_image, None);
        assert!(untouched.is_empty());
    }

    #[test]
    fn unsupported_language_falls_back() {
        assert_eq!(Locale::from_lang("ar-SA"), Locale::Ar);
        assert_eq!(Locale::from_lang("fr"), Locale::En);
    }
}
