use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::post::Locale;

/// A registry category rendered in one language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Category {
    /// Stable, language-independent id stored on posts.
    pub id: String,
    pub name: String,
    pub icon: String,
    pub description: String,
    pub locale: Locale,
}

/// Query string for registry lookups (`?lang=ar`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LangParams {
    pub lang: Option<String>,
}

impl LangParams {
    pub fn locale(&self) -> Locale {
        self.lang.as_deref().map(Locale::from_lang).unwrap_or_default()
    }
}
