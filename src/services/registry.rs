//! Static bilingual category catalog and tag rules.

use std::collections::{BTreeSet, HashSet};

use crate::{
    error::AppError,
    models::{category::Category, post::Locale},
};

/// Most tags a single post may carry.
pub const MAX_TAGS: usize = 10;

/// One catalog row: a stable id plus per-language display text.
#[derive(Debug, Clone)]
struct CategoryEntry {
    id: &'static str,
    icon: &'static str,
    en: (&'static str, &'static str),
    ar: (&'static str, &'static str),
}

impl CategoryEntry {
    fn render(&self, locale: Locale) -> Category {
        let (name, description) = match locale {
            Locale::En => self.en,
            Locale::Ar => self.ar,
        };
        Category {
            id: self.id.to_string(),
            name: name.to_string(),
            icon: self.icon.to_string(),
            description: description.to_string(),
            locale,
        }
    }
}

const CATALOG: &[CategoryEntry] = &[
    CategoryEntry {
        id: "breakfast",
        icon: "🍳",
        en: ("Breakfast", "Morning dishes to start the day"),
        ar: ("فطور", "أطباق صباحية لبداية اليوم"),
    },
    CategoryEntry {
        id: "main-dishes",
        icon: "🍲",
        en: ("Main Dishes", "Hearty plates for lunch and dinner"),
        ar: ("أطباق رئيسية", "أطباق مشبعة للغداء والعشاء"),
    },
    CategoryEntry {
        id: "appetizers",
        icon: "🥟",
        en: ("Appetizers", "Small bites and mezze"),
        ar: ("مقبلات", "لقيمات صغيرة ومزة"),
    },
    CategoryEntry {
        id: "salads",
        icon: "🥗",
        en: ("Salads", "Fresh and crunchy salads"),
        ar: ("سلطات", "سلطات طازجة ومقرمشة"),
    },
    CategoryEntry {
        id: "soups",
        icon: "🥣",
        en: ("Soups", "Warm bowls for every season"),
        ar: ("شوربات", "أطباق دافئة لكل المواسم"),
    },
    CategoryEntry {
        id: "desserts",
        icon: "🍰",
        en: ("Desserts", "Sweets, cakes and puddings"),
        ar: ("حلويات", "حلويات وكيك وبودينغ"),
    },
    CategoryEntry {
        id: "baking",
        icon: "🥖",
        en: ("Baking", "Breads, pastries and pies"),
        ar: ("مخبوزات", "خبز ومعجنات وفطائر"),
    },
    CategoryEntry {
        id: "drinks",
        icon: "🥤",
        en: ("Drinks", "Juices, smoothies and hot drinks"),
        ar: ("مشروبات", "عصائر وسموذي ومشروبات ساخنة"),
    },
    CategoryEntry {
        id: "healthy",
        icon: "🥦",
        en: ("Healthy", "Light and balanced recipes"),
        ar: ("صحي", "وصفات خفيفة ومتوازنة"),
    },
    CategoryEntry {
        id: "ramadan",
        icon: "🌙",
        en: ("Ramadan", "Iftar and suhoor favorites"),
        ar: ("رمضانيات", "أطباق الإفطار والسحور"),
    },
];

/// Read-only category lookup, built once at startup and shared through `AppState`.
#[derive(Debug, Clone)]
pub struct CategoryRegistry {
    entries: Vec<CategoryEntry>,
}

impl CategoryRegistry {
    /// The built-in food catalog.
    pub fn builtin() -> Self {
        Self {
            entries: CATALOG.to_vec(),
        }
    }

    /// Every category in catalog order.
    pub fn categories_for(&self, locale: Locale) -> Vec<Category> {
        self.entries.iter().map(|e| e.render(locale)).collect()
    }

    pub fn find_category(&self, id: &str, locale: Locale) -> Option<Category> {
        self.entries
            .iter()
            .find(|e| e.id == id)
            .map(|e| e.render(locale))
    }

    /// Ids not present in the catalog for `locale`. Empty means all valid.
    pub fn validate_category_ids<S: AsRef<str>>(&self, ids: &[S], locale: Locale) -> BTreeSet<String> {
        ids.iter()
            .map(AsRef::<str>::as_ref)
            .filter(|id| self.find_category(id, locale).is_none())
            .map(str::to_string)
            .collect()
    }
}

/// Trims every tag and enforces: non-empty, unique (case-sensitive), at most `MAX_TAGS`.
pub fn normalize_tags(tags: &[String]) -> Result<Vec<String>, AppError> {
    let trimmed: Vec<String> = tags.iter().map(|t| t.trim().to_string()).collect();

    if trimmed.iter().any(String::is_empty) {
        return Err(AppError::Validation("tags: empty tag".to_string()));
    }

    if trimmed.len() > MAX_TAGS {
        return Err(AppError::Validation(format!(
            "tags: at most {} tags allowed, got {}",
            MAX_TAGS,
            trimmed.len()
        )));
    }

    let mut seen = HashSet::new();
    if let Some(dup) = trimmed.iter().find(|t| !seen.insert(t.as_str())) {
        return Err(AppError::Validation(format!("tags: duplicate tag '{}'", dup)));
    }

    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_ids_in_every_language() {
        let registry = CategoryRegistry::builtin();
        let en: Vec<String> = registry.categories_for(Locale::En).into_iter().map(|c| c.id).collect();
        let ar: Vec<String> = registry.categories_for(Locale::Ar).into_iter().map(|c| c.id).collect();

        assert_eq!(en, ar);
        assert_eq!(en.len(), CATALOG.len());
    }

    #[test]
    fn lookup_is_localized() {
        let registry = CategoryRegistry::builtin();

        assert_eq!(registry.find_category("desserts", Locale::Ar).unwrap().name, "حلويات");
        assert_eq!(registry.find_category("desserts", Locale::En).unwrap().name, "Desserts");
        assert!(registry.find_category("sushi", Locale::En).is_none());
    }

    #[test]
    fn reports_unknown_ids() {
        let registry = CategoryRegistry::builtin();
        let invalid = registry.validate_category_ids(&["soups", "sushi", "tacos"], Locale::En);

        assert_eq!(invalid.into_iter().collect::<Vec<_>>(), vec!["sushi", "tacos"]);
        assert!(registry.validate_category_ids(&["soups"], Locale::Ar).is_empty());
    }

    #[test]
    fn tag_rules() {
        let ok = normalize_tags(&[" spicy ".into(), "Spicy".into()]).unwrap();
        assert_eq!(ok, vec!["spicy", "Spicy"]);

        assert!(normalize_tags(&["a".into(), " a".into()]).is_err());
        assert!(normalize_tags(&["  ".into()]).is_err());

        let eleven: Vec<String> = (0..11).map(|i| format!("t{}", i)).collect();
        assert!(normalize_tags(&eleven).is_err());
        assert_eq!(normalize_tags(&eleven[..10]).unwrap().len(), 10);
    }
}
