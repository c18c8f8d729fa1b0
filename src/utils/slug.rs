use std::sync::LazyLock;

use regex::Regex;

static NON_SLUG_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9]+").expect("static regex"));

/// Maps accented Latin letters to their ASCII base. Other characters pass through.
fn fold_diacritic(c: char) -> &'static str {
    match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' => "a",
        'æ' => "ae",
        'ç' | 'ć' | 'č' => "c",
        'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ę' => "e",
        'ì' | 'í' | 'î' | 'ï' | 'ī' => "i",
        'ñ' | 'ń' => "n",
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'ō' => "o",
        'œ' => "oe",
        'ß' => "ss",
        'ş' | 'ś' | 'š' => "s",
        'ù' | 'ú' | 'û' | 'ü' | 'ū' => "u",
        'ý' | 'ÿ' => "y",
        'ğ' => "g",
        'ł' => "l",
        'ž' | 'ź' | 'ż' => "z",
        _ => "",
    }
}

/// Derives a URL-safe slug from an English title.
///
/// Lowercases and folds accented Latin letters to ASCII ("Crème Brûlée" gives
/// `creme-brulee`). Every remaining run of non-alphanumeric characters becomes a
/// single `-`, and dashes are trimmed at both ends. Returns `None` when nothing
/// usable is left.
pub fn slugify(title: &str) -> Option<String> {
    let lowered: String = title
        .trim()
        .to_lowercase()
        .chars()
        .fold(String::new(), |mut out, c| {
            match fold_diacritic(c) {
                "" => out.push(c),
                folded => out.push_str(folded),
            }
            out
        });
    let slug = NON_SLUG_CHARS.replace_all(&lowered, "-");
    let slug = slug.trim_matches('-');

    if slug.is_empty() {
        None
    } else {
        Some(slug.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::slugify;

    #[test]
    fn title_to_slug() {
        assert_eq!(slugify("  Chicken Kabsa (Easy!) ").as_deref(), Some("chicken-kabsa-easy"));
        assert_eq!(slugify("Mom's   Hummus").as_deref(), Some("mom-s-hummus"));
    }

    #[test]
    fn accented_latin_is_folded() {
        assert_eq!(slugify("Crème Brûlée").as_deref(), Some("creme-brulee"));
        assert_eq!(slugify("Jalapeño Poppers").as_deref(), Some("jalapeno-poppers"));
        assert_eq!(slugify("ÉCLAIRS au Café").as_deref(), Some("eclairs-au-cafe"));
    }

    #[test]
    fn nothing_usable() {
        assert_eq!(slugify("   "), None);
        assert_eq!(slugify("كبسة"), None);
        assert_eq!(slugify("!!!"), None);
    }
}
