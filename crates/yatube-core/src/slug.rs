//! URL slugs derived from (possibly Cyrillic) titles.

/// Longest slug a group may carry, in characters.
pub const SLUG_MAX_LEN: usize = 50;

/// Latin spelling of a lowercase Cyrillic letter.
fn transliterate(ch: char) -> Option<&'static str> {
    let latin = match ch {
        'а' => "a",
        'б' => "b",
        'в' => "v",
        'г' => "g",
        'ґ' => "g",
        'д' => "d",
        'е' => "e",
        'ё' => "yo",
        'є' => "ye",
        'ж' => "zh",
        'з' => "z",
        'и' => "i",
        'і' => "i",
        'ї' => "yi",
        'й' => "j",
        'к' => "k",
        'л' => "l",
        'м' => "m",
        'н' => "n",
        'о' => "o",
        'п' => "p",
        'р' => "r",
        'с' => "s",
        'т' => "t",
        'у' => "u",
        'ф' => "f",
        'х' => "h",
        'ц' => "ts",
        'ч' => "ch",
        'ш' => "sh",
        'щ' => "sch",
        'ъ' => "",
        'ы' => "y",
        'ь' => "",
        'э' => "e",
        'ю' => "yu",
        'я' => "ya",
        _ => return None,
    };
    Some(latin)
}

/// Turn a title into a lowercase, hyphen-separated ASCII slug.
///
/// `&` becomes `and`, runs of whitespace and hyphens collapse into one
/// hyphen, Cyrillic is transliterated and everything else outside
/// `[a-z0-9-]` is dropped. The result is not truncated.
pub fn slugify(title: &str) -> String {
    let lowered = title
        .to_lowercase()
        .replace("&amp;", " and ")
        .replace('&', " and ");

    let mut slug = String::with_capacity(lowered.len());
    let mut in_separator = false;
    for ch in lowered.trim().chars() {
        if ch == '-' || ch.is_whitespace() {
            if !in_separator {
                slug.push('-');
                in_separator = true;
            }
            continue;
        }
        in_separator = false;

        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            slug.push(ch);
        } else if let Some(latin) = transliterate(ch) {
            slug.push_str(latin);
        }
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transliterates_russian() {
        assert_eq!(slugify("Тестовая группа"), "testovaya-gruppa");
        assert_eq!(slugify("Щука и Ёж"), "schuka-i-yozh");
    }

    #[test]
    fn test_collapses_separators() {
        assert_eq!(slugify("a  -  b"), "a-b");
        assert_eq!(slugify("  padded title  "), "padded-title");
    }

    #[test]
    fn test_drops_punctuation() {
        assert_eq!(slugify("Hello, World!"), "hello-world");
        assert_eq!(slugify("Rust 2024 (edition)"), "rust-2024-edition");
    }

    #[test]
    fn test_ampersand_becomes_and() {
        assert_eq!(slugify("Tom & Jerry"), "tom-and-jerry");
    }

    #[test]
    fn test_soft_signs_vanish() {
        assert_eq!(slugify("Подъезд"), "podezd");
    }
}
