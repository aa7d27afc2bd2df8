use rand::{Rng, distributions::Alphanumeric};
use slug::slugify;

/// Length of the random code appended to colliding slugs
const SLUG_CODE_LENGTH: usize = 6;

/// Derives the base URL slug for an article title: lowercased,
/// whitespace collapsed to hyphens, punctuation stripped
pub fn slug_from_title(title: &str) -> String {
    slugify(title)
}

/// Derives a slug for the title with a random disambiguating code
/// appended, used when the base slug is already taken
pub fn slug_with_code(title: &str) -> String {
    let code: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SLUG_CODE_LENGTH)
        .map(char::from)
        .collect();

    format!("{}-{}", slugify(title), code.to_lowercase())
}

#[cfg(test)]
mod test {
    use super::{SLUG_CODE_LENGTH, slug_from_title, slug_with_code};

    #[test]
    fn test_slug_from_title() {
        assert_eq!(slug_from_title("Hello World"), "hello-world");
        assert_eq!(slug_from_title("  How to   train your dragon?!  "), "how-to-train-your-dragon");
        assert_eq!(slug_from_title("Ich heiße Brot"), "ich-heisse-brot");
    }

    #[test]
    fn test_slug_with_code() {
        let slug = slug_with_code("Hello World");
        assert!(slug.starts_with("hello-world-"));
        assert_eq!(slug.len(), "hello-world-".len() + SLUG_CODE_LENGTH);
        assert_eq!(slug, slug.to_lowercase());
    }
}
