/// Derive a URL slug from a runner's display name: lowercased, with every
/// run of non-alphanumeric characters collapsed to a single hyphen.
///
/// Uniqueness (the `-2`, `-3` suffixes) is handled in the repository where
/// the existing slugs live.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_was_hyphen = true;

    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_was_hyphen = false;
        } else if !last_was_hyphen {
            slug.push('-');
            last_was_hyphen = true;
        }
    }

    while slug.ends_with('-') {
        slug.pop();
    }

    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_name() {
        assert_eq!(slugify("Sarah Kim"), "sarah-kim");
    }

    #[test]
    fn test_punctuation_collapses_to_single_hyphen() {
        assert_eq!(slugify("Sarah K."), "sarah-k");
        assert_eq!(slugify("Jean-Luc  O'Brien"), "jean-luc-o-brien");
    }

    #[test]
    fn test_leading_and_trailing_separators_are_trimmed() {
        assert_eq!(slugify("  Maya!  "), "maya");
        assert_eq!(slugify("---"), "");
    }

    #[test]
    fn test_digits_are_kept() {
        assert_eq!(slugify("Runner 42"), "runner-42");
    }
}
