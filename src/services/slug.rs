//! URL slug generation.

/// Maximum slug length before a uniqueness suffix.
pub const MAX_SLUG_LEN: usize = 255;

/// Lowercase ASCII words joined by single hyphens.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_dash = false;

    for c in input.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else if c == '\'' || c == '’' {
            // "Don't" → "dont"
        } else {
            pending_dash = true;
        }
        if slug.len() >= MAX_SLUG_LEN {
            break;
        }
    }

    let slug = slug.trim_end_matches('-');
    if slug.is_empty() {
        "untitled".to_string()
    } else {
        slug.to_string()
    }
}

/// First of `base`, `base-2`, `base-3`, … not present in `taken`.
pub fn unique_slug(base: &str, taken: &[String]) -> String {
    if !taken.iter().any(|t| t == base) {
        return base.to_string();
    }
    (2..)
        .map(|n| format!("{}-{}", base, n))
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or_else(|| base.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Intro to Rust"), "intro-to-rust");
        assert_eq!(slugify("  Don't Panic!  "), "dont-panic");
        assert_eq!(slugify("C++ & Rust: FFI -- 101"), "c-rust-ffi-101");
        assert_eq!(slugify("!!!"), "untitled");
    }

    #[test]
    fn test_slugify_truncates() {
        let long = "a".repeat(400);
        assert_eq!(slugify(&long).len(), MAX_SLUG_LEN);
    }

    #[test]
    fn test_unique_slug_appends_counter() {
        let taken = vec!["rust".to_string(), "rust-2".to_string()];
        assert_eq!(unique_slug("rust", &taken), "rust-3");
        assert_eq!(unique_slug("go", &taken), "go");
        assert_eq!(unique_slug("rust", &[]), "rust");
    }
}
