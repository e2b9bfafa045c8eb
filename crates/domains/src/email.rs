//! Email addresses as accounts and the newsletter accept them.

/// Trimmed, lowercased address if it looks deliverable.
pub fn normalize_email(raw: &str) -> Option<String> {
    let email = raw.trim().to_lowercase();
    let (local, domain) = email.split_once('@')?;
    let plausible = !local.is_empty()
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && domain.contains('.')
        && !domain.contains('@')
        && !email.chars().any(char::is_whitespace);
    plausible.then_some(email)
}

/// The part of an email before the `@`.
pub fn display_label(email: &str) -> String {
    email.split('@').next().unwrap_or(email).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Ada@Example.ORG "), Some("ada@example.org".to_string()));
        assert_eq!(normalize_email("no-at-sign"), None);
        assert_eq!(normalize_email("a@b"), None);
        assert_eq!(normalize_email("a b@c.de"), None);
        assert_eq!(normalize_email("@c.de"), None);
        assert_eq!(normalize_email("a@.de"), None);
    }

    #[test]
    fn test_display_label() {
        assert_eq!(display_label("ada@lovelace.org"), "ada");
        assert_eq!(display_label("plain"), "plain");
    }
}
