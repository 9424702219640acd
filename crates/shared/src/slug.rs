//! Subdomain slug derivation
//!
//! Turns an alliance display name into the lowercase, hyphen-separated label
//! used as its subdomain (e.g. "The Acme Syndicate" -> "the-acme-syndicate").

/// Derive a URL-safe slug from a display name.
///
/// Characters outside `[a-z0-9\s-]` are dropped after lowercasing, runs of
/// whitespace and hyphens become a single `-`, and leading/trailing hyphens
/// are trimmed. The result may be empty when the name has no usable
/// characters; callers that persist slugs must reject that case and enforce
/// uniqueness themselves.
pub fn slug_from_name(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());

    for c in name.to_lowercase().chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            slug.push(c);
        } else if (c.is_whitespace() || c == '-') && !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }

    while slug.ends_with('-') {
        slug.pop();
    }

    slug
}

/// Check that a label is already in slug form
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty() && slug_from_name(slug) == slug
}
