//! URL handling module for Sitescope
//!
//! Provides URL normalization (the frontier key) and classification of
//! outbound links relative to the crawl's domain.

mod normalize;

pub use normalize::normalize_url;

use url::Url;

/// Classification of an outbound link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkKind {
    /// Same host as the crawl's domain
    Internal,
    /// Any other host
    External,
    /// mailto: link
    Mailto,
    /// tel: link
    Tel,
}

impl LinkKind {
    /// Returns true if this link can lead the crawler to another page
    pub fn is_navigable(&self) -> bool {
        matches!(self, Self::Internal | Self::External)
    }

    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Internal => "internal",
            Self::External => "external",
            Self::Mailto => "mailto",
            Self::Tel => "tel",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "internal" => Some(Self::Internal),
            "external" => Some(Self::External),
            "mailto" => Some(Self::Mailto),
            "tel" => Some(Self::Tel),
            _ => None,
        }
    }
}

/// Classifies a resolved link target against the crawl's domain
///
/// `mailto:` and `tel:` targets are recognized by scheme; everything else
/// is `Internal` when its host equals the crawl domain and `External`
/// otherwise.
pub fn classify_link(target: &str, crawl_domain: &str) -> LinkKind {
    if target.starts_with("mailto:") {
        return LinkKind::Mailto;
    }
    if target.starts_with("tel:") {
        return LinkKind::Tel;
    }

    match Url::parse(target) {
        Ok(url) => match url.host_str() {
            Some(host) if host.eq_ignore_ascii_case(crawl_domain) => LinkKind::Internal,
            Some(_) => LinkKind::External,
            None => LinkKind::Internal,
        },
        Err(_) => LinkKind::Internal,
    }
}

/// Extracts the host from a URL string, lowercased
pub fn extract_domain(url_str: &str) -> Option<String> {
    Url::parse(url_str)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_internal() {
        assert_eq!(
            classify_link("https://example.com/about", "example.com"),
            LinkKind::Internal
        );
    }

    #[test]
    fn test_classify_internal_case_insensitive() {
        assert_eq!(
            classify_link("https://EXAMPLE.com/about", "example.com"),
            LinkKind::Internal
        );
    }

    #[test]
    fn test_classify_external() {
        assert_eq!(
            classify_link("https://other.com/page", "example.com"),
            LinkKind::External
        );
    }

    #[test]
    fn test_classify_mailto() {
        assert_eq!(
            classify_link("mailto:hi@example.com", "example.com"),
            LinkKind::Mailto
        );
    }

    #[test]
    fn test_classify_tel() {
        assert_eq!(classify_link("tel:+15551234567", "example.com"), LinkKind::Tel);
    }

    #[test]
    fn test_extract_domain() {
        assert_eq!(
            extract_domain("https://Sub.Example.COM/x"),
            Some("sub.example.com".to_string())
        );
        assert_eq!(extract_domain("garbage"), None);
    }

    #[test]
    fn test_link_kind_roundtrip() {
        for kind in [LinkKind::Internal, LinkKind::External, LinkKind::Mailto, LinkKind::Tel] {
            assert_eq!(LinkKind::from_db_string(kind.to_db_string()), Some(kind));
        }
    }
}
