//! Robots.txt parser
//!
//! Rule groups are keyed by lowercased agent token and hold ordered Allow
//! and Disallow path patterns with `*` wildcard support. Within a group,
//! Allow rules are checked before Disallow rules and the first matching
//! pattern wins; many sites rely on a narrow Allow overriding a broader
//! Disallow, so this order is part of the contract.

use std::collections::HashMap;

/// Ordered allow/deny patterns for one agent token
#[derive(Debug, Clone, Default)]
pub struct RuleGroup {
    pub allow: Vec<String>,
    pub disallow: Vec<String>,
}

/// Parsed robots.txt directives
#[derive(Debug, Clone)]
pub struct RobotsRules {
    groups: HashMap<String, RuleGroup>,
    /// Sitemap URLs declared in the document
    pub sitemaps: Vec<String>,
    allow_all: bool,
}

impl RobotsRules {
    /// Creates a permissive rule set that allows every path
    ///
    /// Used when robots.txt is absent, unreachable, or unparsable.
    pub fn allow_all() -> Self {
        Self {
            groups: HashMap::new(),
            sitemaps: Vec::new(),
            allow_all: true,
        }
    }

    /// Parses robots.txt content
    ///
    /// Parsing never fails: unrecognized lines are skipped, and a document
    /// that yields no rules behaves like [`RobotsRules::allow_all`].
    /// Directives before any `User-agent` line land in the `*` group.
    pub fn parse(content: &str) -> Self {
        let mut groups: HashMap<String, RuleGroup> = HashMap::new();
        let mut sitemaps = Vec::new();
        let mut current_agent = "*".to_string();

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let value = value.trim();
            if value.is_empty() {
                continue;
            }

            match key.trim().to_lowercase().as_str() {
                "user-agent" => current_agent = value.to_lowercase(),
                "allow" => groups
                    .entry(current_agent.clone())
                    .or_default()
                    .allow
                    .push(value.to_string()),
                "disallow" => groups
                    .entry(current_agent.clone())
                    .or_default()
                    .disallow
                    .push(value.to_string()),
                "sitemap" => sitemaps.push(value.to_string()),
                _ => {}
            }
        }

        Self {
            groups,
            sitemaps,
            allow_all: false,
        }
    }

    /// Checks whether a path may be fetched by the given agent token
    ///
    /// The agent's own group is consulted first, then the `*` group.
    /// Within a group Allow patterns are tried before Disallow patterns
    /// and the first match decides. No match in any group means allowed.
    pub fn is_allowed(&self, path: &str, agent_token: &str) -> bool {
        if self.allow_all || self.groups.is_empty() {
            return true;
        }

        let token = agent_token.to_lowercase();
        for agent in [token.as_str(), "*"] {
            let Some(group) = self.groups.get(agent) else {
                continue;
            };

            for pattern in &group.allow {
                if matches_pattern(path, pattern) {
                    return true;
                }
            }
            for pattern in &group.disallow {
                if matches_pattern(path, pattern) {
                    return false;
                }
            }
        }

        true
    }
}

/// Matches a path against a robots pattern, anchored at the path start
///
/// `*` matches any run of characters. The pattern only needs to cover a
/// prefix of the path. Comparison is case-insensitive.
fn matches_pattern(path: &str, pattern: &str) -> bool {
    let path = path.to_lowercase();
    let pattern = pattern.to_lowercase();

    let mut segments = pattern.split('*');
    let first = segments.next().unwrap_or("");
    if !path.starts_with(first) {
        return false;
    }

    let mut pos = first.len();
    for segment in segments {
        if segment.is_empty() {
            continue;
        }
        match path[pos..].find(segment) {
            Some(offset) => pos += offset + segment.len(),
            None => return false,
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allow_all() {
        let rules = RobotsRules::allow_all();
        assert!(rules.is_allowed("/any/path", "scopebot"));
        assert!(rules.is_allowed("/admin", "scopebot"));
    }

    #[test]
    fn test_empty_document_allows_everything() {
        let rules = RobotsRules::parse("");
        assert!(rules.is_allowed("/page", "scopebot"));
    }

    #[test]
    fn test_disallow_all() {
        let rules = RobotsRules::parse("User-agent: *\nDisallow: /");
        assert!(!rules.is_allowed("/", "scopebot"));
        assert!(!rules.is_allowed("/page", "scopebot"));
    }

    #[test]
    fn test_disallow_prefix() {
        let rules = RobotsRules::parse("User-agent: *\nDisallow: /admin");
        assert!(rules.is_allowed("/page", "scopebot"));
        assert!(!rules.is_allowed("/admin", "scopebot"));
        assert!(!rules.is_allowed("/admin/users", "scopebot"));
    }

    #[test]
    fn test_allow_checked_before_disallow() {
        // The broad Disallow would match /a/b, but the Allow matches first.
        let rules = RobotsRules::parse("User-agent: *\nAllow: /a\nDisallow: /a/b");
        assert!(rules.is_allowed("/a/b", "scopebot"));
        assert!(rules.is_allowed("/a", "scopebot"));
    }

    #[test]
    fn test_allow_overrides_regardless_of_order_in_file() {
        let rules = RobotsRules::parse("User-agent: *\nDisallow: /private\nAllow: /private/public");
        assert!(rules.is_allowed("/private/public", "scopebot"));
        assert!(!rules.is_allowed("/private/secret", "scopebot"));
    }

    #[test]
    fn test_specific_agent_group_wins() {
        let rules = RobotsRules::parse("User-agent: scopebot\nDisallow: /\n\nUser-agent: *\nAllow: /");
        assert!(!rules.is_allowed("/page", "scopebot"));
        assert!(rules.is_allowed("/page", "otherbot"));
    }

    #[test]
    fn test_wildcard_pattern() {
        let rules = RobotsRules::parse("User-agent: *\nDisallow: /*.pdf");
        assert!(!rules.is_allowed("/files/report.pdf", "scopebot"));
        assert!(rules.is_allowed("/files/report.html", "scopebot"));
    }

    #[test]
    fn test_wildcard_in_middle() {
        let rules = RobotsRules::parse("User-agent: *\nDisallow: /shop/*/checkout");
        assert!(!rules.is_allowed("/shop/cart123/checkout", "scopebot"));
        assert!(rules.is_allowed("/shop/cart123/view", "scopebot"));
    }

    #[test]
    fn test_empty_disallow_value_skipped() {
        // "Disallow:" with no value means nothing is disallowed
        let rules = RobotsRules::parse("User-agent: *\nDisallow:");
        assert!(rules.is_allowed("/anything", "scopebot"));
    }

    #[test]
    fn test_sitemap_lines_collected() {
        let rules = RobotsRules::parse(
            "Sitemap: https://example.com/sitemap.xml\nUser-agent: *\nDisallow: /tmp\nSitemap: https://example.com/news.xml",
        );
        assert_eq!(
            rules.sitemaps,
            vec![
                "https://example.com/sitemap.xml".to_string(),
                "https://example.com/news.xml".to_string()
            ]
        );
    }

    #[test]
    fn test_garbage_document_allows_everything() {
        let rules = RobotsRules::parse("this is not {{{ a robots file");
        assert!(rules.is_allowed("/any", "scopebot"));
    }

    #[test]
    fn test_case_insensitive_matching() {
        let rules = RobotsRules::parse("user-agent: ScopeBot\ndisallow: /Admin");
        assert!(!rules.is_allowed("/admin/panel", "scopebot"));
    }
}
