//! Paths that bypass credential checks (login, registration, ...).

use crate::services::route_table::path_has_prefix;

#[derive(Debug, Clone, Default)]
pub struct ExclusionRules {
    prefixes: Vec<String>,
}

impl ExclusionRules {
    pub fn new<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let prefixes = prefixes
            .into_iter()
            .map(|p| p.as_ref().trim().trim_end_matches('/').to_string())
            .filter(|p| p.starts_with('/'))
            .collect();

        Self { prefixes }
    }

    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }

    /// Segment-aware prefix match on the request path.
    ///
    /// Paths carrying dot segments (plain or percent-encoded) or encoded slashes never match:
    /// `/auth/login/../../admin/users` must not ride on the login exemption.
    pub fn is_excluded(&self, path: &str) -> bool {
        if has_traversal_segment(path) {
            return false;
        }
        self.prefixes.iter().any(|p| path_has_prefix(path, p))
    }
}

fn has_traversal_segment(path: &str) -> bool {
    path.split('/').any(|segment| {
        let segment = segment.to_ascii_lowercase();
        segment == "." || segment == ".." || segment.contains("%2e") || segment.contains("%2f")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> ExclusionRules {
        ExclusionRules::new(["/auth/login", "/auth/register/"])
    }

    #[test]
    fn matches_configured_prefixes() {
        let rules = rules();
        assert!(rules.is_excluded("/auth/login"));
        assert!(rules.is_excluded("/auth/login/oauth"));
        assert!(rules.is_excluded("/auth/register"));
    }

    #[test]
    fn does_not_match_lookalikes() {
        let rules = rules();
        assert!(!rules.is_excluded("/auth/loginx"));
        assert!(!rules.is_excluded("/auth"));
        assert!(!rules.is_excluded("/admin/auth/login"));
    }

    #[test]
    fn traversal_never_matches() {
        let rules = rules();
        assert!(!rules.is_excluded("/auth/login/../../admin/users"));
        assert!(!rules.is_excluded("/auth/login/%2E%2E/admin"));
        assert!(!rules.is_excluded("/auth/login/%2fadmin"));
        assert!(!rules.is_excluded("/auth/login/./x"));
    }

    #[test]
    fn ignores_blank_and_relative_entries() {
        let rules = ExclusionRules::new(["", "  ", "auth/login", "/ok"]);
        assert_eq!(rules.prefixes(), ["/ok".to_string()]);
    }
}
