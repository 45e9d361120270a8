//! ABOUTME: Environment-variable resolution for provider credentials (§6.3)

/// Resolve a secret: a directly configured value wins, otherwise fall back
/// to reading the named environment variable.
#[must_use]
pub fn resolve_secret(direct: Option<&str>, env_var: Option<&str>) -> Option<String> {
    if let Some(value) = direct {
        return Some(value.to_string());
    }
    env_var.and_then(|name| std::env::var(name).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direct_value_takes_priority() {
        std::env::set_var("HIERAG_TEST_DIRECT_PRIORITY", "from-env");
        let resolved = resolve_secret(Some("direct"), Some("HIERAG_TEST_DIRECT_PRIORITY"));
        assert_eq!(resolved, Some("direct".to_string()));
        std::env::remove_var("HIERAG_TEST_DIRECT_PRIORITY");
    }

    #[test]
    fn falls_back_to_env_var() {
        std::env::set_var("HIERAG_TEST_FALLBACK", "from-env");
        let resolved = resolve_secret(None, Some("HIERAG_TEST_FALLBACK"));
        assert_eq!(resolved, Some("from-env".to_string()));
        std::env::remove_var("HIERAG_TEST_FALLBACK");
    }

    #[test]
    fn missing_both_is_none() {
        std::env::remove_var("HIERAG_TEST_MISSING");
        assert_eq!(resolve_secret(None, Some("HIERAG_TEST_MISSING")), None);
        assert_eq!(resolve_secret(None, None), None);
    }
}
