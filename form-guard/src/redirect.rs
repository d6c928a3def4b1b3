// form-guard/src/redirect.rs
use url::Url;

/// Whether `candidate`, resolved against `origin`, stays on the same origin over http(s)
pub fn is_safe_redirect(candidate: &str, origin: &Url) -> bool {
    if candidate.trim().is_empty() {
        return false;
    }

    let resolved = match origin.join(candidate) {
        Ok(url) => url,
        Err(_) => return false,
    };

    if resolved.origin() != origin.origin() {
        return false;
    }

    matches!(resolved.scheme(), "http" | "https")
}

/// Redirect checks bound to the site's configured origin
#[derive(Debug, Clone)]
pub struct RedirectPolicy {
    origin: Url,
}

impl RedirectPolicy {
    pub fn new(site_origin: &str) -> Result<Self, url::ParseError> {
        Ok(Self {
            origin: Url::parse(site_origin)?,
        })
    }

    pub fn is_safe(&self, candidate: &str) -> bool {
        is_safe_redirect(candidate, &self.origin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> RedirectPolicy {
        RedirectPolicy::new("https://nextepedu.com").unwrap()
    }

    #[test]
    fn test_same_origin_paths_accepted() {
        let policy = policy();
        assert!(policy.is_safe("/destinations/canada"));
        assert!(policy.is_safe("https://nextepedu.com/#booking"));
        assert!(policy.is_safe("destinations?country=uk"));
    }

    #[test]
    fn test_cross_origin_rejected() {
        let policy = policy();
        assert!(!policy.is_safe("https://evil.example/phish"));
        assert!(!policy.is_safe("//evil.example/phish"));
        assert!(!policy.is_safe("http://nextepedu.com/"));
        assert!(!policy.is_safe("https://nextepedu.com:8443/"));
    }

    #[test]
    fn test_dangerous_schemes_rejected() {
        let policy = policy();
        assert!(!policy.is_safe("javascript:alert(1)"));
        assert!(!policy.is_safe("data:text/html,<script>x</script>"));
        assert!(!policy.is_safe(""));
        assert!(!policy.is_safe("   "));
    }
}
