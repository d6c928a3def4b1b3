// form-guard/src/sanitize.rs
use once_cell::sync::Lazy;
use regex::{Regex, RegexSet};

// Patterns are literals; a failure to compile is a programming error
static SCRIPT_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<script\b.*?</script\s*>").expect("script pattern"));
static QUOTED_HANDLER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)\s*\bon\w+\s*=\s*["'][^"']*["']"#).expect("quoted handler pattern")
});
static BARE_HANDLER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s*\bon\w+\s*=\s*[^\s>]*").expect("bare handler pattern"));
static JAVASCRIPT_URI: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)javascript\s*:").expect("javascript uri pattern"));
static HTML_DATA_URI: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)data\s*:\s*text/html").expect("data uri pattern"));

static DANGEROUS: Lazy<RegexSet> = Lazy::new(|| {
    RegexSet::new([
        r"(?i)<script",
        r"(?i)javascript:",
        r"(?i)\bon\w+\s*=",
        r"(?i)<iframe",
        r"(?i)<object",
        r"(?i)<embed",
        r"(?i)expression\s*\(",
        r"(?i)data:text/html",
    ])
    .expect("denylist patterns")
});

/// Strip executable fragments and HTML-encode angle brackets.
///
/// Applied to every outgoing value whether or not it passed validation.
pub fn sanitize_input(input: &str) -> String {
    let stripped = SCRIPT_BLOCK.replace_all(input, "");
    let stripped = QUOTED_HANDLER.replace_all(&stripped, "");
    let stripped = BARE_HANDLER.replace_all(&stripped, "");
    let stripped = JAVASCRIPT_URI.replace_all(&stripped, "");
    let stripped = HTML_DATA_URI.replace_all(&stripped, "");

    stripped
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .trim()
        .to_string()
}

/// True when the value matches none of the dangerous patterns
pub fn is_input_safe(input: &str) -> bool {
    !DANGEROUS.is_match(input)
}

pub fn sanitize_form_data(fields: &[(String, String)]) -> Vec<(String, String)> {
    fields
        .iter()
        .map(|(key, value)| (key.clone(), sanitize_input(value)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_block_removed_text_kept() {
        let clean = sanitize_input("<script>alert(1)</script>Hello");
        assert_eq!(clean, "Hello");
        assert!(!clean.to_lowercase().contains("script"));
    }

    #[test]
    fn test_multiline_script_and_case() {
        let clean = sanitize_input("Hi <SCRIPT type=\"x\">\nsteal()\n</Script > there");
        assert_eq!(clean, "Hi  there");
    }

    #[test]
    fn test_unclosed_script_is_encoded() {
        let clean = sanitize_input("<script>alert(1)");
        assert_eq!(clean, "&lt;script&gt;alert(1)");
    }

    #[test]
    fn test_event_handlers_and_uris_removed() {
        assert_eq!(
            sanitize_input(r#"<img src=x onerror="alert(1)">"#),
            "&lt;img src=x&gt;"
        );
        assert_eq!(sanitize_input("<a onclick=go()>x</a>"), "&lt;a&gt;x&lt;/a&gt;");
        assert_eq!(sanitize_input("JavaScript :alert(1)"), "alert(1)");
        assert_eq!(sanitize_input("data: text/html,<b>"), ",&lt;b&gt;");
    }

    #[test]
    fn test_plain_text_untouched() {
        assert_eq!(
            sanitize_input("  Masters in Germany, phone=+49 123  "),
            "Masters in Germany, phone=+49 123"
        );
    }

    #[test]
    fn test_denylist() {
        assert!(is_input_safe("Study abroad in Canada"));
        assert!(is_input_safe("asha@example.com"));
        assert!(is_input_safe("Questions = many"));

        for bad in [
            "<script>x</script>",
            "javascript:alert(1)",
            "<div onmouseover =x>",
            "<iframe src=x>",
            "<OBJECT data=x>",
            "<embed src=x>",
            "width: expression (alert(1))",
            "data:text/html;base64,AAAA",
        ] {
            assert!(!is_input_safe(bad), "{} should be unsafe", bad);
        }
    }

    #[test]
    fn test_sanitize_form_data_keeps_keys() {
        let fields = vec![
            ("name".to_string(), "<b>Asha</b>".to_string()),
            ("topic".to_string(), "MBA".to_string()),
        ];
        let clean = sanitize_form_data(&fields);
        assert_eq!(clean[0], ("name".to_string(), "&lt;b&gt;Asha&lt;/b&gt;".to_string()));
        assert_eq!(clean[1], ("topic".to_string(), "MBA".to_string()));
    }
}
