use once_cell::sync::Lazy;
use regex::Regex;

/// Returned when no usable link can be found.
pub const NO_LINK: &str = "#";

// Only quoted, lowercase `href` attributes count.
static HREF_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"href=['"]([^'"]*)['"]"#).expect("Failed to compile href pattern")
});

/// Normalizes a job's application link into a single URL.
///
/// Bare `http://`/`https://` URLs are returned unchanged. Legacy values carry
/// an HTML anchor, in which case the `href` attribute (single or double quoted)
/// is extracted. Anything else, including a missing value, yields [`NO_LINK`].
pub fn extract_application_link(link: Option<&str>) -> String {
    let Some(link) = link.filter(|link| !link.is_empty()) else {
        return NO_LINK.to_string();
    };

    if link.starts_with("http://") || link.starts_with("https://") {
        return link.to_string();
    }

    HREF_PATTERN
        .captures(link)
        .and_then(|captures| captures.get(1))
        .map(|href| href.as_str().to_string())
        .unwrap_or_else(|| NO_LINK.to_string())
}
