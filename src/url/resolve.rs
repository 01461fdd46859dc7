use url::Url;

/// Resolves a link href to an absolute address
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - fragment-only links (same page anchors)
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
///
/// The fragment of the resolved address is dropped since it never reaches
/// the server. No other canonicalization is applied.
///
/// # Examples
///
/// ```
/// use mirror_crawl::url::resolve_link;
/// use url::Url;
///
/// let base = Url::parse("https://example.test/docs/").unwrap();
/// assert_eq!(
///     resolve_link("a.txt", &base).as_deref(),
///     Some("https://example.test/docs/a.txt")
/// );
/// assert_eq!(resolve_link("mailto:me@example.test", &base), None);
/// ```
pub fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lowered = href.to_ascii_lowercase();
    if lowered.starts_with("javascript:")
        || lowered.starts_with("mailto:")
        || lowered.starts_with("tel:")
        || lowered.starts_with("data:")
    {
        return None;
    }

    let mut absolute_url = base_url.join(href).ok()?;
    if absolute_url.scheme() != "http" && absolute_url.scheme() != "https" {
        return None;
    }

    absolute_url.set_fragment(None);
    Some(absolute_url.to_string())
}
