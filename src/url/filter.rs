//! Link filters applied regardless of the loop-prevention toggle

/// Returns true if the href contains a `/./` or `/../` path segment
///
/// The check runs against the raw href, before resolution collapses the
/// dot segments away.
pub fn has_dot_segment(href: &str) -> bool {
    href.contains("/./") || href.contains("/../")
}

/// Returns true if `link` is a prefix of the page it was found on
///
/// This catches a page linking to itself or to any of its ancestors,
/// e.g. a sub-directory listing linking back to its parent index.
pub fn is_prefix_of_page(link: &str, page: &str) -> bool {
    page.starts_with(link)
}

/// Decides whether a link discovered on `page` may enter the frontier
///
/// `href` is the link as written in the document and `resolved` is its
/// absolute form.
pub fn should_follow(href: &str, resolved: &str, page: &str) -> bool {
    if has_dot_segment(href) || has_dot_segment(resolved) {
        tracing::trace!("Discarding {}: dot segment", href);
        return false;
    }

    if is_prefix_of_page(resolved, page) {
        tracing::trace!("Discarding {}: prefix of {}", resolved, page);
        return false;
    }

    true
}
